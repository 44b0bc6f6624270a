//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;

/// Generate a `pub fn routes(cfg: &mut ServiceConfig)` for the current module.
///
/// `route name` registers an attribute-routed handler (`#[get(..)]` etc.),
/// `module name` pulls in the `routes` function of a child module.
///
/// ```ignore
/// macros_utils::routes! {
///     module status,
///     route version_route,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($kind:ident $name:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $( $crate::routes!(@entry cfg, $kind $name); )*
        }
    };
    (@entry $cfg:ident, route $name:ident) => {
        $cfg.service($name);
    };
    (@entry $cfg:ident, module $name:ident) => {
        $cfg.configure($name::routes);
    };
}
