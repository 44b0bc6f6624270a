use std::env::consts;

use actix_web::{HttpRequest, HttpResponse, get, web};
use sentinel::Registry;
use serde::Serialize;

use super::{if_none_match, json_response, not_modified};
use crate::error::ApiError;

macros_utils::routes! {
    route version_route,
}

/// Build and platform information, also printed by `--version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub app: &'static str,
    pub runtime: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            app: env!("CARGO_PKG_VERSION"),
            runtime: env!("JSONMON_RUSTC_VERSION"),
            os: consts::OS,
            arch: consts::ARCH,
        }
    }
}

/// Conditional on the validator fixed at startup.
#[get("/version")]
pub async fn version_route(
    request: HttpRequest,
    registry: web::Data<Registry>,
    version: web::Data<VersionInfo>,
) -> Result<HttpResponse, ApiError> {
    let etag = registry.started();
    if if_none_match(&request).is_some_and(|validator| etag.matches(validator)) {
        return Ok(not_modified(etag));
    }
    json_response(etag, version.get_ref())
}
