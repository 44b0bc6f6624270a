use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::{HttpRequest, HttpResponse};
use sentinel::{APP_NAME, Watermark};
use serde::Serialize;

use crate::error::ApiError;

pub mod status;
pub mod version;

macros_utils::routes! {
    module status,
    module version,
}

/// Headers carried by every response, including errors.
pub fn default_headers() -> DefaultHeaders {
    DefaultHeaders::new().add((header::SERVER, APP_NAME))
}

/// Fallback for every unrouted path.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

fn if_none_match(request: &HttpRequest) -> Option<&str> {
    request.headers().get(header::IF_NONE_MATCH).and_then(|value| value.to_str().ok())
}

fn not_modified(etag: Watermark) -> HttpResponse {
    HttpResponse::NotModified().insert_header((header::ETAG, etag.etag())).finish()
}

/// Fully encoded JSON document. Encoding happens before any header is
/// written, so a failure never leaves a partial body.
fn json_response(etag: Watermark, body: &impl Serialize) -> Result<HttpResponse, ApiError> {
    let body = serde_json::to_vec(body)?;

    Ok(HttpResponse::Ok()
        .content_type("application/json; charset=utf-8")
        .insert_header((header::ETAG, etag.etag()))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .body(body))
}
