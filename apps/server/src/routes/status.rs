use actix_web::{HttpRequest, HttpResponse, get, web};
use sentinel::{Registry, StatusView};

use super::{if_none_match, json_response, not_modified};
use crate::error::ApiError;

macros_utils::routes! {
    route status_route,
}

/// Every probe's public state, in config order.
///
/// Conditional: a matching `If-None-Match` gets `304` without a body.
#[get("/status")]
pub async fn status_route(
    request: HttpRequest,
    registry: web::Data<Registry>,
) -> Result<HttpResponse, ApiError> {
    match registry.status_view(if_none_match(&request)).await {
        StatusView::Unchanged(etag) => Ok(not_modified(etag)),
        StatusView::Changed(snapshot) => json_response(snapshot.etag, &snapshot.probes),
    }
}
