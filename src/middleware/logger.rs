//! Request logger: one structured event per request, before validation.

use crate::logging::redact;
use crate::middleware::ParsedBody;
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;

pub async fn log_request(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let body = request
        .extensions()
        .get::<ParsedBody>()
        .map(|b| redact(&b.0))
        .unwrap_or_default();
    tracing::info!(
        %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        body = %body,
        "{} {}",
        request.method(),
        request.uri().path()
    );
    let span = tracing::info_span!("request", %request_id);
    next.run(request).instrument(span).await
}
