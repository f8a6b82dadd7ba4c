//! Last pipeline stages: not-found fallback and the error normalizer.

use crate::error::{AppError, ApplicationError, ForwardedError};
use crate::normalize::normalize;
use crate::state::AppState;
use axum::{
    body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Upper bound on a plain error body read back for its message.
const PLAIN_ERROR_BODY_LIMIT: usize = 16 * 1024;

pub async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// Render whatever error an inner stage forwarded. Runs outside every other stage
/// so parser, validator and handler failures all end up here.
pub async fn normalize_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if let Some(ForwardedError(err)) = response.extensions().get::<ForwardedError>().cloned() {
        tracing::debug!(%method, %path, error = %err, "normalizing error");
        return normalize(&err, state.env).into_response();
    }
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return normalize(&route_not_found().await, state.env).into_response();
    }
    if is_failure(&response) && !is_json(&response) {
        let err = plain_error(response).await;
        tracing::debug!(%method, %path, error = %err, "normalizing plain error response");
        return normalize(&err, state.env).into_response();
    }
    response
}

fn is_failure(response: &Response) -> bool {
    response.status().is_client_error() || response.status().is_server_error()
}

/// JSON failure bodies (readiness reports) are already the route's own envelope.
fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Error for a failure response some inner layer produced without an `AppError`.
async fn plain_error(response: Response) -> AppError {
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), PLAIN_ERROR_BODY_LIMIT)
        .await
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&bytes).trim().to_string();
    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("Error").to_string()
    } else {
        text
    };
    if status.is_server_error() {
        AppError::internal(message)
    } else {
        ApplicationError::new(message, status).into()
    }
}
