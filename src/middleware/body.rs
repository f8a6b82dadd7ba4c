//! Body parser: buffer the body once, decode JSON and keep the value in extensions.

use crate::error::{AppError, ApplicationError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

/// Parsed request body. `{}` when the request had no JSON body.
#[derive(Clone, Debug)]
pub struct ParsedBody(pub Value);

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

pub async fn parse_body(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let json = is_json(&request);
    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, state.body_limit).await.map_err(|_| {
        ApplicationError::new("Request body too large", StatusCode::PAYLOAD_TOO_LARGE)
    })?;
    let value: Value = if json && !bytes.is_empty() {
        serde_json::from_slice(&bytes)
            .map_err(|e| ApplicationError::bad_request(format!("Invalid JSON body: {}", e)))?
    } else {
        Value::Object(Map::new())
    };
    parts.extensions.insert(ParsedBody(value));
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
