//! Error normalization: turn any [`AppError`] into the client-facing envelope for
//! the current environment. This is the only place error bodies are rendered.

use crate::config::Environment;
use crate::error::{AppError, ApplicationError, BackendError, FieldError, Status};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug)]
pub struct RenderedResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for RenderedResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Raw error payload shown in development.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawError<'a> {
    kind: &'static str,
    status_code: u16,
    status: Status,
    is_operational: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

#[derive(Serialize)]
struct DevBody<'a> {
    status: Status,
    error: RawError<'a>,
    message: String,
    stack: String,
}

#[derive(Serialize)]
struct ProdBody<'a> {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
    message: &'a str,
}

pub fn normalize(err: &AppError, env: Environment) -> RenderedResponse {
    let status_code = err.status_code().unwrap_or(StatusCode::BAD_REQUEST);
    if env.exposes_error_detail() {
        render_dev(err, status_code)
    } else {
        match err {
            AppError::Backend(backend) => render_prod(&reclassify(backend), err),
            AppError::Application(app) => render_prod(app, err),
            _ => render_internal(err),
        }
    }
}

fn kind(err: &AppError) -> &'static str {
    match err {
        AppError::Application(_) => "application",
        AppError::Backend(_) => "backend",
        AppError::Db(_) => "database",
        AppError::Internal(_) => "internal",
    }
}

fn stack(err: &AppError) -> String {
    let mut out = format!("{:?}", err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(&format!("\n    caused by: {}", cause));
        source = cause.source();
    }
    out
}

fn render_dev(err: &AppError, status_code: StatusCode) -> RenderedResponse {
    tracing::error!(error = %err, kind = kind(err), status = status_code.as_u16(), "request failed");
    let errors = match err {
        AppError::Application(app) => app.errors(),
        _ => None,
    };
    let body = DevBody {
        status: err.status(),
        error: RawError {
            kind: kind(err),
            status_code: status_code.as_u16(),
            status: err.status(),
            is_operational: err.is_operational(),
            errors,
        },
        message: match err {
            AppError::Application(app) => app.message().to_string(),
            other => other.to_string(),
        },
        stack: stack(err),
    };
    RenderedResponse {
        status: status_code,
        body: serde_json::to_value(body).unwrap_or(Value::Null),
    }
}

/// Turn a backend failure into the user-actionable error it stands for.
pub fn reclassify(err: &BackendError) -> ApplicationError {
    match err {
        BackendError::InvalidValue { field, value } => {
            ApplicationError::bad_request(format!("Invalid {}: {}.", field, value))
        }
        BackendError::DuplicateKey { value } => ApplicationError::bad_request(format!(
            "Duplicate field value: {}. Please use another value!",
            value
        )),
        BackendError::SchemaViolation { messages } => {
            ApplicationError::bad_request(format!("Invalid input data. {}", messages.join(". ")))
        }
        BackendError::MalformedToken => {
            ApplicationError::new("Invalid token. Please login again", StatusCode::UNAUTHORIZED)
        }
        BackendError::ExpiredToken => ApplicationError::new(
            "Your token has expired! Please login again",
            StatusCode::UNAUTHORIZED,
        ),
    }
}

fn render_prod(app: &ApplicationError, original: &AppError) -> RenderedResponse {
    if !app.is_operational() {
        return render_internal(original);
    }
    let body = ProdBody {
        status: app.status(),
        errors: app.errors(),
        message: app.message(),
    };
    RenderedResponse {
        status: app.status_code(),
        body: serde_json::to_value(body).unwrap_or(Value::Null),
    }
}

fn render_internal(err: &AppError) -> RenderedResponse {
    tracing::error!(error = %err, detail = ?err, kind = kind(err), "unhandled error");
    RenderedResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: serde_json::json!({
            "status": "error",
            "message": "Internal Server Error",
        }),
    }
}
