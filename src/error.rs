//! Typed errors. Handlers return [`AppError`]; rendering happens in [`crate::normalize`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {var}")]
    Missing { var: &'static str },
    #[error("invalid environment variable {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Envelope status: "fail" for client errors, "error" for everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Fail,
    Error,
}

impl Status {
    pub fn from_code(code: StatusCode) -> Self {
        if code.is_client_error() {
            Status::Fail
        } else {
            Status::Error
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// An error raised on purpose by a handler, validator or pipeline stage.
#[derive(Error, Clone, Debug)]
#[error("{message}")]
pub struct ApplicationError {
    message: String,
    status_code: StatusCode,
    status: Status,
    operational: bool,
    errors: Option<Vec<FieldError>>,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        ApplicationError {
            message: message.into(),
            status_code,
            status: Status::from_code(status_code),
            operational: true,
            errors: None,
        }
    }

    /// 400 with no field detail.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new("Validation error", StatusCode::BAD_REQUEST).with_errors(errors)
    }

    /// A failure that indicates a bug rather than bad input.
    pub fn programming(message: impl Into<String>) -> Self {
        ApplicationError {
            operational: false,
            ..Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn errors(&self) -> Option<&[FieldError]> {
        self.errors.as_deref()
    }
}

/// Failures reported by a storage or auth backend, classified at the adapter boundary.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum BackendError {
    #[error("invalid {field}: {value}")]
    InvalidValue { field: String, value: String },
    #[error("duplicate key value {value}")]
    DuplicateKey { value: String },
    #[error("schema violation: {}", messages.join("; "))]
    SchemaViolation { messages: Vec<String> },
    #[error("malformed auth token")]
    MalformedToken,
    #[error("auth token expired")]
    ExpiredToken,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::Application(ApplicationError::not_found(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    /// Status code the error carries before any reclassification. `None` means
    /// the normalizer falls back to its default.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            AppError::Application(e) => Some(e.status_code()),
            AppError::Backend(_) => None,
            AppError::Db(_) | AppError::Internal(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            AppError::Application(e) => e.status(),
            _ => Status::Error,
        }
    }

    pub fn is_operational(&self) -> bool {
        match self {
            AppError::Application(e) => e.is_operational(),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        crate::database::classify(err)
    }
}

/// Error handed from a handler or middleware to the normalizer stage.
#[derive(Clone, Debug)]
pub struct ForwardedError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code().unwrap_or(StatusCode::BAD_REQUEST);
        let mut response = status.into_response();
        response.extensions_mut().insert(ForwardedError(Arc::new(self)));
        response
    }
}
