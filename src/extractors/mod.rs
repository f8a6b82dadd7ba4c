//! Extractors that hand handlers the sanitized request parts.

use crate::error::{AppError, ApplicationError};
use crate::middleware::{ParsedBody, ValidatedParams, ValidatedQuery};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Request body as left by the body parser and, when the route declares one, the
/// body schema.
#[derive(Clone, Debug)]
pub struct Body<T>(pub T);

/// Path parameters after params-schema validation.
#[derive(Clone, Debug)]
pub struct Params<T>(pub T);

/// Query string after query-schema validation.
#[derive(Clone, Debug)]
pub struct QueryParams<T>(pub T);

fn decode<T: DeserializeOwned>(value: Option<&Value>, part: &str) -> Result<T, AppError> {
    let value = value.ok_or_else(|| {
        ApplicationError::programming(format!("request {} was not validated for this route", part))
    })?;
    serde_json::from_value(value.clone())
        .map_err(|e| ApplicationError::bad_request(format!("Invalid request {}: {}", part, e)).into())
}

#[async_trait]
impl<S, T> FromRequestParts<S> for Body<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        decode(parts.extensions.get::<ParsedBody>().map(|b| &b.0), "body").map(Body)
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        decode(parts.extensions.get::<ValidatedParams>().map(|p| &p.0), "params").map(Params)
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        decode(parts.extensions.get::<ValidatedQuery>().map(|q| &q.0), "query").map(QueryParams)
    }
}
