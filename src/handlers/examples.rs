//! Example CRUD handlers: list, read, create, update, delete.

use crate::error::AppError;
use crate::extractors::{Body, Params};
use crate::model::{ExampleId, ExamplePatch, NewExample};
use crate::response::{success_many, success_one_ok, success_with_message};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

fn not_found(id: &str) -> AppError {
    AppError::not_found(format!("Example with ID {} not found", id))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.store.list().await?;
    Ok(success_many(data))
}

pub async fn read(
    State(state): State<AppState>,
    Params(ExampleId { id }): Params<ExampleId>,
) -> Result<impl IntoResponse, AppError> {
    let example = state.store.get(&id).await?.ok_or_else(|| not_found(&id))?;
    Ok(success_one_ok(example))
}

pub async fn create(
    State(state): State<AppState>,
    Body(input): Body<NewExample>,
) -> Result<impl IntoResponse, AppError> {
    let example = state.store.create(input).await?;
    tracing::info!(id = %example.id, "example created");
    Ok(success_with_message(
        StatusCode::CREATED,
        example,
        "Example created successfully",
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Params(ExampleId { id }): Params<ExampleId>,
    Body(patch): Body<ExamplePatch>,
) -> Result<impl IntoResponse, AppError> {
    let example = state.store.update(&id, patch).await?.ok_or_else(|| not_found(&id))?;
    Ok(success_with_message(StatusCode::OK, example, "Example updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Params(ExampleId { id }): Params<ExampleId>,
) -> Result<impl IntoResponse, AppError> {
    let example = state.store.delete(&id).await?.ok_or_else(|| not_found(&id))?;
    tracing::info!(id = %example.id, "example deleted");
    Ok(success_with_message(StatusCode::OK, example, "Example deleted successfully"))
}
