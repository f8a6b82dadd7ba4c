//! Common routes: health and readiness.

use crate::database::ConnectionState;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

async fn health() -> &'static str {
    "OK"
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let Some(database) = state.database.as_ref() else {
        return (
            StatusCode::OK,
            Json(ReadyBody {
                status: "ok",
                database: None,
            }),
        );
    };
    let current = *database.borrow();
    let (code, status) = match current {
        ConnectionState::Connected => (StatusCode::OK, "ok"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };
    (
        code,
        Json(ReadyBody {
            status,
            database: Some(current.as_str()),
        }),
    )
}

/// GET /health, GET /ready.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}
