//! `/api/examples` routes and the schemas they validate against.

use crate::handlers::examples::{create, delete, list, read, update};
use crate::middleware::validated;
use crate::service::{object, text, SchemaSet};
use crate::state::AppState;
use axum::{
    routing::{delete as delete_route, get, patch, post},
    Router,
};

fn id_params() -> crate::service::ObjectSchema {
    object().field("id", text().min(1).message("ID is required"))
}

pub fn create_example_schema() -> SchemaSet {
    SchemaSet::new().body(
        object()
            .field(
                "name",
                text()
                    .min(1)
                    .message("Name is required")
                    .max(100)
                    .message("Name must be less than 100 characters"),
            )
            .field("email", text().email().message("Invalid email address"))
            .field("description", text().optional()),
    )
}

pub fn update_example_schema() -> SchemaSet {
    SchemaSet::new().params(id_params()).body(
        object()
            .field("name", text().min(1).max(100).optional())
            .field("email", text().email().optional())
            .field("description", text().optional())
            .strict(),
    )
}

pub fn example_id_schema() -> SchemaSet {
    SchemaSet::new().params(id_params())
}

/// `/api/examples` and `/api/examples/:id`. The collection also answers with a
/// trailing slash.
pub fn example_routes(state: AppState) -> Router {
    let collection = get(list).merge(validated(post(create), create_example_schema()));
    Router::new()
        .route("/api/examples", collection.clone())
        .route("/api/examples/", collection)
        .route(
            "/api/examples/:id",
            validated(get(read), example_id_schema())
                .merge(validated(patch(update), update_example_schema()))
                .merge(validated(delete_route(delete), example_id_schema())),
        )
        .with_state(state)
}
