//! Router assembly and the request pipeline.

mod common;
mod examples;

pub use common::common_routes;
pub use examples::{create_example_schema, example_id_schema, example_routes, update_example_schema};

use crate::middleware::{log_request, normalize_errors, parse_body, route_not_found};
use crate::state::AppState;
use axum::{middleware, Router};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Full application: health routes, `/api/examples`, not-found fallback, pipeline.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .merge(common_routes(state.clone()))
        .merge(example_routes(state.clone()));
    with_pipeline(routes, state)
}

/// Wrap `routes` in the pipeline. Request order: trace span, error normalizer,
/// body parser, request logger, routes (validators run per route), not-found fallback.
pub fn with_pipeline(routes: Router, state: AppState) -> Router {
    routes
        .fallback(route_not_found)
        .layer(middleware::from_fn(log_request))
        .layer(middleware::from_fn_with_state(state.clone(), parse_body))
        .layer(middleware::from_fn_with_state(state, normalize_errors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
