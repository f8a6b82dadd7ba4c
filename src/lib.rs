//! Scaffold API: a small REST CRUD service with schema validation and normalized errors.

pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod model;
pub mod normalize;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{Environment, ServerEnv};
pub use database::{ConnectOutcome, ConnectionState, Connector, Database, PgConnector};
pub use error::{AppError, ApplicationError, BackendError, ConfigError, FieldError, Status};
pub use normalize::{normalize, RenderedResponse};
pub use routes::{app, with_pipeline};
pub use service::{validate, RequestData, SchemaSet};
pub use state::AppState;
pub use store::{ExampleStore, InMemoryStore};
