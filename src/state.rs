//! Shared application state for all routes. The store is injected, not global.

use crate::config::{Environment, DEFAULT_BODY_LIMIT};
use crate::database::ConnectionState;
use crate::store::{ExampleStore, InMemoryStore};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub env: Environment,
    pub store: Arc<dyn ExampleStore>,
    pub body_limit: usize,
    /// Live database connection state, when a database is configured.
    pub database: Option<watch::Receiver<ConnectionState>>,
}

impl AppState {
    pub fn new(env: Environment, store: Arc<dyn ExampleStore>) -> Self {
        AppState {
            env,
            store,
            body_limit: DEFAULT_BODY_LIMIT,
            database: None,
        }
    }

    /// Fresh in-memory store, no database.
    pub fn in_memory(env: Environment) -> Self {
        Self::new(env, Arc::new(InMemoryStore::new()))
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_database(mut self, state: watch::Receiver<ConnectionState>) -> Self {
        self.database = Some(state);
        self
    }
}
