//! Scaffold server: validates the environment, installs logging, connects to the
//! database (retrying until it succeeds), then serves the API.
//!
//! Run from repo root: `cargo run -p scaffold-server`

use scaffold_api::{app, logging, AppState, Database, InMemoryStore, PgConnector, ServerEnv};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = ServerEnv::from_env()?;
    let logging = logging::init(&env)?;

    let database = Arc::new(Database::new(
        PgConnector::new(env.connect_options.clone()),
        env.retry_delay,
    ));
    database.connect().await;
    let monitor = database.clone().spawn_monitor(env.monitor_interval);

    let state = AppState::new(env.node_env, Arc::new(InMemoryStore::new()))
        .with_body_limit(env.body_limit)
        .with_database(database.subscribe());

    let listener = TcpListener::bind(("0.0.0.0", env.port)).await?;
    tracing::info!(
        log_file = %logging.log_file.display(),
        "Server is running on port {}",
        listener.local_addr()?.port()
    );
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.abort();
    if let Some(pool) = database.connection().await {
        pool.close().await;
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
