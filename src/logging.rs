//! Tracing subscriber setup: console plus an append-only JSON log file.

use crate::config::ServerEnv;
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const DEFAULT_FILTER: &str = "scaffold_api=info,scaffold_server=info,tower_http=info";

/// Keys removed from request bodies before they are logged.
const REDACTED_KEYS: &[&str] = &["password"];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Handle for the installed subscriber; held by the binary for the process lifetime.
#[derive(Debug)]
pub struct Logging {
    pub log_file: PathBuf,
}

pub fn init(env: &ServerEnv) -> Result<Logging, LoggingError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&env.log_file)
        .map_err(|source| LoggingError::Open {
            path: env.log_file.clone(),
            source,
        })?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let console = if env.node_env.is_production() {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().pretty().boxed()
    };
    let file_layer = fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    tracing::info!(env = env.node_env.as_str(), log_file = %env.log_file.display(), "logging initialized");
    Ok(Logging {
        log_file: env.log_file.clone(),
    })
}

/// Copy of a request body with sensitive top-level keys removed.
pub fn redact(body: &Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !REDACTED_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_top_level_password() {
        let body = json!({"email": "a@b.co", "password": "hunter2"});
        assert_eq!(redact(&body), json!({"email": "a@b.co"}));
    }

    #[test]
    fn leaves_nested_and_non_object_bodies_alone() {
        let nested = json!({"user": {"password": "x"}});
        assert_eq!(redact(&nested), nested);
        assert_eq!(redact(&json!([1, 2])), json!([1, 2]));
        assert_eq!(redact(&Value::Null), Value::Null);
    }
}
