//! Server configuration from environment variables (and `.env`), validated at startup.

use crate::error::ConfigError;
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_FILE: &str = "process.log";
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 60;
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 30;
/// Same ceiling a typical JSON body parser applies (100 KiB).
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

/// Deployment environment. Development and staging render full error detail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn exposes_error_detail(&self) -> bool {
        matches!(self, Environment::Development | Environment::Staging)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(ConfigError::Invalid {
                var: "NODE_ENV",
                reason: format!(
                    "'{}' is not one of development, staging, production, test",
                    other
                ),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerEnv {
    pub node_env: Environment,
    pub port: u16,
    pub connect_options: PgConnectOptions,
    pub log_file: PathBuf,
    pub retry_delay: Duration,
    pub monitor_interval: Duration,
    pub body_limit: usize,
}

impl ServerEnv {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_env = match lookup("NODE_ENV") {
            Some(v) => v.parse()?,
            None => Environment::default(),
        };
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing { var: "DATABASE_URL" })?;
        if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")) {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL",
                reason: "expected a postgres:// connection string".into(),
            });
        }
        let connect_options = PgConnectOptions::from_str(&database_url).map_err(|e| ConfigError::Invalid {
            var: "DATABASE_URL",
            reason: e.to_string(),
        })?;

        let log_file = lookup("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let retry_delay = Duration::from_secs(parse_or(
            "DB_RETRY_DELAY_SECS",
            lookup("DB_RETRY_DELAY_SECS"),
            DEFAULT_RETRY_DELAY_SECS,
        )?);
        let monitor_secs: u64 = parse_or(
            "DB_MONITOR_INTERVAL_SECS",
            lookup("DB_MONITOR_INTERVAL_SECS"),
            DEFAULT_MONITOR_INTERVAL_SECS,
        )?;
        if monitor_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MONITOR_INTERVAL_SECS",
                reason: "must be greater than zero".into(),
            });
        }
        let body_limit = parse_or("BODY_LIMIT_BYTES", lookup("BODY_LIMIT_BYTES"), DEFAULT_BODY_LIMIT)?;

        Ok(ServerEnv {
            node_env,
            port,
            connect_options,
            log_file,
            retry_delay,
            monitor_interval: Duration::from_secs(monitor_secs),
            body_limit,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: format!("'{}': {}", v, e),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerEnv, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerEnv::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let env = load(&[("DATABASE_URL", "postgres://localhost/scaffold")]).unwrap();
        assert_eq!(env.node_env, Environment::Development);
        assert_eq!(env.port, 3000);
        assert_eq!(env.log_file, PathBuf::from("process.log"));
        assert_eq!(env.retry_delay, Duration::from_secs(60));
        assert_eq!(env.monitor_interval, Duration::from_secs(30));
        assert_eq!(env.body_limit, 100 * 1024);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let env = load(&[
            ("DATABASE_URL", "postgres://user:pw@db:5432/app"),
            ("NODE_ENV", "production"),
            ("PORT", "8080"),
            ("DB_RETRY_DELAY_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(env.node_env, Environment::Production);
        assert_eq!(env.port, 8080);
        assert_eq!(env.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let err = load(&[("NODE_ENV", "test")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var: "DATABASE_URL" }));
    }

    #[test]
    fn invalid_database_url_is_rejected() {
        for url in ["mysql://localhost/db", "not a url", "postgres://host:notaport/db"] {
            let err = load(&[("DATABASE_URL", url)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: "DATABASE_URL", .. }), "{}", url);
        }
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/db"), ("NODE_ENV", "qa")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "NODE_ENV", .. }));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/db"), ("PORT", "abc")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn zero_monitor_interval_is_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("DB_MONITOR_INTERVAL_SECS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DB_MONITOR_INTERVAL_SECS", .. }));
    }

    #[test]
    fn only_development_and_staging_expose_detail() {
        assert!(Environment::Development.exposes_error_detail());
        assert!(Environment::Staging.exposes_error_detail());
        assert!(!Environment::Production.exposes_error_detail());
        assert!(!Environment::Test.exposes_error_detail());
    }
}
