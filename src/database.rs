//! Database connection bootstrap: one gated, retrying connection attempt at a time,
//! plus classification of driver errors into [`BackendError`].

use crate::error::{AppError, ApplicationError, BackendError};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgDatabaseError, PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    AlreadyConnected,
    AlreadyInProgress,
}

/// Opens and checks connections. Implemented for Postgres; tests plug in fakes.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Clone + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Connection, sqlx::Error>;
    async fn ping(&self, conn: &Self::Connection) -> Result<(), sqlx::Error>;
}

pub struct PgConnector {
    options: PgConnectOptions,
    max_connections: u32,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions) -> Self {
        PgConnector {
            options,
            max_connections: 5,
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgPool;

    async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(self.options.clone())
            .await
    }

    async fn ping(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
    }
}

/// Connection state machine: Disconnected → Connecting → Connected, and back to
/// Disconnected when a health ping fails.
pub struct Database<C: Connector> {
    connector: C,
    retry_delay: Duration,
    in_flight: Mutex<()>,
    state: watch::Sender<ConnectionState>,
    connection: RwLock<Option<C::Connection>>,
}

impl<C: Connector> Database<C> {
    pub fn new(connector: C, retry_delay: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Database {
            connector,
            retry_delay,
            in_flight: Mutex::new(()),
            state,
            connection: RwLock::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub async fn connection(&self) -> Option<C::Connection> {
        self.connection.read().await.clone()
    }

    /// Connect, retrying on a fixed delay until it succeeds. A call made while
    /// another attempt is running returns immediately.
    pub async fn connect(&self) -> ConnectOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::info!("a database connection attempt is already in progress");
            return ConnectOutcome::AlreadyInProgress;
        };
        if self.state() == ConnectionState::Connected {
            return ConnectOutcome::AlreadyConnected;
        }
        self.state.send_replace(ConnectionState::Connecting);
        loop {
            match self.connector.connect().await {
                Ok(conn) => {
                    *self.connection.write().await = Some(conn);
                    self.state.send_replace(ConnectionState::Connected);
                    tracing::info!("database connected");
                    return ConnectOutcome::Connected;
                }
                Err(e) => {
                    tracing::error!(error = %e, "database connection failed");
                    tracing::info!("retrying database connection in {}s", self.retry_delay.as_secs());
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Ping the live connection; on failure mark it disconnected, wait the retry
    /// delay and reconnect through the same gate.
    pub async fn check(&self) {
        if self.state() != ConnectionState::Connected {
            return;
        }
        let Some(conn) = self.connection().await else {
            return;
        };
        if let Err(e) = self.connector.ping(&conn).await {
            tracing::warn!(error = %e, "database disconnected");
            self.connection.write().await.take();
            self.state.send_replace(ConnectionState::Disconnected);
            tracing::info!("will attempt database reconnection in {}s", self.retry_delay.as_secs());
            tokio::time::sleep(self.retry_delay).await;
            self.connect().await;
        }
    }

    pub fn spawn_monitor(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.check().await;
            }
        })
    }
}

/// Map a driver error onto the closed backend error set. Unknown failures stay
/// as [`AppError::Db`] and render as internal errors.
pub fn classify(err: sqlx::Error) -> AppError {
    if let sqlx::Error::RowNotFound = err {
        return AppError::Application(ApplicationError::not_found("Record not found"));
    }
    let classified = match &err {
        sqlx::Error::Database(db) => {
            let detail = db
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail());
            db.code()
                .and_then(|code| classify_sqlstate(&code, db.message(), detail))
        }
        _ => None,
    };
    match classified {
        Some(backend) => AppError::Backend(backend),
        None => AppError::Db(err),
    }
}

/// SQLSTATE-based classification. `detail` is the Postgres DETAIL line when present.
pub fn classify_sqlstate(code: &str, message: &str, detail: Option<&str>) -> Option<BackendError> {
    match code {
        // unique_violation: DETAIL reads `Key (email)=(a@b.c) already exists.`
        "23505" => {
            let value = detail
                .and_then(|d| between(d, ")=(", ")"))
                .unwrap_or(message)
                .to_string();
            Some(BackendError::DuplicateKey { value })
        }
        // invalid_text_representation: `invalid input syntax for type uuid: "abc"`
        "22P02" => {
            let (head, value) = message.rsplit_once(": ")?;
            let field = head.rsplit(' ').next().unwrap_or(head).to_string();
            Some(BackendError::InvalidValue {
                field,
                value: value.trim_matches('"').to_string(),
            })
        }
        // not_null_violation, check_violation, string_data_right_truncation
        "23502" | "23514" | "22001" => Some(BackendError::SchemaViolation {
            messages: vec![message.to_string()],
        }),
        _ => None,
    }
}

fn between<'a>(s: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = s.find(start)? + start.len();
    let len = s[from..].rfind(end)?;
    Some(&s[from..from + len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Fails `failures` times, then hands out the attempt number as the connection.
    struct FlakyConnector {
        failures: usize,
        attempts: AtomicUsize,
        healthy: AtomicBool,
    }

    impl FlakyConnector {
        fn new(failures: usize) -> Self {
            FlakyConnector {
                failures,
                attempts: AtomicUsize::new(0),
                healthy: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        type Connection = usize;

        async fn connect(&self) -> Result<usize, sqlx::Error> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(5)).await;
            if n <= self.failures {
                Err(sqlx::Error::PoolTimedOut)
            } else {
                Ok(n)
            }
        }

        async fn ping(&self, _conn: &usize) -> Result<(), sqlx::Error> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(sqlx::Error::PoolClosed)
            }
        }
    }

    #[tokio::test]
    async fn retries_until_connected() {
        let db = Database::new(FlakyConnector::new(2), Duration::from_millis(10));
        assert_eq!(db.state(), ConnectionState::Disconnected);
        assert_eq!(db.connect().await, ConnectOutcome::Connected);
        assert_eq!(db.state(), ConnectionState::Connected);
        assert_eq!(db.connector.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(db.connection().await, Some(3));
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let db = Database::new(FlakyConnector::new(0), Duration::from_millis(10));
        assert_eq!(db.connect().await, ConnectOutcome::Connected);
        assert_eq!(db.connect().await, ConnectOutcome::AlreadyConnected);
        assert_eq!(db.connector.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_connects_share_one_attempt_loop() {
        let db = Arc::new(Database::new(FlakyConnector::new(3), Duration::from_millis(20)));
        let first = tokio::spawn({
            let db = db.clone();
            async move { db.connect().await }
        });
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(db.state(), ConnectionState::Connecting);
        assert_eq!(db.connect().await, ConnectOutcome::AlreadyInProgress);
        assert_eq!(first.await.unwrap(), ConnectOutcome::Connected);
        assert_eq!(db.connector.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn failed_ping_reconnects() {
        let db = Database::new(FlakyConnector::new(0), Duration::from_millis(5));
        db.connect().await;
        let mut states = db.subscribe();
        db.connector.healthy.store(false, Ordering::SeqCst);
        db.check().await;
        assert!(states.has_changed().unwrap());
        assert_eq!(db.state(), ConnectionState::Connected);
        assert_eq!(db.connection().await, Some(2));
    }

    #[tokio::test]
    async fn check_skips_when_not_connected() {
        let db = Database::new(FlakyConnector::new(0), Duration::from_millis(5));
        db.check().await;
        assert_eq!(db.connector.attempts.load(Ordering::SeqCst), 0);
        assert_eq!(db.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn unique_violation_extracts_value() {
        let err = classify_sqlstate(
            "23505",
            "duplicate key value violates unique constraint \"examples_email_key\"",
            Some("Key (email)=(john@example.com) already exists."),
        );
        assert_eq!(
            err,
            Some(BackendError::DuplicateKey {
                value: "john@example.com".into()
            })
        );
    }

    #[test]
    fn unique_violation_without_detail_uses_message() {
        let err = classify_sqlstate("23505", "duplicate key", None);
        assert_eq!(err, Some(BackendError::DuplicateKey { value: "duplicate key".into() }));
    }

    #[test]
    fn invalid_text_representation_becomes_invalid_value() {
        let err = classify_sqlstate("22P02", "invalid input syntax for type uuid: \"abc\"", None);
        assert_eq!(
            err,
            Some(BackendError::InvalidValue {
                field: "uuid".into(),
                value: "abc".into()
            })
        );
    }

    #[test]
    fn constraint_violations_become_schema_violations() {
        for code in ["23502", "23514", "22001"] {
            assert!(matches!(
                classify_sqlstate(code, "value too long", None),
                Some(BackendError::SchemaViolation { .. })
            ));
        }
        assert_eq!(classify_sqlstate("40001", "serialization failure", None), None);
    }

    #[test]
    fn row_not_found_is_operational_404() {
        let err = classify(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), Some(axum::http::StatusCode::NOT_FOUND));
        assert!(err.is_operational());
    }

    #[test]
    fn other_driver_errors_stay_unclassified() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Db(_)));
        assert!(!err.is_operational());
    }
}
