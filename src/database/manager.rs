use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// SQLSTATE codes the API distinguishes from other database failures
pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

/// Errors from DatabaseManager and the query helpers
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Value too long: {0}")]
    ValueTooLong(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    ValueTooLong,
}

impl ConstraintKind {
    pub fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            UNIQUE_VIOLATION => Some(ConstraintKind::Unique),
            FOREIGN_KEY_VIOLATION => Some(ConstraintKind::ForeignKey),
            STRING_DATA_RIGHT_TRUNCATION => Some(ConstraintKind::ValueTooLong),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::Database(db_err) => db_err
                .code()
                .and_then(|code| ConstraintKind::from_sqlstate(&code))
                .map(|kind| {
                    let detail = db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.message().to_string());
                    (kind, detail)
                }),
            _ => None,
        };

        match classified {
            Some((ConstraintKind::Unique, detail)) => DatabaseError::UniqueViolation(detail),
            Some((ConstraintKind::ForeignKey, detail)) => DatabaseError::ForeignKeyViolation(detail),
            Some((ConstraintKind::ValueTooLong, detail)) => DatabaseError::ValueTooLong(detail),
            None => DatabaseError::Sqlx(err),
        }
    }
}

/// Builds the shared connection pool and runs pool-level maintenance
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create the pool from DATABASE_URL without opening a connection yet.
    /// The server starts even when the database is down; /health reports it.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let options = Self::connect_options(&database_url, config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy_with(options);

        info!(
            "Created database pool (max_connections={}, timeout={}s)",
            config.max_connections, config.connection_timeout
        );
        Ok(pool)
    }

    pub fn connect_options(
        database_url: &str,
        config: &DatabaseConfig,
    ) -> Result<PgConnectOptions, DatabaseError> {
        let url = url::Url::parse(database_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }

        let mut options =
            PgConnectOptions::from_str(url.as_str()).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        options = if config.enable_query_logging {
            options.log_statements(LevelFilter::Debug)
        } else {
            options.disable_statement_logging()
        };

        if config.enable_slow_query_warning {
            options = options.log_slow_statements(
                LevelFilter::Warn,
                Duration::from_millis(config.slow_query_threshold_ms),
            );
        }

        Ok(options)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(pool: PgPool) {
        pool.close().await;
        info!("Closed database pool");
    }
}
