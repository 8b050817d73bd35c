use once_cell::sync::OnceCell;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{self, DatabaseConfig};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static MAIN_POOL: OnceCell<PgPool> = OnceCell::new();

/// Owns the process-wide connection pool for the store database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Get the main pool, creating it lazily on first use.
    ///
    /// No connection is opened until a query runs, so the server can start
    /// while Postgres is still unreachable.
    pub fn main_pool() -> Result<PgPool, DatabaseError> {
        MAIN_POOL
            .get_or_try_init(|| {
                let settings = &config::config().database;
                let pool = Self::build_pool(settings)?;
                info!("Created database pool for: {}", Self::redacted_url(&settings.url));
                Ok(pool)
            })
            .cloned()
    }

    /// Build a lazily connecting pool from settings
    pub fn build_pool(settings: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let options: PgConnectOptions = settings
            .url
            .parse()
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        Ok(PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connection_timeout))
            .connect_lazy_with(options))
    }

    /// Apply the embedded schema migrations
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::main_pool()?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the main pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::main_pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool on shutdown
    pub async fn close_all() {
        if let Some(pool) = MAIN_POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }

    /// Strip credentials from a connection URL so it can be logged
    pub fn redacted_url(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.into()
            }
            Err(_) => "<invalid database url>".to_string(),
        }
    }
}
