use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds and checks the process-wide connection pool
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect eagerly, failing fast on a bad URL or unreachable server
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let pool = Self::pool_options(config).connect(&config.url).await?;
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Build a pool that only opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        Ok(Self::pool_options(config).connect_lazy(&config.url)?)
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Validate a table or column name before it is interpolated into SQL.
    /// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DatabaseError::InvalidIdentifier(name.to_string()));
        }
        Ok(())
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
