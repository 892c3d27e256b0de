use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::database::store::InventoryStore;

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DatabaseError::NotFound { entity, id }
    }

    /// Connection-level failures that a retry might resolve.
    pub fn is_unavailable(&self) -> bool {
        match self {
            DatabaseError::Unavailable(_) => true,
            DatabaseError::Sqlx(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
            ),
            _ => false,
        }
    }
}

/// Builds the store selected by configuration.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn open(config: &DatabaseConfig) -> Result<Arc<dyn InventoryStore>, DatabaseError> {
        match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory inventory store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreBackend::Postgres => {
                let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
                let store = PgStore::new(Self::connect(url, config).await?);
                store.migrate().await?;
                info!("Connected to PostgreSQL inventory store");
                Ok(Arc::new(store))
            }
        }
    }

    async fn connect(url: &str, config: &DatabaseConfig) -> Result<sqlx::PgPool, DatabaseError> {
        // Server-side bound matching the client-side store timeout
        let options = PgConnectOptions::from_str(url)?
            .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_connection_failures_as_unavailable() {
        assert!(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(DatabaseError::Unavailable("timeout".to_string()).is_unavailable());
        assert!(!DatabaseError::Sqlx(sqlx::Error::RowNotFound).is_unavailable());
        assert!(!DatabaseError::not_found("item", 3).is_unavailable());
    }

    #[tokio::test]
    async fn postgres_backend_requires_url() {
        let config = DatabaseConfig {
            backend: StoreBackend::Postgres,
            url: None,
            max_connections: 1,
            connection_timeout: 1,
            statement_timeout_ms: 100,
        };
        let result = DatabaseManager::open(&config).await;
        assert!(matches!(result, Err(DatabaseError::ConfigMissing("DATABASE_URL"))));
    }
}
