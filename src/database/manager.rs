use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseConfig, MEMORY_DATABASE_URL};
use crate::filter::FilterError;

use super::{DocumentStore, InMemoryStore, PostgresStore};

/// Errors from the document store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Invalid query: {0}")]
    Filter(#[from] FilterError),

    #[error("Stored document is not a JSON object: {0}")]
    CorruptDocument(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Opens the store selected by configuration. The returned handle is shared by
/// every request for the life of the process.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        if config.url == MEMORY_DATABASE_URL {
            info!("Using in-memory document store");
            return Ok(Arc::new(InMemoryStore::new()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let store = PostgresStore::new(pool);
        store.ensure_schema().await?;

        info!(max_connections = config.max_connections, "Connected to Postgres document store");
        Ok(Arc::new(store))
    }
}
