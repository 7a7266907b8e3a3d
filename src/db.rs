use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{DocumentStore, MemoryStore, MySqlStore};

/// Opens the configured document store. Without `DATABASE_URL` documents
/// live in memory and are gone on restart.
pub async fn init_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using the in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = MySqlPool::connect(url)
        .await
        .context("Failed to connect to database")?;
    let store = MySqlStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("Failed to prepare the documents table")?;

    info!("Connected to MySQL");
    Ok(Arc::new(store))
}
