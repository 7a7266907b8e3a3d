pub mod filter;
pub mod memory;
pub mod mysql;
mod sql;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use derive_more::Display;
use serde_json::{Map, Value};

pub use filter::{Condition, FindOptions, Filter, Sort, SortDirection};
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// A stored record: a flat JSON object.
pub type Document = Map<String, Value>;

/// Internal record identifier key.
pub const INTERNAL_ID: &str = "_id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "malformed document: {}", _0)]
    Malformed(serde_json::Error),
    #[display(fmt = "store lock poisoned")]
    Poisoned,
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Malformed(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A set of named document collections.
///
/// Every operation is a single attempt; there is no cross-document
/// transaction and concurrent writers race (last write wins).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, ordered and windowed by `options`.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// First matching document in insertion order.
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find(collection, filter, &options).await?.into_iter().next())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Persists `body` as a new document, assigning `_id` and the timestamps.
    async fn insert(&self, collection: &str, body: Document) -> StoreResult<Document>;

    /// Overwrites the given fields of one document and returns the document
    /// as it was before the write, `None` when no document has that `_id`.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>>;

    /// Hard-deletes every document whose `_id` is listed; returns how many went.
    async fn delete_many(&self, collection: &str, ids: &[String]) -> StoreResult<u64>;
}

pub(crate) fn new_internal_id() -> String {
    uuid::Uuid::new_v4().to_simple().to_string()
}

pub(crate) fn timestamp_now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Stamps a fresh document with `_id` and both timestamps.
pub(crate) fn stamp_new(mut body: Document) -> Document {
    let now = timestamp_now();
    body.insert(INTERNAL_ID.to_string(), Value::String(new_internal_id()));
    body.insert(CREATED_AT.to_string(), now.clone());
    body.insert(UPDATED_AT.to_string(), now);
    body
}

/// Applies a partial overwrite; identity and creation time are kept.
pub(crate) fn merge_patch(current: &Document, patch: Document) -> Document {
    let mut merged = current.clone();
    for (key, value) in patch {
        if key == INTERNAL_ID || key == CREATED_AT {
            continue;
        }
        merged.insert(key, value);
    }
    merged.insert(UPDATED_AT.to_string(), timestamp_now());
    merged
}
