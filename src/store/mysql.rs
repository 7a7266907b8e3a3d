use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::debug;

use super::sql::{bind_query, bind_query_as, bind_scalar, build_count, build_delete, build_find};
use super::{
    Document, DocumentStore, FindOptions, Filter, INTERNAL_ID, StoreResult, merge_patch, stamp_new,
};

const CREATE_DOCUMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    collection VARCHAR(64) NOT NULL,
    doc_id CHAR(32) NOT NULL,
    body JSON NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    UNIQUE KEY uq_documents_doc_id (doc_id),
    KEY ix_documents_collection (collection, seq)
)
"#;

/// All collections share one `documents` table keyed by collection name.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates the documents table when it is missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_DOCUMENTS).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MySqlStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let q = build_find(collection, filter, options);
        debug!(sql = %q.sql, bindings = ?q.values, "Finding documents");

        let mut stream =
            bind_query_as(sqlx::query_as::<_, (Json<Document>,)>(&q.sql), q.values).fetch(&self.pool);

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await {
            let (Json(doc),) = row?;
            rows.push(doc);
        }
        Ok(rows)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let q = build_count(collection, filter);
        debug!(sql = %q.sql, bindings = ?q.values, "Counting documents");

        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&q.sql), q.values)
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            "SELECT body FROM documents WHERE collection = ? AND doc_id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn insert(&self, collection: &str, body: Document) -> StoreResult<Document> {
        let doc = stamp_new(body);
        let doc_id = doc
            .get(INTERNAL_ID)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        sqlx::query("INSERT INTO documents (collection, doc_id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&doc_id)
            .bind(Json(&doc))
            .execute(&self.pool)
            .await?;

        Ok(doc)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let Some(before) = self.find_by_id(collection, id).await? else {
            return Ok(None);
        };

        let merged = merge_patch(&before, patch);
        sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND doc_id = ?")
            .bind(Json(&merged))
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(before))
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let q = build_delete(collection, ids);
        let result = bind_query(sqlx::query(&q.sql), q.values)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
