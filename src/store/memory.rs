use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    Document, DocumentStore, FindOptions, Filter, INTERNAL_ID, StoreError, StoreResult,
    merge_patch, stamp_new,
};

/// Process-local store; collections keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections.write().map_err(|_| StoreError::Poisoned)
    }
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get(INTERNAL_ID).and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let guard = self.read()?;
        let mut rows: Vec<Document> = guard
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &options.sort {
            // stable, ties keep insertion order
            rows.sort_by(|a, b| sort.compare(a, b));
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(rows.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let guard = self.read()?;
        let n = guard
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(n as u64)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.read()?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| has_id(d, id)).cloned()))
    }

    async fn insert(&self, collection: &str, body: Document) -> StoreResult<Document> {
        let doc = stamp_new(body);
        self.write()?
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let mut guard = self.write()?;
        let Some(slot) = guard
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| has_id(d, id)))
        else {
            return Ok(None);
        };

        let before = slot.clone();
        *slot = merge_patch(&before, patch);
        Ok(Some(before))
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> StoreResult<u64> {
        let mut guard = self.write()?;
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|d| !ids.iter().any(|id| has_id(d, id)));
        Ok((before - docs.len()) as u64)
    }
}
