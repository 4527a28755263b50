//! In-process document store

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{not_found, Document, DocumentStore};
use crate::error::AppResult;

type Collections = HashMap<String, BTreeMap<String, Document>>;

/// Documents held in memory; clones share the same data.
///
/// Each write takes the lock once, so `upsert` is atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |docs| docs.len())
    }

    async fn matching<F>(&self, collection: &str, pred: F) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.values().filter(|d| pred(d)).cloned().collect())
            .unwrap_or_default()
    }
}

fn merge(target: &mut Document, partial: Document) {
    for (key, value) in partial {
        target.insert(key, value);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        Ok(self.matching(collection, |_| true).await)
    }

    async fn query_by_field(&self, collection: &str, field: &str, value: &Value) -> AppResult<Vec<Document>> {
        Ok(self
            .matching(collection, |d| d.get(field) == Some(value))
            .await)
    }

    async fn query_by_two_fields(
        &self,
        collection: &str,
        field_a: &str,
        value_a: &Value,
        field_b: &str,
        value_b: &Value,
    ) -> AppResult<Vec<Document>> {
        Ok(self
            .matching(collection, |d| {
                d.get(field_a) == Some(value_a) && d.get(field_b) == Some(value_b)
            })
            .await)
    }

    async fn upsert(&self, collection: &str, id: &str, document: Document) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        merge(docs.entry(id.to_string()).or_default(), document);
        tracing::debug!(collection, id, "memory upsert");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        merge(existing, partial);
        tracing::debug!(collection, id, "memory update");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| not_found(collection, id))
    }
}
