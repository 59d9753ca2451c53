//! In-process document store for tests and offline runs.

use crate::store::{DocumentStore, StoreError};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// A map-backed [`DocumentStore`] with the same put semantics as the remote
/// one: explicit ids overwrite, omitted ids get a fresh uuid.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection.
    pub fn document_count(&self, collection: &str) -> usize {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.get(collection).map_or(0, BTreeMap::len)
    }

    /// Snapshot of a collection as (id, record) pairs, ordered by id.
    pub fn documents(&self, collection: &str) -> Vec<(String, Value)> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections
            .get(collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Total documents across all collections.
    pub fn total_documents(&self) -> usize {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.values().map(BTreeMap::len).sum()
    }
}

impl DocumentStore for MemoryStore {
    fn put(
        &self,
        collection: &str,
        document_id: Option<&str>,
        record: &Value,
    ) -> Result<String, StoreError> {
        let id = match document_id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };

        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record.clone());

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_with_id_overwrites() {
        let store = MemoryStore::new();

        store
            .put("users/u/raw_periodic", Some("100"), &json!({"v": 1}))
            .unwrap();
        store
            .put("users/u/raw_periodic", Some("100"), &json!({"v": 2}))
            .unwrap();

        assert_eq!(store.document_count("users/u/raw_periodic"), 1);
        let docs = store.documents("users/u/raw_periodic");
        assert_eq!(docs[0].1["v"], 2);
    }

    #[test]
    fn test_put_without_id_appends() {
        let store = MemoryStore::new();

        let a = store.put("users/u/raw_events", None, &json!({"v": 1})).unwrap();
        let b = store.put("users/u/raw_events", None, &json!({"v": 2})).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.document_count("users/u/raw_events"), 2);
    }

    #[test]
    fn test_collections_are_independent() {
        let store = MemoryStore::new();
        store.put("a", Some("1"), &json!({})).unwrap();
        store.put("b", Some("1"), &json!({})).unwrap();

        assert_eq!(store.document_count("a"), 1);
        assert_eq!(store.document_count("b"), 1);
        assert_eq!(store.total_documents(), 2);
        assert_eq!(store.document_count("c"), 0);
    }
}
