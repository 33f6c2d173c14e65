//! In-memory storage implementation.
//!
//! This is the reference implementation of the [`RunStore`] trait, used
//! by tests and by integrations that do not need durability. Documents
//! are held as-is in a map keyed by run id.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use vigil_core::RunId;
use vigil_schema::Schema;

use crate::error::{Result, StoreError};
use crate::keys::KeySpec;
use crate::RunStore;

/// Map-backed store for run documents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    runs: RwLock<HashMap<RunId, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored run documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    /// Whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }
}

impl RunStore for MemoryStore {
    fn sync_schema(&self, schema: &Schema, keys: &KeySpec) -> Result<()> {
        for column in keys.columns() {
            if schema.column(column).is_none() {
                return Err(StoreError::UnknownKeyColumn { column });
            }
        }
        tracing::info!(entity = schema.entity, "Synced schema");
        Ok(())
    }

    fn put_run(&self, id: RunId, doc: Value) -> Result<()> {
        tracing::debug!(run_id = %id, "Stored run document");
        self.runs.write().insert(id, doc);
        Ok(())
    }

    fn get_run(&self, id: &RunId) -> Result<Option<Value>> {
        Ok(self.runs.read().get(id).cloned())
    }

    fn delete_run(&self, id: &RunId) -> Result<()> {
        self.runs
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_get_delete() {
        let store = MemoryStore::new();
        let id = RunId::generate();

        assert!(store.is_empty());
        store.put_run(id, json!({"status": "created"})).unwrap();
        assert_eq!(store.len(), 1);

        let doc = store.get_run(&id).unwrap().unwrap();
        assert_eq!(doc["status"], json!("created"));

        store.delete_run(&id).unwrap();
        assert_eq!(store.delete_run(&id).unwrap_err(), StoreError::NotFound);
        assert_eq!(store.get_run(&id).unwrap(), None);
    }

    #[test]
    fn put_overwrites_the_previous_document() {
        let store = MemoryStore::new();
        let id = RunId::generate();

        store.put_run(id, json!({"status": "created"})).unwrap();
        store.put_run(id, json!({"status": "running"})).unwrap();

        assert_eq!(store.len(), 1);
        let doc = store.get_run(&id).unwrap().unwrap();
        assert_eq!(doc["status"], json!("running"));
    }
}
