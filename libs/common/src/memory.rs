//! In-process record store
//!
//! Evaluates queries with the same ordering rules as the remote store. Backs
//! the `file` store backend (a JSON export of the collection) and tests.

use std::{fs, path::Path};

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::{
    error::{StoreError, StoreResult},
    query::Query,
    store::{Record, RecordStore, Snapshot},
};

/// Record store holding the whole collection in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<(String, Record)>,
}

impl MemoryStore {
    /// Load a collection body (object, array or null)
    pub fn from_value(value: Value) -> StoreResult<Self> {
        let entries = Snapshot::from_value(value)?.into_entries();
        Ok(Self { entries })
    }

    /// Load a JSON export of the collection from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            StoreError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| {
            StoreError::Configuration(format!("Invalid JSON in {}: {}", path.display(), e))
        })?;

        let store = Self::from_value(value)?;
        info!(
            "Loaded {} records from {}",
            store.entries.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, query: &Query) -> StoreResult<Snapshot> {
        Ok(Snapshot::new(query.evaluate(self.entries.clone())))
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
