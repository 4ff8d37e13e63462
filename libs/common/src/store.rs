//! Record store abstraction shared by every backend

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{StoreError, StoreResult},
    query::Query,
};

/// One stored record: a map from field name to value
pub type Record = serde_json::Map<String, Value>;

/// Order-preserving result of a query: generated key and record pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(String, Record)>,
}

impl Snapshot {
    pub fn new(entries: Vec<(String, Record)>) -> Self {
        Self { entries }
    }

    /// Build a snapshot from a raw collection body.
    ///
    /// The collection may be an object keyed by generated keys, an array when
    /// the keys are sequential integers (holes come back as `null` and are
    /// skipped), or `null` when it is empty.
    pub fn from_value(value: Value) -> StoreResult<Self> {
        let raw: Vec<(String, Value)> = match value {
            Value::Null => Vec::new(),
            Value::Object(map) => map.into_iter().collect(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .filter(|(_, item)| !item.is_null())
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
            other => {
                return Err(StoreError::Unavailable(format!(
                    "expected a collection, got {}",
                    other
                )));
            }
        };

        let entries = raw
            .into_iter()
            .map(|(key, item)| match item {
                Value::Object(record) => Ok((key, record)),
                other => Err(StoreError::Unavailable(format!(
                    "record {} is not an object: {}",
                    key, other
                ))),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Reorder the entries the way `query` orders them
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.entries
            .iter()
            .map(|(key, record)| (key.as_str(), record))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn into_entries(self) -> Vec<(String, Record)> {
        self.entries
    }
}

impl IntoIterator for Snapshot {
    type Item = (String, Record);
    type IntoIter = std::vec::IntoIter<(String, Record)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Read-only access to a keyed record collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a query and return the matching records in query order
    async fn fetch(&self, query: &Query) -> StoreResult<Snapshot>;

    /// Check if the store is reachable
    async fn health_check(&self) -> StoreResult<bool>;
}
