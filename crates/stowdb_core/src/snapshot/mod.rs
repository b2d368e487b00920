//! Snapshot format.
//!
//! A snapshot is the JSON text a database saves under its name:
//!
//! ```json
//! {
//!   "users": {
//!     "records": {
//!       "5b0c…": {"id": "5b0c…", "created_at": 1700000000000, "updated_at": 1700000000000, "name": "Ada"}
//!     }
//!   }
//! }
//! ```
//!
//! Record IDs in a snapshot are only meaningful inside that snapshot;
//! loading assigns fresh ones and rewrites references to match.

mod order;

pub use order::load_order;

use crate::error::CoreResult;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The saved records of every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    collections: BTreeMap<String, CollectionSnapshot>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses snapshot text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a snapshot.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Renders snapshot text, indented when `pretty` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self, pretty: bool) -> CoreResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }

    /// Adds or replaces a collection.
    pub fn insert(&mut self, name: impl Into<String>, collection: CollectionSnapshot) {
        self.collections.insert(name.into(), collection);
    }

    /// Returns a collection by name.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&CollectionSnapshot> {
        self.collections.get(name)
    }

    /// Iterates over `(name, collection)` pairs in name order.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &CollectionSnapshot)> {
        self.collections
            .iter()
            .map(|(name, collection)| (name.as_str(), collection))
    }

    /// Returns the number of collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns `true` if the snapshot holds no collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Returns the number of records across all collections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.collections.values().map(CollectionSnapshot::len).sum()
    }

    pub(crate) fn into_collections(self) -> BTreeMap<String, CollectionSnapshot> {
        self.collections
    }
}

/// The saved records of one collection, keyed by record ID text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    records: BTreeMap<String, Record>,
}

impl CollectionSnapshot {
    /// Builds a collection snapshot from records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id().to_string(), record.clone()))
                .collect(),
        }
    }

    /// Iterates over `(key, record)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records.iter().map(|(key, record)| (key.as_str(), record))
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the snapshot, returning records oldest first.
    ///
    /// Ties on `created_at` keep key order.
    #[must_use]
    pub fn into_chronological(self) -> Vec<Record> {
        let mut records: Vec<Record> = self.records.into_values().collect();
        records.sort_by_key(Record::created_at);
        records
    }
}

/// What a load did, per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records re-admitted, by collection.
    pub restored: BTreeMap<String, usize>,
    /// Records that failed validation on re-admission, by collection.
    pub rejected: BTreeMap<String, usize>,
    /// Snapshot collections with no registered schema.
    pub skipped: Vec<String>,
}

impl LoadReport {
    /// Returns the number of records restored across all collections.
    #[must_use]
    pub fn total_restored(&self) -> usize {
        self.restored.values().sum()
    }

    /// Returns the number of records rejected across all collections.
    #[must_use]
    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Returns `true` if nothing was rejected or skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total_rejected() == 0 && self.skipped.is_empty()
    }
}
