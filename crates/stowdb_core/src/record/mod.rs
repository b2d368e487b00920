//! Stored records and their identifiers.

mod generator;
mod id;

pub use generator::{IdGenerator, RandomIdGenerator, SeededIdGenerator};
pub use id::RecordId;

use crate::value::{Document, Value};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Name of the record identifier field.
pub const ID_FIELD: &str = "id";
/// Name of the creation timestamp field.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Name of the last-update timestamp field.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Fields maintained by the store. Caller-supplied values are discarded.
pub const SYSTEM_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// Returns `true` if `name` is a store-maintained field.
#[must_use]
pub fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.contains(&name)
}

/// Removes every store-maintained field from a document.
#[must_use]
pub fn strip_system_fields(mut document: Document) -> Document {
    for name in SYSTEM_FIELDS {
        document.remove(name);
    }
    document
}

/// A stored record: system fields plus the user fields of its schema.
///
/// In JSON the system fields sit beside the user fields:
///
/// ```json
/// {"id": "…", "created_at": 1700000000000, "updated_at": 1700000000000, "name": "Ada"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(flatten)]
    fields: Document,
}

impl Record {
    /// Creates a record. System keys inside `fields` are dropped.
    #[must_use]
    pub fn new(
        id: RecordId,
        created_at: Timestamp,
        updated_at: Timestamp,
        fields: Document,
    ) -> Self {
        Self {
            id,
            created_at,
            updated_at,
            fields: strip_system_fields(fields),
        }
    }

    /// Returns the record's identifier.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// Returns when the record was inserted.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the record was last changed.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the user fields.
    #[must_use]
    pub const fn fields(&self) -> &Document {
        &self.fields
    }

    /// Returns a user field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns any field by name, system fields included.
    ///
    /// The id resolves to its text form, timestamps to integers, and an
    /// absent field to `Null`.
    #[must_use]
    pub fn value(&self, name: &str) -> Value {
        match name {
            ID_FIELD => Value::Text(self.id.to_string()),
            CREATED_AT_FIELD => Value::Integer(timestamp_value(self.created_at)),
            UPDATED_AT_FIELD => Value::Integer(timestamp_value(self.updated_at)),
            _ => self.fields.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    /// Consumes the record, returning its user fields.
    #[must_use]
    pub fn into_fields(self) -> Document {
        self.fields
    }

    /// Returns a copy keeping only the listed user fields.
    ///
    /// System fields are always kept. An empty list keeps everything.
    #[must_use]
    pub fn project(&self, fields: &[String]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        Self {
            fields: self
                .fields
                .iter()
                .filter(|(name, _)| fields.iter().any(|keep| keep == *name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            ..*self
        }
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Document {
        &mut self.fields
    }

    pub(crate) fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

fn timestamp_value(at: Timestamp) -> i64 {
    i64::try_from(at).unwrap_or(i64::MAX)
}
