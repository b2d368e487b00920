//! Unique value index.

use crate::record::RecordId;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// Hashable form of a non-null [`Value`].
///
/// Floats are keyed by their bit pattern with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Boolean key.
    Bool(bool),
    /// Integer key.
    Integer(i64),
    /// Float key, as bits.
    Float(u64),
    /// Text key.
    Text(String),
}

impl IndexKey {
    /// Returns the key for `value`, or `None` for null.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Integer(i) => Some(Self::Integer(*i)),
            Value::Float(f) => {
                let f = if *f == 0.0 { 0.0 } else { *f };
                Some(Self::Float(f.to_bits()))
            }
            Value::Text(s) => Some(Self::Text(s.clone())),
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Hash index from value to the single record holding it.
///
/// One index exists per unique field. Null values are never indexed, so
/// any number of records may leave a unique field null.
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    field: String,
    entries: HashMap<IndexKey, RecordId>,
}

impl UniqueIndex {
    /// Creates an empty index for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            entries: HashMap::new(),
        }
    }

    /// Returns the indexed field.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Records that `id` holds `value`.
    ///
    /// Returns the conflicting holder if another record already holds it;
    /// the index is left unchanged in that case. Null is ignored.
    pub fn insert(&mut self, value: &Value, id: RecordId) -> Result<(), RecordId> {
        let Some(key) = IndexKey::from_value(value) else {
            return Ok(());
        };
        match self.entries.get(&key) {
            Some(holder) if *holder != id => Err(*holder),
            _ => {
                self.entries.insert(key, id);
                Ok(())
            }
        }
    }

    /// Removes `value` if it is held by `id`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, value: &Value, id: RecordId) -> bool {
        let Some(key) = IndexKey::from_value(value) else {
            return false;
        };
        if self.entries.get(&key) == Some(&id) {
            self.entries.remove(&key);
            true
        } else {
            false
        }
    }

    /// Returns the record holding `value`.
    #[must_use]
    pub fn holder(&self, value: &Value) -> Option<RecordId> {
        IndexKey::from_value(value).and_then(|key| self.entries.get(&key).copied())
    }

    /// Returns `true` if some record holds `value`.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.holder(value).is_some()
    }

    /// Returns the number of indexed values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
