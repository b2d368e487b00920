//! Collections of records.
//!
//! A [`Table`] owns the records of one collection together with one
//! [`UniqueIndex`] per unique field and one counter per auto-increment
//! field. Every write goes through the schema's normalize and validate
//! steps; reads are plain scans in insertion order.

mod index;
mod write;

pub use index::{IndexKey, UniqueIndex};

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::record::{IdGenerator, Record, RecordId, ID_FIELD};
use crate::schema::{FieldType, Reference, ReferenceResolver, Resolution, SaveHook, Schema};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Collaborators a write needs from outside the table.
pub struct WriteContext<'a> {
    /// Lookup for references to other collections.
    pub resolver: &'a dyn ReferenceResolver,
    /// Source of record IDs and generated tokens.
    pub ids: &'a mut dyn IdGenerator,
    /// Source of timestamps.
    pub clock: &'a dyn Clock,
    /// Log rejections at `warn` rather than `debug`.
    pub verbose: bool,
}

impl<'a> WriteContext<'a> {
    /// Creates a context with quiet rejection logging.
    pub fn new(
        resolver: &'a dyn ReferenceResolver,
        ids: &'a mut dyn IdGenerator,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            resolver,
            ids,
            clock,
            verbose: false,
        }
    }

    /// Sets whether rejections are logged at `warn`.
    #[must_use]
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }
}

/// The records of one collection.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Schema,
    /// Records by insertion slot, so scans follow insertion order.
    records: BTreeMap<u64, Record>,
    slots: HashMap<RecordId, u64>,
    next_slot: u64,
    indexes: BTreeMap<String, UniqueIndex>,
    /// Next value per auto-increment field.
    counters: BTreeMap<String, i64>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        let indexes = schema
            .unique_fields()
            .map(|field| (field.to_string(), UniqueIndex::new(field)))
            .collect();
        let counters = schema
            .fields()
            .iter()
            .filter(|field| field.field_type == FieldType::AutoIncrement)
            .map(|field| (field.name.clone(), 1))
            .collect();
        Self {
            name: name.into(),
            schema,
            records: BTreeMap::new(),
            slots: HashMap::new(),
            next_slot: 0,
            indexes,
            counters,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Replaces the save-hook.
    pub fn set_save_hook(&mut self, hook: Option<SaveHook>) {
        self.schema.set_save_hook(hook);
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a record by ID.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.slots.get(&id).and_then(|slot| self.records.get(slot))
    }

    /// Returns `true` if a record with `id` exists.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Iterates over the records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Returns copies of the records matching `predicate`.
    pub fn select<P>(&self, predicate: P) -> Vec<Record>
    where
        P: Fn(&Record) -> bool,
    {
        self.records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Returns the index of a unique field.
    #[must_use]
    pub fn index(&self, field: &str) -> Option<&UniqueIndex> {
        self.indexes.get(field)
    }

    /// Returns the record holding `value` in unique field `field`.
    #[must_use]
    pub fn unique_holder(&self, field: &str, value: &Value) -> Option<RecordId> {
        self.indexes.get(field).and_then(|index| index.holder(value))
    }

    /// Looks `value` up in `field` as a reference target.
    ///
    /// `id` resolves against the record IDs; any other field must be
    /// unique to be resolvable.
    #[must_use]
    pub fn resolve_field(&self, field: &str, value: &Value) -> Resolution {
        if field == ID_FIELD {
            let found = value
                .as_text()
                .and_then(RecordId::parse)
                .is_some_and(|id| self.contains(id));
            return if found {
                Resolution::Found
            } else {
                Resolution::Missing
            };
        }
        match self.indexes.get(field) {
            Some(index) if index.contains(value) => Resolution::Found,
            Some(_) => Resolution::Missing,
            None => Resolution::Unresolvable,
        }
    }

    /// Removes every record and resets indexes and counters.
    pub fn clear(&mut self) {
        self.records.clear();
        self.slots.clear();
        self.next_slot = 0;
        for index in self.indexes.values_mut() {
            index.clear();
        }
        for counter in self.counters.values_mut() {
            *counter = 1;
        }
    }

    fn log_rejection(&self, operation: &'static str, error: &ValidationError, verbose: bool) {
        if verbose {
            warn!(collection = %self.name, operation, %error, "record rejected");
        } else {
            debug!(collection = %self.name, operation, %error, "record rejected");
        }
    }
}

/// Resolves references against a set of collections by name.
#[derive(Clone, Copy)]
pub struct Registry<'a>(pub &'a BTreeMap<String, Table>);

impl ReferenceResolver for Registry<'_> {
    fn resolve(&self, target: &Reference, value: &Value) -> Resolution {
        self.0
            .get(&target.table)
            .map_or(Resolution::Unresolvable, |table| {
                table.resolve_field(&target.field, value)
            })
    }
}
