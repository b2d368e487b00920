//! Invariant checks over a whole database.
//!
//! These hold after every operation, whatever mix of accepted and rejected
//! writes came before.

use std::collections::{BTreeMap, HashSet};
use stowdb_core::{Database, IndexKey, Record, RecordId, Table, ID_FIELD};

/// Panics unless every stored record honours its collection's constraints:
/// unique values are distinct and indexed, references resolve, and
/// `created_at <= updated_at`.
pub fn assert_invariants(db: &Database) {
    for name in db.collection_names() {
        let table = db.table(name).expect("listed collection exists");
        assert_unique_fields(table);
        assert_references(db, table);
        for record in table.records() {
            assert!(
                record.created_at() <= record.updated_at(),
                "{name}/{}: created_at after updated_at",
                record.id()
            );
        }
    }
}

fn assert_unique_fields(table: &Table) {
    for field in table.schema().unique_fields() {
        let index = table.index(field).expect("unique field is indexed");
        let mut seen = HashSet::new();
        for record in table.records() {
            let value = record.value(field);
            let Some(key) = IndexKey::from_value(&value) else {
                continue;
            };
            assert!(
                seen.insert(key),
                "{}.{field}: value {value} held twice",
                table.name()
            );
            assert_eq!(
                index.holder(&value),
                Some(record.id()),
                "{}.{field}: index out of step for {value}",
                table.name()
            );
        }
        assert_eq!(index.len(), seen.len(), "{}.{field}: stale index entries", table.name());
    }
}

fn assert_references(db: &Database, table: &Table) {
    for (field, target) in table.schema().references() {
        let Some(target_table) = db.table(&target.table) else {
            continue;
        };
        for record in table.records() {
            let value = record.value(field);
            if value.is_null() {
                continue;
            }
            let resolved = if target.field == ID_FIELD {
                value
                    .as_text()
                    .and_then(RecordId::parse)
                    .is_some_and(|id| target_table.contains(id))
            } else {
                target_table.unique_holder(&target.field, &value).is_some()
            };
            assert!(
                resolved,
                "{}.{field} = {value} does not resolve in {}.{}",
                table.name(),
                target.table,
                target.field
            );
        }
    }
}

/// Returns every collection's records as comparable strings that do not
/// depend on record IDs or timestamps.
///
/// Fields referencing another record's `id` are replaced by that record's
/// own user fields, so two databases holding the same linked data compare
/// equal even when their IDs differ.
pub fn id_free_contents(db: &Database) -> BTreeMap<String, Vec<String>> {
    db.collection_names()
        .map(|name| {
            let table = db.table(name).expect("listed collection exists");
            let mut rows: Vec<String> = table
                .records()
                .map(|record| describe(db, table, record))
                .collect();
            rows.sort();
            (name.to_string(), rows)
        })
        .collect()
}

fn describe(db: &Database, table: &Table, record: &Record) -> String {
    let mut fields = record.fields().clone();
    for (field, target) in table.schema().references() {
        if target.field != ID_FIELD {
            continue;
        }
        let linked = fields
            .get(field)
            .and_then(|value| value.as_text())
            .and_then(RecordId::parse)
            .and_then(|id| db.table(&target.table).and_then(|t| t.get(id)));
        if let Some(linked) = linked {
            let text = serde_json::to_string(linked.fields()).expect("fields serialize");
            fields.insert(field.to_string(), text.into());
        }
    }
    serde_json::to_string(&fields).expect("fields serialize")
}
