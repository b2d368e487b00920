//! # StowDB Core
//!
//! Schema-validated embedded record store.
//!
//! A [`Database`] holds named collections. Each collection is declared once
//! through a [`SchemaBuilder`] and owns its records, its unique indexes and
//! its auto-increment counters. Every write is normalized and validated
//! against the schema before it is stored; documents that fail are dropped
//! and logged, never partially stored.
//!
//! ## Design Principles
//!
//! - Schemas are fixed at registration; records only carry declared fields
//! - Unique and reference constraints hold after every operation
//! - Record IDs are opaque and local to one database instance
//! - Persistence is a whole-database JSON snapshot in a
//!   [`stowdb_storage::KeyValueStore`]
//! - Loading re-admits every record and rewrites references to new IDs
//!
//! ## Example
//!
//! ```rust
//! use stowdb_core::{doc, Database, Filter, Value};
//!
//! let mut db = Database::open_in_memory("shop");
//! db.migration("parts", |t| {
//!     t.string("name").not_nullable();
//!     t.float("price").default(0.0);
//!     t.increment("serial");
//! })
//! .unwrap();
//!
//! db.query("parts")
//!     .insert([doc! { "name" => "bolt", "price" => "0.25" }, doc! { "name" => "nut" }])
//!     .execute()
//!     .unwrap();
//!
//! let cheap = db
//!     .query("parts")
//!     .filter(Filter::new().lt("price", 0.1))
//!     .select(["name"])
//!     .execute()
//!     .unwrap();
//! assert_eq!(cheap.len(), 1);
//! assert_eq!(cheap[0].value("name"), Value::from("nut"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod database;
mod error;
mod query;
mod record;
mod schema;
mod snapshot;
mod table;
mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult, ValidationError};
pub use query::{Condition, Filter, Intent, Query, QueryBuilder};
pub use record::{
    is_system_field, strip_system_fields, IdGenerator, RandomIdGenerator, Record, RecordId,
    SeededIdGenerator, Timestamp, CREATED_AT_FIELD, ID_FIELD, SYSTEM_FIELDS, UPDATED_AT_FIELD,
};
pub use schema::{
    FieldBuilder, FieldDefinition, FieldType, Reference, ReferenceBuilder, ReferenceResolver,
    Resolution, SaveHook, Schema, SchemaBuilder,
};
pub use snapshot::{load_order, CollectionSnapshot, LoadReport, Snapshot};
pub use table::{IndexKey, Registry, Table, UniqueIndex, WriteContext};
pub use value::{document_from_json, documents_from_json, Document, Value};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
