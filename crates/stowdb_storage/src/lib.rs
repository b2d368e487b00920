//! # StowDB Storage
//!
//! Key-value store trait and implementations for StowDB.
//!
//! StowDB persists each database as one text value under the database's
//! name. Stores are **opaque string stores** - they never look inside the
//! values they hold.
//!
//! ## Design Principles
//!
//! - Stores map string keys to string values (get, set, remove)
//! - No knowledge of snapshots, collections or records
//! - Must be `Send + Sync` so a database can move across threads
//! - StowDB owns all interpretation of the stored text
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral databases
//! - [`FileStore`] - One file per key inside a directory
//!
//! ## Example
//!
//! ```rust
//! use stowdb_storage::{InMemoryStore, KeyValueStore};
//!
//! let mut store = InMemoryStore::new();
//! store.set("app", "{}").unwrap();
//! assert_eq!(store.get("app").unwrap().as_deref(), Some("{}"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::{validate_key, KeyValueStore};
