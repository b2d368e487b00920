//! # StowDB Testkit
//!
//! Test utilities for StowDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//! - Invariant checks shared by the integration tests
//!
//! ## Usage
//!
//! ```rust
//! use stowdb_testkit::prelude::*;
//!
//! let mut db = TestDatabase::app();
//! let ada = insert_user(&mut db, "Ada", Some("ada@example.com"));
//! assert_eq!(ada.value("gender"), stowdb_core::Value::from("male"));
//! assert_invariants(&db);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod invariants;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
}

pub use fixtures::*;
pub use generators::*;
pub use invariants::*;
