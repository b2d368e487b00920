//! Declarative reads and writes.
//!
//! A [`Query`] is a plain value naming a collection, an optional
//! projection, a [`Filter`] and at most one effective write intent. It can
//! be prepared ahead of time and run with [`crate::Database::execute`], or
//! built in place through the [`QueryBuilder`] that
//! [`crate::Database::query`] returns.

mod builder;
mod filter;

pub use builder::{Intent, Query, QueryBuilder};
pub use filter::{Condition, Filter};

pub(crate) use builder::QueryParts;
