//! Collection schemas.
//!
//! A [`Schema`] is produced once by a [`SchemaBuilder`] and then shared by
//! the collection for its lifetime. Besides describing fields it owns the
//! two steps every candidate record passes through:
//!
//! - **normalize**: drop undeclared keys and coerce declared ones towards
//!   their type
//! - **validate**: type, null, uniqueness and reference checks
//!
//! The save-hook is the only part that can change after registration.

mod builder;
mod field;
mod normalize;
mod validate;

pub use builder::{FieldBuilder, ReferenceBuilder, SchemaBuilder};
pub use field::{FieldDefinition, FieldType, Reference};
pub use validate::{ReferenceResolver, Resolution};

pub(crate) use validate::ValidationScope;

use crate::value::{Document, Value};
use std::fmt;
use std::sync::Arc;

/// Function rewriting a candidate record before validation.
pub type SaveHook = Arc<dyn Fn(Document) -> Document + Send + Sync>;

/// The declared shape of one collection.
#[derive(Clone)]
pub struct Schema {
    fields: Vec<FieldDefinition>,
    on_save: Option<SaveHook>,
}

impl Schema {
    pub(crate) fn from_parts(mut fields: Vec<FieldDefinition>, on_save: Option<SaveHook>) -> Self {
        for field in &mut fields {
            if let Some(default) = field.default.take() {
                field.default = Some(field.field_type.coerce(default));
            }
        }
        Self { fields, on_save }
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Returns a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns `true` if `name` is a declared field.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the names of the unique fields.
    pub fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.unique)
            .map(|field| field.name.as_str())
    }

    /// Returns `true` if `name` is declared unique.
    #[must_use]
    pub fn is_unique(&self, name: &str) -> bool {
        self.field(name).is_some_and(|field| field.unique)
    }

    /// Returns every reference as `(field, target)`.
    pub fn references(&self) -> impl Iterator<Item = (&str, &Reference)> {
        self.fields.iter().filter_map(|field| {
            field
                .reference
                .as_ref()
                .map(|target| (field.name.as_str(), target))
        })
    }

    /// Returns the reference declared on `name`.
    #[must_use]
    pub fn reference(&self, name: &str) -> Option<&Reference> {
        self.field(name).and_then(|field| field.reference.as_ref())
    }

    /// Returns the default for `name`, if declared.
    #[must_use]
    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(|field| field.default.as_ref())
    }

    /// Returns `true` if a save-hook is installed.
    #[must_use]
    pub fn has_save_hook(&self) -> bool {
        self.on_save.is_some()
    }

    /// Replaces the save-hook.
    pub fn set_save_hook(&mut self, hook: Option<SaveHook>) {
        self.on_save = hook;
    }

    /// Runs the save-hook, if any.
    #[must_use]
    pub fn apply_save_hook(&self, document: Document) -> Document {
        match &self.on_save {
            Some(hook) => hook(document),
            None => document,
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("on_save", &self.on_save.is_some())
            .finish()
    }
}
