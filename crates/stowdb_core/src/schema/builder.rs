//! Fluent schema declaration.

use super::field::{FieldDefinition, FieldType, Reference};
use super::{SaveHook, Schema};
use crate::error::{CoreError, CoreResult};
use crate::record::{is_system_field, ID_FIELD};
use crate::value::{Document, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Declares the fields of one collection.
///
/// Every type-declaring method appends a field and returns a
/// [`FieldBuilder`] for that field; constraints are attached through the
/// handle, so they can only ever apply to the field just declared.
///
/// # Example
///
/// ```rust
/// use stowdb_core::SchemaBuilder;
///
/// let mut users = SchemaBuilder::new();
/// users.string("name").not_nullable();
/// users.integer("age");
/// users.boolean("is_on_mailing_list").default(true);
/// users.string("email").not_nullable().unique();
/// let schema = users.build().unwrap();
/// assert_eq!(schema.fields().len(), 4);
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDefinition>,
    unfinished_references: BTreeSet<usize>,
    on_save: Option<SaveHook>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a string field.
    pub fn string(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        self.declare(name, FieldType::String)
    }

    /// Declares an integer field.
    pub fn integer(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        self.declare(name, FieldType::Integer)
    }

    /// Declares a float field.
    pub fn float(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        self.declare(name, FieldType::Float)
    }

    /// Declares a boolean field.
    pub fn boolean(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        self.declare(name, FieldType::Boolean)
    }

    /// Declares a field filled with a fresh UUID string when not supplied.
    pub fn uuid(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        self.declare(name, FieldType::Uuid)
    }

    /// Declares an auto-increment integer field.
    pub fn increment(&mut self, name: impl Into<String>) -> FieldBuilder<'_> {
        self.declare(name, FieldType::AutoIncrement)
    }

    /// Installs a hook that rewrites every candidate record before it is
    /// normalized and validated.
    pub fn on_save<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(Document) -> Document + Send + Sync + 'static,
    {
        self.on_save = Some(Arc::new(hook));
        self
    }

    fn declare(&mut self, name: impl Into<String>, field_type: FieldType) -> FieldBuilder<'_> {
        self.fields.push(FieldDefinition::new(name, field_type));
        let index = self.fields.len() - 1;
        FieldBuilder {
            builder: self,
            index,
        }
    }

    /// Checks the declaration and produces the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] for empty, reserved or duplicate
    /// field names, references missing their target collection, and
    /// defaults that do not fit their field.
    pub fn build(self) -> CoreResult<Schema> {
        let mut seen = BTreeSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(CoreError::invalid_schema("field name is empty"));
            }
            if is_system_field(&field.name) {
                return Err(CoreError::invalid_schema(format!(
                    "field name '{}' is reserved",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CoreError::invalid_schema(format!(
                    "field '{}' is declared twice",
                    field.name
                )));
            }
            if self.unfinished_references.contains(&index) {
                return Err(CoreError::invalid_schema(format!(
                    "reference on '{}' has no target collection",
                    field.name
                )));
            }
            if let Some(reference) = &field.reference {
                if reference.table.is_empty() || reference.field.is_empty() {
                    return Err(CoreError::invalid_schema(format!(
                        "reference on '{}' is incomplete",
                        field.name
                    )));
                }
            }
            check_default(field)?;
        }
        Ok(Schema::from_parts(self.fields, self.on_save))
    }
}

fn check_default(field: &FieldDefinition) -> CoreResult<()> {
    let Some(default) = &field.default else {
        return Ok(());
    };
    if field.field_type.is_generated() {
        return Err(CoreError::invalid_schema(format!(
            "generated field '{}' cannot have a default",
            field.name
        )));
    }
    let fits = match field.field_type.coerce(default.clone()) {
        Value::Null => !field.not_nullable,
        coerced => field.field_type.accepts(&coerced),
    };
    if fits {
        Ok(())
    } else {
        Err(CoreError::invalid_schema(format!(
            "default {default} does not fit {} field '{}'",
            field.field_type.type_name(),
            field.name
        )))
    }
}

/// Handle on the field most recently declared.
pub struct FieldBuilder<'a> {
    builder: &'a mut SchemaBuilder,
    index: usize,
}

impl<'a> FieldBuilder<'a> {
    fn field(&mut self) -> &mut FieldDefinition {
        &mut self.builder.fields[self.index]
    }

    /// Rejects null for this field.
    pub fn not_nullable(mut self) -> Self {
        self.field().not_nullable = true;
        self
    }

    /// Requires values of this field to be unique across the collection.
    pub fn unique(mut self) -> Self {
        self.field().unique = true;
        self
    }

    /// Sets the value used when the field is absent on insert.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.field().default = Some(value.into());
        self
    }

    /// Starts a reference to `field` of another collection.
    ///
    /// Finish it with [`ReferenceBuilder::from_table`].
    pub fn references(self, field: impl Into<String>) -> ReferenceBuilder<'a> {
        self.builder.unfinished_references.insert(self.index);
        ReferenceBuilder {
            builder: self.builder,
            index: self.index,
            field: field.into(),
        }
    }
}

/// A reference awaiting its target collection.
#[must_use = "a reference without from_table is rejected by build()"]
pub struct ReferenceBuilder<'a> {
    builder: &'a mut SchemaBuilder,
    index: usize,
    field: String,
}

impl<'a> ReferenceBuilder<'a> {
    /// Names the referenced collection.
    pub fn from_table(self, table: impl Into<String>) -> FieldBuilder<'a> {
        self.builder.fields[self.index].reference = Some(Reference::new(table, self.field));
        self.builder.unfinished_references.remove(&self.index);
        FieldBuilder {
            builder: self.builder,
            index: self.index,
        }
    }

    /// References the system identifier of `table`.
    pub fn from_table_id(self, table: impl Into<String>) -> FieldBuilder<'a> {
        let field = ID_FIELD.to_string();
        ReferenceBuilder { field, ..self }.from_table(table)
    }
}
