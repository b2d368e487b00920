//! Validation of normalized records.

use super::field::{FieldDefinition, Reference};
use super::Schema;
use crate::error::ValidationError;
use crate::record::RecordId;
use crate::table::Table;
use crate::value::{Document, Value};
use tracing::warn;

/// Outcome of looking a reference value up in its target collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The value exists in the target field.
    Found,
    /// The target is indexed but does not hold the value.
    Missing,
    /// The target collection is missing or the field is neither `id` nor
    /// unique, so the value cannot be looked up.
    Unresolvable,
}

/// Looks reference values up in collections other than the one being
/// written.
pub trait ReferenceResolver {
    /// Resolves `value` against `target`.
    fn resolve(&self, target: &Reference, value: &Value) -> Resolution;
}

impl<F> ReferenceResolver for F
where
    F: Fn(&Reference, &Value) -> Resolution,
{
    fn resolve(&self, target: &Reference, value: &Value) -> Resolution {
        self(target, value)
    }
}

/// Everything a check needs to know beyond the document itself.
pub(crate) struct ValidationScope<'a> {
    /// The collection being written. Serves unique checks and references
    /// to itself.
    pub(crate) own: &'a Table,
    /// Records whose current values do not count as duplicates.
    pub(crate) exempt: &'a [RecordId],
    /// Lookup for references to other collections.
    pub(crate) resolver: &'a dyn ReferenceResolver,
}

impl Schema {
    /// Checks every declared field present in `document`.
    ///
    /// Null passes any nullable field regardless of type. The first failing
    /// check rejects the whole document.
    pub(crate) fn validate(
        &self,
        document: &Document,
        scope: &ValidationScope<'_>,
    ) -> Result<(), ValidationError> {
        for (name, value) in document {
            let Some(field) = self.field(name) else {
                continue;
            };
            if value.is_null() {
                if field.not_nullable {
                    return Err(ValidationError::NullNotAllowed {
                        field: name.clone(),
                    });
                }
                continue;
            }
            if !field.field_type.accepts(value) {
                return Err(ValidationError::TypeMismatch {
                    field: name.clone(),
                    expected: field.field_type.type_name(),
                    found: value.type_name(),
                });
            }
            if field.unique {
                check_unique(field, value, scope)?;
            }
            if let Some(target) = &field.reference {
                check_reference(field, target, value, scope)?;
            }
        }
        Ok(())
    }
}

fn check_unique(
    field: &FieldDefinition,
    value: &Value,
    scope: &ValidationScope<'_>,
) -> Result<(), ValidationError> {
    match scope.own.unique_holder(&field.name, value) {
        Some(holder) if !scope.exempt.contains(&holder) => Err(ValidationError::DuplicateValue {
            field: field.name.clone(),
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

fn check_reference(
    field: &FieldDefinition,
    target: &Reference,
    value: &Value,
    scope: &ValidationScope<'_>,
) -> Result<(), ValidationError> {
    let resolution = if target.table == scope.own.name() {
        scope.own.resolve_field(&target.field, value)
    } else {
        scope.resolver.resolve(target, value)
    };
    match resolution {
        Resolution::Found => Ok(()),
        Resolution::Missing => Err(ValidationError::MissingReference {
            field: field.name.clone(),
            table: target.table.clone(),
            target_field: target.field.clone(),
            value: value.to_string(),
        }),
        Resolution::Unresolvable => {
            warn!(
                collection = scope.own.name(),
                field = %field.name,
                target = %format!("{}.{}", target.table, target.field),
                "reference target is not an indexed field; value not checked"
            );
            Ok(())
        }
    }
}
