//! Normalization of candidate records.

use super::Schema;
use crate::value::Document;

impl Schema {
    /// Drops undeclared keys and coerces declared ones towards their type.
    ///
    /// Only keys present in `document` are touched; absent fields stay
    /// absent so that patches remain partial.
    #[must_use]
    pub fn normalize(&self, document: Document) -> Document {
        document
            .into_iter()
            .filter_map(|(name, value)| {
                let field = self.field(&name)?;
                let value = field.field_type.coerce(value);
                Some((name, value))
            })
            .collect()
    }

    /// Inserts the declared default of every absent field.
    pub fn fill_defaults(&self, document: &mut Document) {
        for field in &self.fields {
            if let Some(default) = &field.default {
                document
                    .entry(field.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}
