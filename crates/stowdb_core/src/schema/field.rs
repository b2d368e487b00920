//! Field definitions and per-type coercion.

use crate::value::Value;

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// Text token generated on insert when not supplied.
    Uuid,
    /// Integer taken from a per-collection counter when not supplied.
    AutoIncrement,
}

impl FieldType {
    /// Returns the type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Uuid => "uuid",
            Self::AutoIncrement => "increment",
        }
    }

    /// Returns `true` if the store fills the field when it is not supplied.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Uuid | Self::AutoIncrement)
    }

    /// Coerces a supplied value towards this type.
    ///
    /// Coercion never fails; a value that cannot be converted is returned
    /// unchanged and later fails [`FieldType::accepts`].
    #[must_use]
    pub fn coerce(&self, value: Value) -> Value {
        match self {
            Self::Integer | Self::AutoIncrement => coerce_integer(value),
            Self::Float => coerce_float(value),
            Self::Boolean => coerce_boolean(value),
            Self::String => coerce_string(value),
            Self::Uuid => value,
        }
    }

    /// Returns `true` if a non-null value conforms to this type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String | Self::Uuid, Value::Text(_))
            | (Self::Integer | Self::AutoIncrement, Value::Integer(_))
            | (Self::Float, Value::Float(_))
            | (Self::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

fn coerce_integer(value: Value) -> Value {
    match value {
        Value::Float(f) => integral(f).map_or(Value::Float(f), Value::Integer),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(integral)
            .map_or(Value::Null, Value::Integer),
        other => other,
    }
}

fn integral(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then(|| f as i64)
}

fn coerce_float(value: Value) -> Value {
    match value {
        Value::Integer(i) => Value::Float(i as f64),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Value::Float(f),
            _ => Value::Text(s),
        },
        other => other,
    }
}

fn coerce_boolean(value: Value) -> Value {
    match value {
        Value::Text(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
        Value::Text(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
        Value::Text(s) => Value::Bool(!s.is_empty()),
        Value::Integer(i) => Value::Bool(i != 0),
        Value::Float(f) => Value::Bool(f != 0.0 && !f.is_nan()),
        other => other,
    }
}

fn coerce_string(value: Value) -> Value {
    match value {
        Value::Integer(i) => Value::Text(i.to_string()),
        Value::Float(f) => Value::Text(f.to_string()),
        other => other,
    }
}

/// Target of a reference field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Referenced collection.
    pub table: String,
    /// Referenced field; `id` or a unique field.
    pub field: String,
}

impl Reference {
    /// Creates a reference to `table.field`.
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
        }
    }
}

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Whether null is rejected.
    pub not_nullable: bool,
    /// Whether values must be unique across the collection.
    pub unique: bool,
    /// Value used when the field is absent on insert.
    pub default: Option<Value>,
    /// Target of the field when it is a reference.
    pub reference: Option<Reference>,
}

impl FieldDefinition {
    /// Creates an unconstrained field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            not_nullable: false,
            unique: false,
            default: None,
            reference: None,
        }
    }
}
