//! Record predicates.

use crate::record::Record;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A condition on one field.
///
/// In JSON a bare scalar means equality and a single-key object names an
/// operator: `"Tom"`, `{"not": "Tom"}`, `{"gte": 18}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// Field equals the value.
    Equals(Value),
    /// Field does not equal the value.
    Not(Value),
    /// Field is less than the value.
    Lt(Value),
    /// Field is less than or equal to the value.
    Lte(Value),
    /// Field is greater than the value.
    Gt(Value),
    /// Field is greater than or equal to the value.
    Gte(Value),
}

impl Condition {
    /// Tests a field value against the condition.
    ///
    /// Equality follows [`Value::loosely_equals`]. The ordering operators
    /// only match values [`Value::compare`] can order, so `Null` never
    /// satisfies them.
    #[must_use]
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Self::Equals(expected) => actual.loosely_equals(expected),
            Self::Not(expected) => !actual.loosely_equals(expected),
            Self::Lt(bound) => actual.compare(bound) == Some(Ordering::Less),
            Self::Lte(bound) => matches!(
                actual.compare(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Gt(bound) => actual.compare(bound) == Some(Ordering::Greater),
            Self::Gte(bound) => matches!(
                actual.compare(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Literal(Value),
    Operator(Operator),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Operator {
    Not(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        match raw {
            RawCondition::Literal(value) => Self::Equals(value),
            RawCondition::Operator(Operator::Not(value)) => Self::Not(value),
            RawCondition::Operator(Operator::Lt(value)) => Self::Lt(value),
            RawCondition::Operator(Operator::Lte(value)) => Self::Lte(value),
            RawCondition::Operator(Operator::Gt(value)) => Self::Gt(value),
            RawCondition::Operator(Operator::Gte(value)) => Self::Gte(value),
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Equals(value) => Self::Literal(value),
            Condition::Not(value) => Self::Operator(Operator::Not(value)),
            Condition::Lt(value) => Self::Operator(Operator::Lt(value)),
            Condition::Lte(value) => Self::Operator(Operator::Lte(value)),
            Condition::Gt(value) => Self::Operator(Operator::Gt(value)),
            Condition::Gte(value) => Self::Operator(Operator::Gte(value)),
        }
    }
}

/// A conjunction of per-field conditions.
///
/// A record matches when every condition holds. An absent field is tested
/// as `Null`; the empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    /// Creates a filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a filter from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not an object of conditions.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Adds a condition on `field`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    /// Requires `field` to equal `value`.
    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Equals(value.into()))
    }

    /// Requires `field` to differ from `value`.
    #[must_use]
    pub fn not(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Not(value.into()))
    }

    /// Requires `field` to be less than `value`.
    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Lt(value.into()))
    }

    /// Requires `field` to be at most `value`.
    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Lte(value.into()))
    }

    /// Requires `field` to be greater than `value`.
    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Gt(value.into()))
    }

    /// Requires `field` to be at least `value`.
    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Gte(value.into()))
    }

    /// Returns `true` if no condition is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Iterates over `(field, condition)` pairs.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions
            .iter()
            .map(|(field, condition)| (field.as_str(), condition))
    }

    /// Tests a record against every condition.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(&record.value(field)))
    }
}
