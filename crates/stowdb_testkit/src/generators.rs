//! Property-based test generators using proptest.
//!
//! Provides strategies for values, documents and operation sequences
//! against the fixture `users` collection. Emails are drawn from a small
//! pool so sequences collide on the unique field often.

use proptest::prelude::*;
use stowdb_core::{Document, RecordId, Value};

/// Number of distinct emails the user strategies draw from.
pub const EMAIL_POOL: usize = 6;

/// Strategy for generating record IDs.
pub fn record_id_strategy() -> impl Strategy<Value = RecordId> {
    prop::array::uniform16(any::<u8>()).prop_map(RecordId::from_bytes)
}

/// Strategy for generating collection and field names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating any scalar value.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[ -~]{0,16}".prop_map(Value::Text),
    ]
}

/// Strategy for generating an email from the shared pool.
pub fn email_strategy() -> impl Strategy<Value = String> {
    (0..EMAIL_POOL).prop_map(|i| format!("user{i}@example.com"))
}

/// Strategy for generating an `age` in any of the forms that coerce to an
/// integer.
pub fn age_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0..120i64).prop_map(Value::Integer),
        (0..120i64).prop_map(|age| Value::Text(age.to_string())),
        (0..120i64).prop_map(|age| Value::Float(age as f64)),
    ]
}

/// Strategy for generating valid `users` documents.
pub fn user_document_strategy() -> impl Strategy<Value = Document> {
    (
        "[A-Z][a-z]{1,8}",
        prop::option::of(age_strategy()),
        prop::option::of(email_strategy()),
    )
        .prop_map(|(name, age, email)| {
            let mut document = Document::new();
            document.insert("name".into(), Value::Text(name));
            if let Some(age) = age {
                document.insert("age".into(), age);
            }
            if let Some(email) = email {
                document.insert("email".into(), Value::Text(email));
            }
            document
        })
}

/// An operation against the fixture `users` collection.
#[derive(Debug, Clone)]
pub enum UserOperation {
    /// Insert a user.
    Insert(Document),
    /// Set `age` on every user with this email.
    SetAge {
        /// Email selecting the target.
        email: String,
        /// New age.
        age: i64,
    },
    /// Move the user holding `from` to `to`.
    ChangeEmail {
        /// Current email.
        from: String,
        /// New email.
        to: String,
    },
    /// Delete every user with this email.
    Delete {
        /// Email selecting the target.
        email: String,
    },
}

/// Strategy for generating user operations.
pub fn user_operation_strategy() -> impl Strategy<Value = UserOperation> {
    prop_oneof![
        4 => user_document_strategy().prop_map(UserOperation::Insert),
        2 => (email_strategy(), 0..120i64)
            .prop_map(|(email, age)| UserOperation::SetAge { email, age }),
        2 => (email_strategy(), email_strategy())
            .prop_map(|(from, to)| UserOperation::ChangeEmail { from, to }),
        1 => email_strategy().prop_map(|email| UserOperation::Delete { email }),
    ]
}

/// Strategy for generating a sequence of user operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<UserOperation>> {
    prop::collection::vec(user_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
