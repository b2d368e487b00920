//! Error types for StowDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by database-level operations.
///
/// Record-level rejections are not errors at this level: a rejected record
/// is left out of the operation's result and described by a
/// [`ValidationError`] in the logs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Key-value store error.
    #[error("storage error: {0}")]
    Storage(#[from] stowdb_storage::StorageError),

    /// Snapshot text could not be produced or parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collection not found.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// A collection with this name is already registered.
    #[error("collection already exists: {name}")]
    CollectionAlreadyExists {
        /// Name of the collection.
        name: String,
    },

    /// A schema description is inconsistent.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },

    /// A declared reference points at something that cannot be resolved.
    #[error("invalid reference {collection}.{field}: {message}")]
    InvalidReference {
        /// Collection declaring the reference.
        collection: String,
        /// Field declaring the reference.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// Collections reference each other in a cycle and cannot be loaded.
    #[error("reference cycle between collections: {}", collections.join(", "))]
    ReferenceCycle {
        /// Collections taking part in the cycle.
        collections: Vec<String>,
    },

    /// A snapshot is well-formed JSON but cannot be applied.
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates a collection already exists error.
    pub fn collection_already_exists(name: impl Into<String>) -> Self {
        Self::CollectionAlreadyExists { name: name.into() }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid reference error.
    pub fn invalid_reference(
        collection: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidReference {
            collection: collection.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid snapshot error.
    pub fn invalid_snapshot(message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            message: message.into(),
        }
    }
}

/// Why a single record was rejected by a collection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The document carried no fields at all.
    #[error("record is empty")]
    EmptyRecord,

    /// A field holds a value of the wrong type after normalization.
    #[error("field '{field}' expects {expected}, found {found}")]
    TypeMismatch {
        /// The offending field.
        field: String,
        /// Declared type name.
        expected: &'static str,
        /// Type name of the supplied value.
        found: &'static str,
    },

    /// A not-nullable field was set to null.
    #[error("field '{field}' cannot be null")]
    NullNotAllowed {
        /// The offending field.
        field: String,
    },

    /// A unique field value is already held by another record.
    #[error("field '{field}' must be unique; {value} is already taken")]
    DuplicateValue {
        /// The offending field.
        field: String,
        /// Rendering of the duplicated value.
        value: String,
    },

    /// A reference value does not exist in the target collection.
    #[error("field '{field}' references {table}.{target_field} = {value}, which does not exist")]
    MissingReference {
        /// The referencing field.
        field: String,
        /// Target collection.
        table: String,
        /// Target field.
        target_field: String,
        /// Rendering of the missing value.
        value: String,
    },

    /// An update would give the same unique value to several records.
    #[error("update assigns unique field '{field}' to {matches} records")]
    AmbiguousUniqueUpdate {
        /// The unique field in the patch.
        field: String,
        /// Number of records the filter matched.
        matches: usize,
    },
}
