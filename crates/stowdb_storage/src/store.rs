//! Key-value store trait definition.

use crate::error::{StorageError, StorageResult};

/// A string key-value store that holds saved databases.
///
/// Stores are **opaque**. StowDB writes one snapshot text per database
/// name and reads it back verbatim; stores never parse it.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently passed to `set`
/// - `set` replaces any previous value for the key
/// - `remove` reports whether a value was present
/// - Stores must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the read fails.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// Returns `true` if a value was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn remove(&mut self, key: &str) -> StorageResult<bool>;

    /// Returns every key currently holding a value, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Returns `true` if a value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Checks that `key` can be used as a store key.
///
/// Keys must be non-empty and must not contain path separators, `..`,
/// or NUL bytes, so that every store can map them to a single entry.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first problem found.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "key is empty"));
    }
    if key.contains('/') || key.contains('\\') {
        return Err(StorageError::invalid_key(key, "key contains a path separator"));
    }
    if key.contains("..") {
        return Err(StorageError::invalid_key(key, "key contains '..'"));
    }
    if key.contains('\0') {
        return Err(StorageError::invalid_key(key, "key contains a NUL byte"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_are_valid() {
        assert!(validate_key("app").is_ok());
        assert!(validate_key("app-2024_v1").is_ok());
        assert!(validate_key("my.db").is_ok());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            validate_key(""),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a\\b").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("x\0y").is_err());
    }
}
