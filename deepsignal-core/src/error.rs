//! Error types.

use thiserror::Error;

/// Result alias used across the store.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while building or structurally writing a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A payload tried to introduce a key that collides with an accessor.
    ///
    /// `path` is the dotted location of the node the key would have been
    /// added to; the root is the empty string.
    #[error("`{key}` is a reserved property name (at `{path}`)")]
    ReservedKey { key: String, path: String },
}

impl StoreError {
    pub(crate) fn reserved_key(key: &str, path: &[&str]) -> Self {
        StoreError::ReservedKey {
            key: key.to_owned(),
            path: path.join("."),
        }
    }
}
