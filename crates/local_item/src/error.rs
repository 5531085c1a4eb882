//! Error types for accessor construction and writes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Configuration fault detected while constructing accessors.
pub enum ConfigError {
    /// Two accessors in one family claimed the same key.
    #[error("duplicate local item key `{key}`")]
    DuplicateKey {
        /// Repeated key.
        key: String,
    },
    /// Default values were supplied for keys that have no codec.
    #[error("default values supplied for unknown keys: {}", keys.join(", "))]
    UnknownDefaultKeys {
        /// Keys without a matching codec, sorted.
        keys: Vec<String>,
    },
    /// A default value does not have the domain type of its key's codec.
    #[error("default value for `{key}` is not a `{expected}`")]
    DefaultTypeMismatch {
        /// Key whose default has the wrong type.
        key: String,
        /// Domain type expected by the codec.
        expected: &'static str,
    },
    /// A default value does not survive the codec round trip.
    #[error("default value for `{key}` is rejected by its codec: {reason}")]
    InvalidDefault {
        /// Key whose default is rejected.
        key: String,
        /// Codec error message.
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure of a write through an accessor.
pub enum LocalItemError {
    /// The value could not be encoded.
    #[error("failed to encode value for `{key}`: {reason}")]
    Encode {
        /// Target key.
        key: String,
        /// Codec error message.
        reason: String,
    },
    /// The backing store rejected the write or removal.
    #[error("store rejected write for `{key}`: {reason}")]
    Store {
        /// Target key.
        key: String,
        /// Store error message.
        reason: String,
    },
}
