//! Error types for cache stores.

use std::path::PathBuf;

/// Errors raised by a [`CacheStore`](crate::CacheStore).
///
/// [`HardwareCache`](crate::HardwareCache) logs these and continues as on a
/// miss; they never reach the caller of a transformation.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The identity cannot be used as a storage key.
    #[error("invalid cache key '{key}'")]
    InvalidKey {
        /// The rejected identity.
        key: String,
    },
}
