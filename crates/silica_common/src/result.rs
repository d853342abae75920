//! Internal-defect result type.

/// Result type for operations that can only fail because of a bug in silica.
///
/// User-fixable problems (missing configuration, unsupported source
/// constructs) have their own error enums in the crates that detect them.
pub type SilicaResult<T> = Result<T, InternalError>;

/// An internal consistency error indicating a defect in silica, not a
/// problem with the user's input.
///
/// These propagate unmodified to the caller and are never converted into a
/// recoverable error or a cache miss.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal consistency error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
