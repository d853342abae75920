//! Errors raised while loading or indexing a syntax tree.

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AstError {
    /// The JSON interchange document could not be parsed.
    #[error("failed to parse syntax tree: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two types share one full name.
    #[error("duplicate type `{name}`")]
    DuplicateType {
        /// The repeated full name.
        name: String,
    },

    /// Two methods of one type share a full member name.
    #[error("duplicate member `{name}`")]
    DuplicateMember {
        /// The repeated member full name.
        name: String,
    },
}
