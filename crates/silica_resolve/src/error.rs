//! Resolution errors.

use silica_ast::AstError;

/// Errors raised while folding constants or sizing arrays.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No configured override and no analyzable allocation gives the length.
    #[error(
        "cannot determine the length of array `{array}`; allocate it with a constant length or add an `array_lengths` entry for it"
    )]
    UnresolvedArrayLength {
        /// Full name of the array.
        array: String,
    },

    /// Two allocation sites give one array different lengths.
    #[error("array `{array}` is allocated with length {first} and with length {second}")]
    ConflictingArrayLength {
        /// Full name of the array.
        array: String,
        /// The length recorded first.
        first: u32,
        /// The conflicting length.
        second: u32,
    },

    /// The tree could not be indexed.
    #[error(transparent)]
    Index(#[from] AstError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_names_the_array() {
        let err = ResolveError::UnresolvedArrayLength {
            array: "Demo.K.Run()::buffer".into(),
        };
        assert!(err.to_string().contains("`Demo.K.Run()::buffer`"));
        assert!(err.to_string().contains("array_lengths"));
    }

    #[test]
    fn conflict_display() {
        let err = ResolveError::ConflictingArrayLength {
            array: "T::f".into(),
            first: 4,
            second: 6,
        };
        assert_eq!(
            err.to_string(),
            "array `T::f` is allocated with length 4 and with length 6"
        );
    }
}
