//! Transformation errors and their diagnostic codes.
//!
//! Codes `E300`--`E307` are configuration errors the user fixes in
//! `silica.toml` (or the device catalog), `E400` is a source construct with
//! no hardware mapping, and `E900`--`E901` are internal defects and
//! cancellation.

use silica_common::InternalError;
use silica_config::ConfigError;
use silica_resolve::ResolveError;
use silica_timing::TimingError;

/// A problem with the configuration, or a limit it sets that the program
/// exceeds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// The configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// The syntax tree could not be indexed.
    #[error("invalid syntax tree: {message}")]
    InvalidTree {
        /// What was wrong.
        message: String,
    },

    /// The device is not in the catalog.
    #[error("unknown device `{device}`")]
    UnknownDevice {
        /// The configured name.
        device: String,
    },

    /// An array used by the hardware has no known length.
    #[error(
        "cannot determine the length of array `{array}`; allocate it with a constant length or add an `array_lengths` entry for it"
    )]
    UnresolvedArrayLength {
        /// Full name of the array.
        array: String,
    },

    /// An array is allocated with two different lengths.
    #[error("array `{array}` is allocated with length {first} and with length {second}")]
    ConflictingArrayLength {
        /// Full name of the array.
        array: String,
        /// The length recorded first.
        first: u32,
        /// The conflicting length.
        second: u32,
    },

    /// The timing model cannot cost an operation.
    #[error(transparent)]
    Timing(TimingError),

    /// More calls can be live at once than a member has instances.
    #[error(
        "`{member}` needs {required} concurrent instances but `instance_counts` allows {configured}"
    )]
    InstanceBoundExceeded {
        /// Full name of the member.
        member: String,
        /// The configured maximum.
        configured: u32,
        /// What static analysis found.
        required: u32,
    },

    /// Nothing qualifies as a hardware entry point.
    #[error("no hardware entry points found")]
    NoEntryPoints,
}

impl ConfigurationError {
    /// Returns the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigurationError::InvalidConfig { .. } => "E300",
            ConfigurationError::InvalidTree { .. } => "E301",
            ConfigurationError::UnknownDevice { .. } => "E302",
            ConfigurationError::UnresolvedArrayLength { .. } => "E303",
            ConfigurationError::ConflictingArrayLength { .. } => "E304",
            ConfigurationError::Timing(_) => "E305",
            ConfigurationError::InstanceBoundExceeded { .. } => "E306",
            ConfigurationError::NoEntryPoints => "E307",
        }
    }
}

/// Why a transformation produced no hardware.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Fixable through configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A source construct with no hardware mapping.
    #[error("unsupported construct in `{member}`: {construct}")]
    Unsupported {
        /// What was found.
        construct: String,
        /// Full name of the member containing it.
        member: String,
    },

    /// A defect in silica.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// The request was cancelled.
    #[error("transformation cancelled")]
    Cancelled,
}

impl TransformError {
    /// Shorthand for [`TransformError::Unsupported`].
    pub fn unsupported(construct: impl Into<String>, member: impl Into<String>) -> Self {
        TransformError::Unsupported {
            construct: construct.into(),
            member: member.into(),
        }
    }

    /// Returns the diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            TransformError::Configuration(e) => e.code(),
            TransformError::Unsupported { .. } => "E400",
            TransformError::Internal(_) => "E900",
            TransformError::Cancelled => "E901",
        }
    }
}

impl From<ConfigError> for TransformError {
    fn from(e: ConfigError) -> Self {
        ConfigurationError::InvalidConfig {
            message: e.to_string(),
        }
        .into()
    }
}

impl From<TimingError> for TransformError {
    fn from(e: TimingError) -> Self {
        match e {
            TimingError::UnknownDevice { device } => {
                ConfigurationError::UnknownDevice { device }.into()
            }
            TimingError::InvalidClock(message) => {
                ConfigurationError::InvalidConfig { message }.into()
            }
            other => ConfigurationError::Timing(other).into(),
        }
    }
}

impl From<ResolveError> for TransformError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnresolvedArrayLength { array } => {
                ConfigurationError::UnresolvedArrayLength { array }.into()
            }
            ResolveError::ConflictingArrayLength {
                array,
                first,
                second,
            } => ConfigurationError::ConflictingArrayLength {
                array,
                first,
                second,
            }
            .into(),
            ResolveError::Index(e) => ConfigurationError::InvalidTree {
                message: e.to_string(),
            }
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_by_category() {
        let bound: TransformError = ConfigurationError::InstanceBoundExceeded {
            member: "T.F()".into(),
            configured: 2,
            required: 3,
        }
        .into();
        assert_eq!(bound.code(), "E306");
        assert_eq!(TransformError::unsupported("x", "T.F()").code(), "E400");
        assert_eq!(
            TransformError::from(InternalError::new("dup")).code(),
            "E900"
        );
        assert_eq!(TransformError::Cancelled.code(), "E901");
    }

    #[test]
    fn bound_message_names_member() {
        let err = ConfigurationError::InstanceBoundExceeded {
            member: "Demo.Fib(i32)".into(),
            configured: 2,
            required: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Demo.Fib(i32)"));
        assert!(msg.contains("needs 3"));
        assert!(msg.contains("allows 2"));
    }

    #[test]
    fn resolve_errors_become_configuration_errors() {
        let err: TransformError = ResolveError::UnresolvedArrayLength {
            array: "T.F()::buf".into(),
        }
        .into();
        assert!(matches!(
            err,
            TransformError::Configuration(ConfigurationError::UnresolvedArrayLength { ref array })
                if array == "T.F()::buf"
        ));
    }

    #[test]
    fn timing_errors_split_by_kind() {
        let unknown: TransformError = TimingError::UnknownDevice {
            device: "X".into(),
        }
        .into();
        assert_eq!(unknown.code(), "E302");
        let missing: TransformError = TimingError::MissingEntry {
            operator: "mul".into(),
            width: 24,
            signed: true,
        }
        .into();
        assert_eq!(missing.code(), "E305");
        assert!(missing.to_string().contains("mul"));
    }
}
