//! Configuration errors.

use std::path::PathBuf;

/// Why a `silica.toml` (or a configuration built in code) was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The TOML text is malformed or names an unknown field.
    #[error("malformed configuration: {0}")]
    Parse(String),

    /// The document was written for another schema.
    #[error("unsupported schema_version {found} (this build reads {expected})")]
    UnsupportedSchema {
        /// Version in the document.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// No target device was named.
    #[error("`device` must name a target device")]
    MissingDevice,

    /// An `instance_counts` or `array_lengths` entry is unusable.
    #[error("invalid {table} entry `{key}`: {reason}")]
    InvalidEntry {
        /// The table holding the entry.
        table: &'static str,
        /// The entry's prefix or array name.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// `clock_frequency` is not a frequency.
    #[error("invalid clock_frequency: {0}")]
    InvalidClock(String),
}
