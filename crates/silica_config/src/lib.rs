//! Hardware generation configuration for silica.
//!
//! This crate defines the closed, versioned [`HardwareGenerationConfig`]
//! schema, loads it from `silica.toml`, validates it, and derives the two
//! views the pipeline needs: the [`CanonicalConfig`] that feeds the
//! transformation identity and the [`InstanceCountTable`] with
//! longest-prefix lookup.

#![warn(missing_docs)]

pub mod canonical;
pub mod error;
pub mod instances;
pub mod loader;
pub mod types;

pub use canonical::CanonicalConfig;
pub use error::ConfigError;
pub use instances::{InstanceCount, InstanceCountTable, DEFAULT_INSTANCE_COUNT};
pub use loader::{load_config, load_config_from_str, validate_config, CONFIG_FILE_NAME};
pub use types::*;
