//! Configuration types deserialized from `silica.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The only schema version this build understands.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_true() -> bool {
    true
}

/// Configuration of one hardware generation request.
///
/// Threaded explicitly into every pass; there is no ambient lookup. The
/// maps and lists here may arrive in any order, so anything that affects
/// output goes through [`CanonicalConfig`](crate::CanonicalConfig) first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareGenerationConfig {
    /// Schema version of this document.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Name of the target device in the device catalog.
    pub device: String,
    /// Whether results are looked up in and stored to the cache.
    #[serde(default = "default_true")]
    pub enable_caching: bool,
    /// Verbose (debuggable) or compact output.
    #[serde(default)]
    pub generation_mode: GenerationMode,
    /// Explicit array lengths keyed by the array's full name.
    ///
    /// These take precedence over lengths inferred from allocation sites.
    #[serde(default)]
    pub array_lengths: HashMap<String, u32>,
    /// Maximum concurrent hardware instances per member-name prefix.
    #[serde(default)]
    pub instance_counts: Vec<InstanceCountEntry>,
    /// Upper bound on parallel member transformation; `0` means one per core.
    #[serde(default)]
    pub max_degree_of_parallelism: usize,
    /// Restricts entry points to members whose full name starts with one of
    /// these prefixes. Empty means every valid entry point is used.
    #[serde(default)]
    pub hardware_entry_point_prefixes: Vec<String>,
    /// Overrides the device's default clock (e.g. `"150MHz"`).
    #[serde(default)]
    pub clock_frequency: Option<String>,
}

impl HardwareGenerationConfig {
    /// Creates a configuration for `device` with every other field at its default.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            device: device.into(),
            enable_caching: true,
            generation_mode: GenerationMode::default(),
            array_lengths: HashMap::new(),
            instance_counts: Vec::new(),
            max_degree_of_parallelism: 0,
            hardware_entry_point_prefixes: Vec::new(),
            clock_frequency: None,
        }
    }

    /// Adds an explicit array length override.
    pub fn with_array_length(mut self, array_full_name: impl Into<String>, length: u32) -> Self {
        self.array_lengths.insert(array_full_name.into(), length);
        self
    }

    /// Appends an instance-count entry.
    pub fn with_instance_count(mut self, prefix: impl Into<String>, max: u32) -> Self {
        self.instance_counts.push(InstanceCountEntry {
            prefix: prefix.into(),
            max,
        });
        self
    }

    /// Sets the generation mode.
    pub fn with_generation_mode(mut self, mode: GenerationMode) -> Self {
        self.generation_mode = mode;
        self
    }

    /// Enables or disables caching.
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.enable_caching = enabled;
        self
    }
}

/// One `(prefix, max)` row of the instance-count configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceCountEntry {
    /// Member full-name prefix this entry applies to.
    pub prefix: String,
    /// Maximum number of concurrent physical instances.
    pub max: u32,
}

/// How the hardware description is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Readable names and source comments (default).
    #[default]
    Verbose,
    /// Short generated names, no comments.
    Compact,
}

impl GenerationMode {
    /// Returns the lowercase name used in canonical form.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Verbose => "verbose",
            GenerationMode::Compact => "compact",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn builder_sets_fields() {
        let config = HardwareGenerationConfig::new("Nexys A7-100T")
            .with_array_length("Ns.Type.Method::buffer", 8)
            .with_instance_count("Ns.Type", 4)
            .with_generation_mode(GenerationMode::Compact)
            .with_caching(false);
        assert_eq!(config.array_lengths["Ns.Type.Method::buffer"], 8);
        assert_eq!(config.instance_counts[0].max, 4);
        assert_eq!(config.generation_mode, GenerationMode::Compact);
        assert!(!config.enable_caching);
    }

    #[test]
    fn generation_mode_variants() {
        for (input, expected) in [
            ("verbose", GenerationMode::Verbose),
            ("compact", GenerationMode::Compact),
        ] {
            let toml = format!("device = \"Nexys A7-100T\"\ngeneration_mode = \"{input}\"\n");
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.generation_mode, expected);
            assert_eq!(config.generation_mode.as_str(), input);
        }
    }
}
