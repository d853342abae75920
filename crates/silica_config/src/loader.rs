//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{HardwareGenerationConfig, SCHEMA_VERSION};
use silica_common::Frequency;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "silica.toml";

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<HardwareGenerationConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from TOML text.
pub fn load_config_from_str(content: &str) -> Result<HardwareGenerationConfig, ConfigError> {
    let config: HardwareGenerationConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that a configuration is internally consistent.
///
/// Called by the loaders and again by the pipeline for configurations built
/// in code.
pub fn validate_config(config: &HardwareGenerationConfig) -> Result<(), ConfigError> {
    if config.schema_version != SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedSchema {
            found: config.schema_version,
            expected: SCHEMA_VERSION,
        });
    }
    if config.device.trim().is_empty() {
        return Err(ConfigError::MissingDevice);
    }
    for entry in &config.instance_counts {
        let reason = if entry.prefix.is_empty() {
            "prefix is empty"
        } else if entry.max == 0 {
            "max must be at least 1"
        } else {
            continue;
        };
        return Err(ConfigError::InvalidEntry {
            table: "instance_counts",
            key: entry.prefix.clone(),
            reason,
        });
    }
    if let Some((name, _)) = config.array_lengths.iter().find(|(_, len)| **len == 0) {
        return Err(ConfigError::InvalidEntry {
            table: "array_lengths",
            key: name.clone(),
            reason: "length must be at least 1",
        });
    }
    if let Some(clock) = &config.clock_frequency {
        clock
            .parse::<Frequency>()
            .map_err(|e| ConfigError::InvalidClock(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationMode;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str("device = \"Nexys A7-100T\"\n").unwrap();
        assert_eq!(config.device, "Nexys A7-100T");
        assert!(config.enable_caching);
        assert_eq!(config.generation_mode, GenerationMode::Verbose);
        assert!(config.array_lengths.is_empty());
        assert!(config.instance_counts.is_empty());
        assert_eq!(config.max_degree_of_parallelism, 0);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
schema_version = 1
device = "Alveo U250"
enable_caching = false
generation_mode = "compact"
max_degree_of_parallelism = 4
hardware_entry_point_prefixes = ["Demo.Kernels"]
clock_frequency = "150MHz"

[array_lengths]
"Demo.Kernels.Sum::values" = 16

[[instance_counts]]
prefix = "Demo.Kernels"
max = 2

[[instance_counts]]
prefix = "Demo.Kernels.Fib"
max = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.device, "Alveo U250");
        assert!(!config.enable_caching);
        assert_eq!(config.max_degree_of_parallelism, 4);
        assert_eq!(config.array_lengths["Demo.Kernels.Sum::values"], 16);
        assert_eq!(config.instance_counts.len(), 2);
        assert_eq!(config.clock_frequency.as_deref(), Some("150MHz"));
    }

    #[test]
    fn missing_device_errors() {
        let err = load_config_from_str("device = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingDevice));
    }

    #[test]
    fn unknown_schema_version_errors() {
        let err = load_config_from_str("schema_version = 7\ndevice = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedSchema { found: 7, .. }));
    }

    #[test]
    fn zero_instance_count_errors() {
        let toml = "device = \"x\"\n[[instance_counts]]\nprefix = \"A\"\nmax = 0\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("`A`"));
    }

    #[test]
    fn zero_array_length_errors() {
        let toml = "device = \"x\"\n[array_lengths]\n\"A::b\" = 0\n";
        assert!(matches!(
            load_config_from_str(toml).unwrap_err(),
            ConfigError::InvalidEntry { table: "array_lengths", .. }
        ));
    }

    #[test]
    fn bad_clock_errors() {
        let toml = "device = \"x\"\nclock_frequency = \"quick\"\n";
        assert!(matches!(
            load_config_from_str(toml).unwrap_err(),
            ConfigError::InvalidClock(_)
        ));
    }

    #[test]
    fn unknown_field_is_parse_error() {
        let err = load_config_from_str("device = \"x\"\nnot_a_field = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "device = \"Nexys A7-100T\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.device, "Nexys A7-100T");
    }

    #[test]
    fn io_error_from_missing_file() {
        let err = load_config(Path::new("/nonexistent/silica.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
