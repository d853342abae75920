//! Order-independent form of the output-affecting configuration.

use crate::types::{GenerationMode, HardwareGenerationConfig};
use silica_common::Frequency;
use std::collections::BTreeMap;
use std::fmt::Write;

/// The configuration fields that influence generated hardware, sorted and
/// deduplicated.
///
/// Two configurations that differ only in map iteration order or entry order
/// produce equal canonical forms. Fields that only affect how the pipeline
/// runs (caching, parallelism) are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalConfig {
    /// Schema version.
    pub schema_version: u32,
    /// Target device name.
    pub device: String,
    /// Generation mode.
    pub generation_mode: GenerationMode,
    /// Clock override in whole hertz, so `"100MHz"` and `"100000000"`
    /// agree. Text that does not parse is kept as written; validation
    /// rejects it before any identity is computed.
    pub clock_frequency: Option<String>,
    /// Array length overrides sorted by full name.
    pub array_lengths: Vec<(String, u32)>,
    /// Instance counts sorted by prefix; later duplicates win.
    pub instance_counts: Vec<(String, u32)>,
    /// Entry-point prefixes, sorted and deduplicated.
    pub entry_point_prefixes: Vec<String>,
}

impl CanonicalConfig {
    /// Canonicalizes a configuration.
    pub fn from_config(config: &HardwareGenerationConfig) -> Self {
        let array_lengths: BTreeMap<&String, u32> = config
            .array_lengths
            .iter()
            .map(|(name, length)| (name, *length))
            .collect();
        let mut instance_counts = BTreeMap::new();
        for entry in &config.instance_counts {
            instance_counts.insert(entry.prefix.clone(), entry.max);
        }
        let mut entry_point_prefixes = config.hardware_entry_point_prefixes.clone();
        entry_point_prefixes.sort();
        entry_point_prefixes.dedup();

        Self {
            schema_version: config.schema_version,
            device: config.device.clone(),
            generation_mode: config.generation_mode,
            clock_frequency: config.clock_frequency.as_deref().map(canonical_clock),
            array_lengths: array_lengths
                .into_iter()
                .map(|(name, length)| (name.clone(), length))
                .collect(),
            instance_counts: instance_counts.into_iter().collect(),
            entry_point_prefixes,
        }
    }

    /// Renders the canonical form as stable line-oriented text, suitable as
    /// hash input. Names are length-prefixed, so no choice of names can
    /// make two different configurations render alike.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "schema_version={}", self.schema_version);
        let _ = writeln!(out, "device={}", field(&self.device));
        let _ = writeln!(out, "generation_mode={}", self.generation_mode.as_str());
        if let Some(clock) = &self.clock_frequency {
            let _ = writeln!(out, "clock_frequency={}", field(clock));
        }
        for (name, length) in &self.array_lengths {
            let _ = writeln!(out, "array_length {}={length}", field(name));
        }
        for (prefix, max) in &self.instance_counts {
            let _ = writeln!(out, "instance_count {}={max}", field(prefix));
        }
        for prefix in &self.entry_point_prefixes {
            let _ = writeln!(out, "entry_point_prefix {}", field(prefix));
        }
        out
    }
}

fn canonical_clock(text: &str) -> String {
    match text.parse::<Frequency>() {
        Ok(clock) => format!("{}", clock.hz().round() as u64),
        Err(_) => text.to_string(),
    }
}

/// `len:text`, with the length in bytes.
fn field(text: &str) -> String {
    format!("{}:{text}", text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent() {
        let a = HardwareGenerationConfig::new("dev")
            .with_array_length("T.M::x", 4)
            .with_array_length("T.M::a", 2)
            .with_instance_count("T.B", 2)
            .with_instance_count("T.A", 3);
        let b = HardwareGenerationConfig::new("dev")
            .with_array_length("T.M::a", 2)
            .with_array_length("T.M::x", 4)
            .with_instance_count("T.A", 3)
            .with_instance_count("T.B", 2);
        let ca = CanonicalConfig::from_config(&a);
        let cb = CanonicalConfig::from_config(&b);
        assert_eq!(ca, cb);
        assert_eq!(ca.to_canonical_string(), cb.to_canonical_string());
        assert_eq!(ca.array_lengths[0].0, "T.M::a");
    }

    #[test]
    fn runtime_only_fields_excluded() {
        let a = HardwareGenerationConfig::new("dev");
        let mut b = HardwareGenerationConfig::new("dev").with_caching(false);
        b.max_degree_of_parallelism = 8;
        assert_eq!(
            CanonicalConfig::from_config(&a).to_canonical_string(),
            CanonicalConfig::from_config(&b).to_canonical_string()
        );
    }

    #[test]
    fn mode_changes_canonical_form() {
        let a = HardwareGenerationConfig::new("dev");
        let b = HardwareGenerationConfig::new("dev").with_generation_mode(GenerationMode::Compact);
        assert_ne!(
            CanonicalConfig::from_config(&a).to_canonical_string(),
            CanonicalConfig::from_config(&b).to_canonical_string()
        );
    }

    #[test]
    fn duplicate_instance_prefix_last_wins() {
        let config = HardwareGenerationConfig::new("dev")
            .with_instance_count("A", 1)
            .with_instance_count("A", 5);
        let canonical = CanonicalConfig::from_config(&config);
        assert_eq!(canonical.instance_counts, vec![("A".to_string(), 5)]);
    }

    #[test]
    fn clock_spellings_agree() {
        let canonical = |clock: &str| {
            let mut config = HardwareGenerationConfig::new("dev");
            config.clock_frequency = Some(clock.to_string());
            CanonicalConfig::from_config(&config).to_canonical_string()
        };
        assert_eq!(canonical("100MHz"), canonical("100 MHz"));
        assert_eq!(canonical("100MHz"), canonical("100000000"));
        assert_ne!(canonical("100MHz"), canonical("150MHz"));
    }

    #[test]
    fn names_cannot_forge_entries() {
        let forged =
            HardwareGenerationConfig::new("dev").with_array_length("A::x=1\narray_length B::y", 2);
        let honest = HardwareGenerationConfig::new("dev")
            .with_array_length("A::x", 1)
            .with_array_length("B::y", 2);
        assert_ne!(
            CanonicalConfig::from_config(&forged).to_canonical_string(),
            CanonicalConfig::from_config(&honest).to_canonical_string()
        );
    }

    #[test]
    fn prefixes_sorted_and_deduped() {
        let mut config = HardwareGenerationConfig::new("dev");
        config.hardware_entry_point_prefixes =
            vec!["B".to_string(), "A".to_string(), "B".to_string()];
        let canonical = CanonicalConfig::from_config(&config);
        assert_eq!(canonical.entry_point_prefixes, vec!["A", "B"]);
    }
}
