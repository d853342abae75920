//! Longest-prefix instance-count lookup.
//!
//! A member's instance bound comes from the configured entry whose prefix is
//! the longest plain-string prefix of the member's full name. Members with no
//! matching entry get a default entry keyed by their own full name, and that
//! entry is kept so later lookups (and the assembled output) see the same
//! value.

use crate::types::HardwareGenerationConfig;
use std::collections::BTreeMap;

/// Instance count assigned to members without a configured entry.
pub const DEFAULT_INSTANCE_COUNT: u32 = 1;

/// A resolved instance-count entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceCount {
    /// The prefix this entry is keyed by.
    pub prefix: String,
    /// Maximum number of concurrent physical instances.
    pub max: u32,
    /// `true` when the entry was created on a lookup miss rather than configured.
    pub is_default: bool,
}

/// Instance-count entries keyed by prefix.
#[derive(Debug, Clone, Default)]
pub struct InstanceCountTable {
    entries: BTreeMap<String, InstanceCount>,
}

impl InstanceCountTable {
    /// Builds the table from a configuration. Later entries for the same
    /// prefix override earlier ones.
    pub fn from_config(config: &HardwareGenerationConfig) -> Self {
        let mut entries = BTreeMap::new();
        for entry in &config.instance_counts {
            entries.insert(
                entry.prefix.clone(),
                InstanceCount {
                    prefix: entry.prefix.clone(),
                    max: entry.max,
                    is_default: false,
                },
            );
        }
        Self { entries }
    }

    /// Returns the entry with the longest prefix of `full_name`, without
    /// creating a default.
    pub fn find(&self, full_name: &str) -> Option<&InstanceCount> {
        self.entries
            .values()
            .filter(|entry| full_name.starts_with(entry.prefix.as_str()))
            .max_by_key(|entry| entry.prefix.len())
    }

    /// Returns the entry for `full_name`, inserting a default entry keyed by
    /// the full name when nothing matches.
    pub fn lookup(&mut self, full_name: &str) -> &InstanceCount {
        if self.find(full_name).is_none() {
            log::warn!(
                "no instance count configured for `{full_name}`; using default of {DEFAULT_INSTANCE_COUNT}"
            );
            self.entries.insert(
                full_name.to_string(),
                InstanceCount {
                    prefix: full_name.to_string(),
                    max: DEFAULT_INSTANCE_COUNT,
                    is_default: true,
                },
            );
        }
        // Present: either matched above or just inserted.
        let key = self
            .find(full_name)
            .map(|entry| entry.prefix.clone())
            .unwrap_or_else(|| full_name.to_string());
        &self.entries[&key]
    }

    /// Iterates entries in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = &InstanceCount> {
        self.entries.values()
    }

    /// Returns the number of entries, defaults included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> InstanceCountTable {
        let config = HardwareGenerationConfig::new("dev")
            .with_instance_count("A", 1)
            .with_instance_count("A.B", 3);
        InstanceCountTable::from_config(&config)
    }

    #[test]
    fn longest_prefix_wins() {
        let mut table = table();
        assert_eq!(table.lookup("A.B.C").max, 3);
        assert_eq!(table.lookup("A.B.C").prefix, "A.B");
        assert_eq!(table.lookup("A.X").max, 1);
    }

    #[test]
    fn plain_string_prefix() {
        // Not segment-aware: "A.B" is a prefix of "A.Bx".
        let mut table = table();
        assert_eq!(table.lookup("A.Bx").max, 3);
    }

    #[test]
    fn miss_creates_persisted_default() {
        let mut table = table();
        assert!(table.find("Q.R").is_none());
        let entry = table.lookup("Q.R").clone();
        assert_eq!(entry.max, DEFAULT_INSTANCE_COUNT);
        assert!(entry.is_default);
        assert_eq!(entry.prefix, "Q.R");
        assert_eq!(table.len(), 3);
        assert_eq!(table.find("Q.R"), Some(&entry));
        // Second lookup does not add another entry.
        table.lookup("Q.R");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn later_entries_override_earlier() {
        let config = HardwareGenerationConfig::new("dev")
            .with_instance_count("A", 1)
            .with_instance_count("A", 4);
        let mut table = InstanceCountTable::from_config(&config);
        assert_eq!(table.lookup("A.M").max, 4);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn configured_entries_are_not_default() {
        let table = table();
        assert!(table.iter().all(|entry| !entry.is_default));
        assert!(!table.is_empty());
    }
}
