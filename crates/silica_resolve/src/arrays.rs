//! The array-size table and array naming.
//!
//! Arrays are keyed by full name:
//!
//! | Array | Key |
//! |---|---|
//! | local `buf` of `Demo.K.Run(i32)` | `Demo.K.Run(i32)::buf` |
//! | parameter `xs` of `Demo.K.Sum(i32[])` | `Demo.K.Sum(i32[])::xs` |
//! | value returned by `Demo.K.Make()` | `Demo.K.Make()::return` |
//! | field `Table` of `Demo.K` | `Demo.K::Table` |

use crate::error::ResolveError;
use silica_config::HardwareGenerationConfig;
use std::collections::BTreeMap;

/// Key of a local or parameter array of a member.
pub fn member_array_key(member_full_name: &str, name: &str) -> String {
    format!("{member_full_name}::{name}")
}

/// Key of the array returned by a member.
pub fn return_array_key(member_full_name: &str) -> String {
    format!("{member_full_name}::return")
}

/// Key of an array field.
pub fn field_array_key(type_full_name: &str, field: &str) -> String {
    format!("{type_full_name}::{field}")
}

/// Where a length came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthSource {
    /// An `array_lengths` configuration entry.
    Configured,
    /// Static analysis of allocation sites.
    Inferred,
}

/// A resolved array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayLength {
    /// Number of elements.
    pub length: u32,
    /// Origin of the value.
    pub source: LengthSource,
}

/// Array lengths keyed by array full name.
///
/// Configured entries take precedence over inference. Inferred entries are
/// write-once: a second, different length for the same array is an error.
#[derive(Debug, Clone, Default)]
pub struct ArraySizeTable {
    lengths: BTreeMap<String, ArrayLength>,
}

impl ArraySizeTable {
    /// Seeds the table with the configured overrides.
    pub fn from_config(config: &HardwareGenerationConfig) -> Self {
        let lengths = config
            .array_lengths
            .iter()
            .map(|(name, length)| {
                (
                    name.clone(),
                    ArrayLength {
                        length: *length,
                        source: LengthSource::Configured,
                    },
                )
            })
            .collect();
        Self { lengths }
    }

    /// Records an inferred length. Returns `true` if the table changed.
    pub fn record(&mut self, array: &str, length: u32) -> Result<bool, ResolveError> {
        match self.lengths.get(array) {
            Some(existing) if existing.source == LengthSource::Configured => Ok(false),
            Some(existing) if existing.length == length => Ok(false),
            Some(existing) => Err(ResolveError::ConflictingArrayLength {
                array: array.to_string(),
                first: existing.length,
                second: length,
            }),
            None => {
                self.lengths.insert(
                    array.to_string(),
                    ArrayLength {
                        length,
                        source: LengthSource::Inferred,
                    },
                );
                Ok(true)
            }
        }
    }

    /// Returns the length of `array`, if known.
    pub fn get(&self, array: &str) -> Option<u32> {
        self.lengths.get(array).map(|e| e.length)
    }

    /// Returns the full entry for `array`.
    pub fn entry(&self, array: &str) -> Option<ArrayLength> {
        self.lengths.get(array).copied()
    }

    /// Returns the length of `array` or a named error.
    pub fn require(&self, array: &str) -> Result<u32, ResolveError> {
        self.get(array)
            .ok_or_else(|| ResolveError::UnresolvedArrayLength {
                array: array.to_string(),
            })
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ArrayLength)> {
        self.lengths.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        assert_eq!(member_array_key("T.M()", "buf"), "T.M()::buf");
        assert_eq!(return_array_key("T.M()"), "T.M()::return");
        assert_eq!(field_array_key("T", "Table"), "T::Table");
    }

    #[test]
    fn record_is_write_once() {
        let mut table = ArraySizeTable::default();
        assert!(table.record("a", 5).unwrap());
        assert!(!table.record("a", 5).unwrap());
        let err = table.record("a", 6).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ConflictingArrayLength {
                first: 5,
                second: 6,
                ..
            }
        ));
    }

    #[test]
    fn configured_wins_over_inferred() {
        let config = HardwareGenerationConfig::new("dev").with_array_length("a", 8);
        let mut table = ArraySizeTable::from_config(&config);
        assert!(!table.record("a", 5).unwrap());
        assert_eq!(table.get("a"), Some(8));
    }

    #[test]
    fn require_names_missing_array() {
        let table = ArraySizeTable::default();
        let err = table.require("T.M()::xs").unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedArrayLength { array } if array == "T.M()::xs"));
        assert!(table.is_empty());
    }
}
