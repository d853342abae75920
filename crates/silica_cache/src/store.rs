//! The cache store trait and the in-memory store.

use crate::error::CacheError;
use silica_ir::HardwareDescription;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Key-value persistence for hardware descriptions.
pub trait CacheStore: Send + Sync {
    /// Returns the description stored under `identity`, if any.
    fn load(&self, identity: &str) -> Result<Option<HardwareDescription>, CacheError>;

    /// Stores `description` under `identity`, replacing any previous entry.
    fn store(&self, identity: &str, description: &HardwareDescription) -> Result<(), CacheError>;
}

/// A process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, HardwareDescription>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored descriptions.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, identity: &str) -> Result<Option<HardwareDescription>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(identity).cloned())
    }

    fn store(&self, identity: &str, description: &HardwareDescription) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), description.clone());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use silica_common::Frequency;
    use silica_ir::{MemberIdTable, TransformedManifest};
    use silica_timing::DeviceManifest;

    pub(crate) fn description(identity: &str) -> HardwareDescription {
        HardwareDescription {
            identity: identity.to_string(),
            source: format!("-- {identity}\n"),
            device: DeviceManifest {
                name: "Nexys A7-100T".into(),
                clock: Frequency::new(100_000_000.0),
                channels: vec!["Serial".into()],
                memory_bytes: 1 << 27,
            },
            manifest: TransformedManifest {
                components: vec![],
                proxies: vec![],
                member_ids: MemberIdTable::from_names(["Demo.Run()"]),
                entry_points: vec![],
            },
        }
    }

    #[test]
    fn memory_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.load("a").unwrap(), None);
        store.store("a", &description("a")).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(description("a")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_replaces() {
        let store = MemoryStore::new();
        store.store("a", &description("first")).unwrap();
        store.store("a", &description("second")).unwrap();
        assert_eq!(store.load("a").unwrap().unwrap().identity, "second");
    }
}
