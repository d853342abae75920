//! On-disk store.
//!
//! Each description is written to `<dir>/<identity>.shw` as a 4-byte
//! little-endian header length, a bincode header (magic, format version,
//! producing silica version, payload checksum) and the bincode payload.
//! Reads are fail-safe: a missing, truncated, foreign, outdated or corrupt
//! file is a miss.

use crate::error::CacheError;
use crate::store::CacheStore;
use log::debug;
use serde::{Deserialize, Serialize};
use silica_common::ContentHash;
use silica_ir::HardwareDescription;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Magic bytes identifying a silica cache entry.
const ENTRY_MAGIC: [u8; 4] = *b"SLCA";

/// Current entry format version.
const ENTRY_FORMAT_VERSION: u32 = 1;

/// File extension of cache entries.
const ENTRY_EXT: &str = "shw";

/// Header prepended to every entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryHeader {
    magic: [u8; 4],
    format_version: u32,
    silica_version: String,
    checksum: ContentHash,
}

/// A store writing one file per identity.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    silica_version: String,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            silica_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Returns the file an identity is stored in.
    pub fn entry_path(&self, identity: &str) -> Result<PathBuf, CacheError> {
        if identity.is_empty() || !identity.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CacheError::InvalidKey {
                key: identity.to_string(),
            });
        }
        Ok(self.dir.join(format!("{identity}.{ENTRY_EXT}")))
    }

    fn decode(&self, raw: &[u8]) -> Option<HardwareDescription> {
        if raw.len() < 4 {
            return None;
        }
        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }
        let header: EntryHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != ENTRY_MAGIC
            || header.format_version != ENTRY_FORMAT_VERSION
            || header.silica_version != self.silica_version
        {
            return None;
        }
        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .ok()
            .map(|(description, _)| description)
    }
}

impl CacheStore for FileStore {
    fn load(&self, identity: &str) -> Result<Option<HardwareDescription>, CacheError> {
        let path = self.entry_path(identity)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        let decoded = self.decode(&raw);
        if decoded.is_none() {
            debug!("discarding unreadable cache entry {}", path.display());
        }
        Ok(decoded)
    }

    fn store(&self, identity: &str, description: &HardwareDescription) -> Result<(), CacheError> {
        let path = self.entry_path(identity)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let payload = bincode::serde::encode_to_vec(description, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            silica_version: self.silica_version.clone(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        // Write then rename so readers never observe a partial entry.
        let partial = path.with_extension("partial");
        std::fs::write(&partial, &output).map_err(|e| CacheError::Io {
            path: partial.clone(),
            source: e,
        })?;
        std::fs::rename(&partial, &path).map_err(|e| CacheError::Io { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::description;

    #[test]
    fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&dir.path().join("cache"));
        assert_eq!(store.load("abc123").unwrap(), None);
        store.store("abc123", &description("abc123")).unwrap();
        assert_eq!(store.load("abc123").unwrap(), Some(description("abc123")));
    }

    #[test]
    fn corrupt_payload_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.store("abc", &description("abc")).unwrap();
        let path = store.entry_path("abc").unwrap();
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        std::fs::write(&path, raw).unwrap();
        assert_eq!(store.load("abc").unwrap(), None);
    }

    #[test]
    fn truncated_and_foreign_files_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let path = store.entry_path("abc").unwrap();
        std::fs::write(&path, [1u8, 0]).unwrap();
        assert_eq!(store.load("abc").unwrap(), None);
        std::fs::write(&path, b"\x04\x00\x00\x00garbage bytes").unwrap();
        assert_eq!(store.load("abc").unwrap(), None);
    }

    #[test]
    fn other_version_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileStore {
            dir: dir.path().to_path_buf(),
            silica_version: "0.0.0-old".into(),
        };
        writer.store("abc", &description("abc")).unwrap();
        assert_eq!(FileStore::new(dir.path()).load("abc").unwrap(), None);
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let store = FileStore::new(Path::new("/tmp"));
        assert!(matches!(
            store.load("../x"),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(store.store("", &description("x")).is_err());
    }
}
