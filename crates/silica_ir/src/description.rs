//! The unit returned by a transformation and stored in the cache.

use crate::manifest::TransformedManifest;
use serde::{Deserialize, Serialize};
use silica_timing::DeviceManifest;

/// VHDL source plus the manifest it was rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareDescription {
    /// Transformation identity this description was produced for.
    pub identity: String,
    /// The VHDL source.
    pub source: String,
    /// The target device.
    pub device: DeviceManifest,
    /// Components, proxies and member ids.
    pub manifest: TransformedManifest,
}

impl HardwareDescription {
    /// Returns the member-id table.
    pub fn member_ids(&self) -> &crate::MemberIdTable {
        &self.manifest.member_ids
    }
}
