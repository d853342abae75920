//! Built-in device catalog.

use serde::{Deserialize, Serialize};
use silica_common::Frequency;

/// Static description of a supported device.
#[derive(Debug)]
pub struct DeviceDescriptor {
    /// Catalog name, matched case-insensitively against the configuration.
    pub name: &'static str,
    /// Default clock in hertz.
    pub clock_hz: f64,
    /// Communication channels the device can be driven through.
    pub channels: &'static [&'static str],
    /// Memory available to generated hardware, in bytes.
    pub memory_bytes: u64,
    /// Bundled timing report text.
    pub timing_report: &'static str,
}

/// Known devices.
pub const DEVICES: &[DeviceDescriptor] = &[
    DeviceDescriptor {
        name: "Nexys A7-100T",
        clock_hz: 100_000_000.0,
        channels: &["Serial"],
        memory_bytes: 134_217_728,
        timing_report: include_str!("../data/nexys_a7.csv"),
    },
    DeviceDescriptor {
        name: "Alveo U250",
        clock_hz: 300_000_000.0,
        channels: &["PCIe"],
        memory_bytes: 68_719_476_736,
        timing_report: include_str!("../data/alveo_u250.csv"),
    },
    DeviceDescriptor {
        name: "Zynq-7020",
        clock_hz: 100_000_000.0,
        channels: &["AXI", "Serial"],
        memory_bytes: 536_870_912,
        timing_report: include_str!("../data/zynq_7020.csv"),
    },
];

/// Looks a device up by name, ignoring ASCII case.
pub fn find_device(name: &str) -> Option<&'static DeviceDescriptor> {
    DEVICES
        .iter()
        .find(|d| d.name.eq_ignore_ascii_case(name.trim()))
}

/// The device facts that travel with generated hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceManifest {
    /// Device name.
    pub name: String,
    /// Effective clock, after any configured override.
    pub clock: Frequency,
    /// Supported communication channels.
    pub channels: Vec<String>,
    /// Memory budget in bytes.
    pub memory_bytes: u64,
}

impl DeviceManifest {
    /// Builds the manifest of `descriptor` running at `clock`.
    pub fn new(descriptor: &DeviceDescriptor, clock: Frequency) -> Self {
        Self {
            name: descriptor.name.to_string(),
            clock,
            channels: descriptor.channels.iter().map(|c| c.to_string()).collect(),
            memory_bytes: descriptor.memory_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TimingReport;

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find_device("nexys a7-100t").unwrap().name, "Nexys A7-100T");
        assert!(find_device("Cyclone 10").is_none());
    }

    #[test]
    fn bundled_reports_parse() {
        for device in DEVICES {
            let report = TimingReport::parse(device.timing_report).unwrap();
            assert!(report.len() > 100, "{} report too small", device.name);
        }
    }

    #[test]
    fn manifest_copies_descriptor() {
        let descriptor = find_device("Zynq-7020").unwrap();
        let manifest = DeviceManifest::new(descriptor, Frequency::new(150_000_000.0));
        assert_eq!(manifest.channels, vec!["AXI", "Serial"]);
        assert_eq!(manifest.clock.hz(), 150_000_000.0);
    }
}
