//! Clock-cycle costing against a device.

use crate::device::{find_device, DeviceManifest};
use crate::error::TimingError;
use crate::operator::Operator;
use crate::report::TimingReport;
use silica_common::Frequency;
use silica_config::HardwareGenerationConfig;

/// Cycle cost charged for an operation whose latency is exactly zero.
pub const ZERO_LATENCY_CYCLES: f64 = 0.1;

/// Converts a latency to clock cycles at `clock_hz`.
///
/// Returns `None` for negative, infinite or non-numeric latencies. A latency
/// of zero costs [`ZERO_LATENCY_CYCLES`] so scheduling never sees a free
/// operation.
pub fn latency_to_cycles(latency_ns: f64, clock_hz: f64) -> Option<f64> {
    if !latency_ns.is_finite() || latency_ns < 0.0 {
        return None;
    }
    if latency_ns == 0.0 {
        return Some(ZERO_LATENCY_CYCLES);
    }
    Some(latency_ns * clock_hz / 1_000_000_000.0)
}

/// A device's timing report at a fixed clock.
#[derive(Debug, Clone)]
pub struct TimingModel {
    device: DeviceManifest,
    report: TimingReport,
}

impl TimingModel {
    /// Creates a model from parts.
    pub fn new(device: DeviceManifest, report: TimingReport) -> Self {
        Self { device, report }
    }

    /// Loads the configured device from the catalog, applying any clock
    /// override.
    pub fn for_config(config: &HardwareGenerationConfig) -> Result<Self, TimingError> {
        let descriptor = find_device(&config.device).ok_or_else(|| TimingError::UnknownDevice {
            device: config.device.clone(),
        })?;
        let clock = match &config.clock_frequency {
            Some(text) => text
                .parse::<Frequency>()
                .map_err(|e| TimingError::InvalidClock(e.to_string()))?,
            None => Frequency::new(descriptor.clock_hz),
        };
        let report = TimingReport::parse(descriptor.timing_report)?;
        log::debug!(
            "timing model for {} at {clock}: {} entries",
            descriptor.name,
            report.len()
        );
        Ok(Self::new(DeviceManifest::new(descriptor, clock), report))
    }

    /// The device this model describes.
    pub fn device(&self) -> &DeviceManifest {
        &self.device
    }

    /// The clock frequency.
    pub fn clock(&self) -> Frequency {
        self.device.clock
    }

    /// Returns the latency of an operation in nanoseconds.
    pub fn latency_ns(
        &self,
        operator: Operator,
        width: u16,
        signed: bool,
        constant_rhs: Option<i64>,
    ) -> Result<f64, TimingError> {
        self.report.latency_ns(operator, width, signed, constant_rhs)
    }

    /// Returns the cost of an operation in clock cycles.
    pub fn clock_cycles(
        &self,
        operator: Operator,
        width: u16,
        signed: bool,
        constant_rhs: Option<i64>,
    ) -> Result<f64, TimingError> {
        let latency_ns = self.latency_ns(operator, width, signed, constant_rhs)?;
        latency_to_cycles(latency_ns, self.clock().hz()).ok_or_else(|| {
            TimingError::InvalidLatency {
                operator: operator.to_string(),
                width,
                latency_ns,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TimingKey;

    fn model(entries: &[(Operator, f64)]) -> TimingModel {
        let mut report = TimingReport::default();
        for (operator, latency) in entries {
            report.insert(
                TimingKey {
                    operator: *operator,
                    width: 32,
                    signed: true,
                    constant_rhs: None,
                },
                *latency,
            );
        }
        let device = DeviceManifest {
            name: "test".into(),
            clock: Frequency::new(100_000_000.0),
            channels: vec![],
            memory_bytes: 0,
        };
        TimingModel::new(device, report)
    }

    #[test]
    fn ten_ns_at_100_mhz_is_one_cycle() {
        assert_eq!(latency_to_cycles(10.0, 100_000_000.0), Some(1.0));
        let m = model(&[(Operator::Add, 10.0)]);
        assert_eq!(m.clock_cycles(Operator::Add, 32, true, None).unwrap(), 1.0);
    }

    #[test]
    fn zero_latency_floors() {
        assert_eq!(latency_to_cycles(0.0, 100_000_000.0), Some(ZERO_LATENCY_CYCLES));
        let m = model(&[(Operator::Shl, 0.0)]);
        assert_eq!(m.clock_cycles(Operator::Shl, 32, true, None).unwrap(), 0.1);
    }

    #[test]
    fn negative_latency_is_error() {
        assert_eq!(latency_to_cycles(-1.0, 100_000_000.0), None);
        assert_eq!(latency_to_cycles(f64::NAN, 100_000_000.0), None);
        assert_eq!(latency_to_cycles(f64::INFINITY, 100_000_000.0), None);
        let m = model(&[(Operator::Mul, -3.0)]);
        assert!(matches!(
            m.clock_cycles(Operator::Mul, 32, true, None),
            Err(TimingError::InvalidLatency { .. })
        ));
    }

    #[test]
    fn infinite_latency_is_error() {
        let m = model(&[(Operator::Div, f64::INFINITY)]);
        assert!(matches!(
            m.clock_cycles(Operator::Div, 32, true, None),
            Err(TimingError::InvalidLatency { .. })
        ));
    }

    #[test]
    fn missing_entry_is_error() {
        let m = model(&[]);
        assert!(matches!(
            m.clock_cycles(Operator::Div, 32, true, None),
            Err(TimingError::MissingEntry { .. })
        ));
    }

    #[test]
    fn for_config_uses_catalog() {
        let config = HardwareGenerationConfig::new("Nexys A7-100T");
        let m = TimingModel::for_config(&config).unwrap();
        assert_eq!(m.clock().hz(), 100_000_000.0);
        // Constant power-of-two multiply is wiring only.
        assert_eq!(m.clock_cycles(Operator::Mul, 32, true, Some(4)).unwrap(), 0.1);
        assert!(m.clock_cycles(Operator::Mul, 32, true, None).unwrap() > 0.1);
    }

    #[test]
    fn clock_override() {
        let mut config = HardwareGenerationConfig::new("Nexys A7-100T");
        config.clock_frequency = Some("200MHz".into());
        let m = TimingModel::for_config(&config).unwrap();
        assert_eq!(m.clock().hz(), 200_000_000.0);
    }

    #[test]
    fn unknown_device() {
        let config = HardwareGenerationConfig::new("Nowhere 9000");
        assert_eq!(
            TimingModel::for_config(&config).unwrap_err(),
            TimingError::UnknownDevice {
                device: "Nowhere 9000".into()
            }
        );
    }
}
