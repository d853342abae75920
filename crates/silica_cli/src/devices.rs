//! `silica devices`: prints the device catalog.

use silica_timing::{DeviceDescriptor, TimingReport, DEVICES};

/// Lists every built-in device with its default clock and channels.
pub fn run() -> Result<i32, Box<dyn std::error::Error>> {
    for device in DEVICES {
        println!("{}", describe(device)?);
    }
    Ok(0)
}

fn describe(device: &DeviceDescriptor) -> Result<String, Box<dyn std::error::Error>> {
    let entries = TimingReport::parse(device.timing_report)?.len();
    Ok(format!(
        "{:<16} {:>7.1} MHz  {:<12} {:>6} MiB  {entries} timing entries",
        device.name,
        device.clock_hz / 1e6,
        device.channels.join(", "),
        device.memory_bytes / (1024 * 1024),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_device_renders() {
        for device in DEVICES {
            let line = describe(device).unwrap();
            assert!(line.starts_with(device.name));
            assert!(line.contains("MHz"));
        }
    }

    #[test]
    fn nexys_line_shows_clock() {
        let line = describe(&DEVICES[0]).unwrap();
        assert!(line.contains("100.0 MHz"));
        assert!(line.contains("Serial"));
    }
}
