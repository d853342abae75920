//! Device timing model.
//!
//! Each supported device ships a timing report: latency in nanoseconds per
//! operator and operand shape, optionally specialized for a constant right
//! operand. The [`TimingModel`] combines a device's report with its clock to
//! answer "how many clock cycles does this operation take".

#![warn(missing_docs)]

pub mod device;
pub mod error;
pub mod model;
pub mod operator;
pub mod report;

pub use device::{find_device, DeviceDescriptor, DeviceManifest, DEVICES};
pub use error::TimingError;
pub use model::{latency_to_cycles, TimingModel, ZERO_LATENCY_CYCLES};
pub use operator::Operator;
pub use report::{TimingKey, TimingReport};
