//! Hardware description cache.
//!
//! A [`CacheStore`] persists [`HardwareDescription`]s keyed by transformation
//! identity; [`MemoryStore`] and [`FileStore`] are provided. On top of a
//! store, [`HardwareCache`] collapses concurrent requests for the same
//! identity into one computation. Store failures are never fatal: they are
//! logged and treated as a miss.
//!
//! [`HardwareDescription`]: silica_ir::HardwareDescription

#![warn(missing_docs)]

pub mod error;
pub mod file;
pub mod flight;
pub mod store;

pub use error::CacheError;
pub use file::FileStore;
pub use flight::HardwareCache;
pub use store::{CacheStore, MemoryStore};
