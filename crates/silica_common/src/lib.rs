//! Shared foundational types used across the silica hardware generator.
//!
//! This crate provides content hashing for transformation identities, clock
//! frequency values, cooperative cancellation, and the internal-error result
//! type that signals implementation defects.

#![warn(missing_docs)]

pub mod cancel;
pub mod frequency;
pub mod hash;
pub mod result;

pub use cancel::CancellationToken;
pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::{ContentHash, ContentHasher};
pub use result::{InternalError, SilicaResult};
