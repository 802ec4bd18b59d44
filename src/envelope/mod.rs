//! Envelope normalization layer.
//!
//! Converts arbitrary upstream payloads into canonical, casing-independent
//! [`NormalizedRecord`]s before any section-specific assembly happens.

pub mod aliases;
pub mod errors;
pub mod normalizer;

pub use errors::EnvelopeError;
pub use normalizer::{normalize, try_normalize, NormalizedRecord};
