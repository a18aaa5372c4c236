//! Mathematical utilities for the fragmentation pipeline

/// Colour space conversions used by fragment degradation
pub mod color;
/// Seeded random streams shared by every pipeline stage
pub mod random;
