//! Synthetic fragment datasets for image reassembly research
//!
//! An image is split into irregular pieces around randomly placed, mutually
//! separated sites. Some neighbouring pieces are fused, a share is thrown
//! away, and the rest are chipped, faded and rotated before being written
//! out with a ledger that records exactly where each piece belongs. The
//! ledger is enough to put every surviving piece back in place.

#![forbid(unsafe_code)]

/// Fragment extraction, combination, removal, erosion and rotation
pub mod fragment;
/// Points, sites, nearest-site partitioning and raster rotation
pub mod geometry;
/// Input/output operations and error handling
pub mod io;
/// Colour conversions and seeded random streams
pub mod math;
/// Stage sequencing and dataset reconstruction
pub mod pipeline;

pub use io::error::{FragmentationError, Result};
