//! Planar geometry for fragmentation
//!
//! This module contains the spatial side of the pipeline:
//! - Generic points and distances
//! - Separated seed site generation
//! - Nearest-site pixel partitioning
//! - Bounding-box expanding raster rotation

/// Generic 2D points
pub mod point;
/// Pixel to nearest site assignment
pub mod partition;
/// Raster rotation with bounding box expansion
pub mod rotation;
/// Rejection-sampled seed sites
pub mod sites;

pub use partition::Partition;
pub use point::Point;
pub use sites::{Site, SiteId};
