//! Fragment construction and degradation stages
//!
//! Stages run in this order, each consuming the whole output of the
//! previous one:
//! - Extraction of one fragment per partition cell
//! - Combination of nearby fragment pairs
//! - Random removal
//! - Erosion and colour fading
//! - Free rotation

/// Pairwise fusion of neighbouring fragments
pub mod combination;
/// Edge erosion, softening and colour fading
pub mod erosion;
/// Per-cell fragment extraction
pub mod extraction;
/// Random discarding of fragments
pub mod removal;
/// Rotation with placement correction
pub mod rotation;

use crate::geometry::{Point, SiteId};
use image::RgbaImage;

/// An image piece plus the metadata needed to put it back
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Partition cells this fragment is made of, ascending
    pub cells: Vec<SiteId>,
    /// Logical position: the site, or the midpoint of merged sites
    pub anchor: Point<f64>,
    /// Top-left of the pixel buffer in source image coordinates
    pub offset: Point<i64>,
    /// RGBA pixels, transparent outside the owning cells
    pub pixels: RgbaImage,
    /// Rotation applied to `pixels`, degrees in `[0, 360)`
    pub rotation: f64,
}

impl Fragment {
    /// Buffer dimensions `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Number of pixels with nonzero alpha
    pub fn opaque_pixel_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[3] != 0).count()
    }

    /// Whether the fragment was fused from more than one cell
    pub fn is_combined(&self) -> bool {
        self.cells.len() > 1
    }
}
