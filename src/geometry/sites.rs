//! Seed site generation by rejection sampling
//!
//! Sites are drawn uniformly over the pixel grid and kept only when they lie
//! at least twice the minimum distance away from every site accepted so far.
//! The accepted list is immutable afterwards; its order defines site ids and
//! the tie-break order of the partition.

use crate::geometry::point::Point;
use crate::io::configuration::SITE_REJECTION_LIMIT;
use crate::io::error::{FragmentationError, Result, invalid_parameter};
use rand::Rng;
use std::fmt;

/// Index of a site in the accepted site list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub usize);

impl SiteId {
    /// Position of the site in the site list
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site#{}", self.0)
    }
}

/// A Voronoi seed point with its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    /// Identifier, equal to the position in the site list
    pub id: SiteId,
    /// Pixel coordinate of the seed
    pub position: Point<u32>,
}

/// Site count used when none is configured: `⌊√(width·height)⌋`
pub fn default_site_count(width: u32, height: u32) -> usize {
    (f64::from(width) * f64::from(height)).sqrt().floor() as usize
}

/// Generate mutually separated sites inside a `width`×`height` grid
///
/// Every pair of returned sites is at least `2 * min_distance` apart and no
/// two sites share a pixel. Coordinates are drawn x first, then y, so the
/// same generator state always yields the same site sequence.
///
/// # Errors
///
/// Returns an error if:
/// - The grid is empty or `count` is zero
/// - `count` exceeds the number of pixels
/// - [`SITE_REJECTION_LIMIT`] consecutive draws are rejected, which means the
///   requested count does not fit at this separation
pub fn generate_sites<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    count: Option<usize>,
    min_distance: u32,
    rng: &mut R,
) -> Result<Vec<Site>> {
    if width == 0 || height == 0 {
        return Err(invalid_parameter(
            "image",
            &format!("{width}x{height}"),
            &"image must contain at least one pixel",
        ));
    }

    let count = count.unwrap_or_else(|| default_site_count(width, height));
    if count == 0 {
        return Err(invalid_parameter(
            "num_fragments",
            &count,
            &"at least one fragment is required",
        ));
    }
    if count as u64 > u64::from(width) * u64::from(height) {
        return Err(invalid_parameter(
            "num_fragments",
            &count,
            &format!("exceeds the {width}x{height} pixel count"),
        ));
    }

    let separation = 2 * u64::from(min_distance);
    let min_distance_squared = (separation * separation).max(1);

    let mut sites: Vec<Site> = Vec::with_capacity(count);
    let mut rejections = 0usize;

    while sites.len() < count {
        let candidate = Point::new(rng.random_range(0..width), rng.random_range(0..height));

        let separated = sites
            .iter()
            .all(|site| squared_distance(site.position, candidate) >= min_distance_squared);

        if separated {
            sites.push(Site {
                id: SiteId(sites.len()),
                position: candidate,
            });
            rejections = 0;
        } else {
            rejections += 1;
            if rejections >= SITE_REJECTION_LIMIT {
                return Err(FragmentationError::InfeasibleSites {
                    requested: count,
                    accepted: sites.len(),
                    width,
                    height,
                    min_distance,
                });
            }
        }
    }

    Ok(sites)
}

/// Exact squared distance between two pixel coordinates
pub fn squared_distance(a: Point<u32>, b: Point<u32>) -> u64 {
    let dx = u64::from(a.x.abs_diff(b.x));
    let dy = u64::from(a.y.abs_diff(b.y));
    dx * dx + dy * dy
}
