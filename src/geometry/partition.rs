//! Nearest-site pixel partitioning
//!
//! Every pixel of the grid is assigned to the site at the smallest Euclidean
//! distance; among equally distant sites the one earliest in the site list
//! wins. Distances are compared as exact integer squares so ties are real
//! ties. The bucketed search below must agree pixel for pixel with
//! [`Partition::compute_brute_force`], which states the rule directly.

use crate::geometry::point::Point;
use crate::geometry::sites::{Site, SiteId, squared_distance};
use crate::io::error::{Result, computation_error, invalid_parameter};
use ndarray::Array2;
use rayon::prelude::*;

/// Inclusive pixel bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    /// Top-left corner (inclusive)
    pub min: Point<u32>,
    /// Bottom-right corner (inclusive)
    pub max: Point<u32>,
}

impl PixelBounds {
    /// Bounds containing a single pixel
    pub const fn from_point(point: Point<u32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Grow the bounds to contain `point`
    pub fn include(&mut self, point: Point<u32>) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest bounds containing both boxes
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Number of columns covered
    pub const fn width(&self) -> u32 {
        self.max.x - self.min.x + 1
    }

    /// Number of rows covered
    pub const fn height(&self) -> u32 {
        self.max.y - self.min.y + 1
    }
}

/// Assignment of every pixel to exactly one site
#[derive(Debug, Clone)]
pub struct Partition {
    /// Owning site index per pixel, indexed `[row, col]`
    labels: Array2<u32>,
    /// Member pixels per site in row-major order
    cells: Vec<Vec<Point<u32>>>,
    /// Tight bounds per site, `None` for a site that owns no pixel
    bounds: Vec<Option<PixelBounds>>,
}

impl Partition {
    /// Partition the grid using a bucketed nearest-site search
    ///
    /// Rows are classified in parallel and collected in row order.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no sites, a site lies outside the grid,
    /// or the label buffer cannot be shaped to the grid
    pub fn compute(sites: &[Site], width: u32, height: u32) -> Result<Self> {
        validate_sites(sites, width, height)?;
        let buckets = SiteBuckets::new(sites, width, height);

        let rows: Vec<Vec<u32>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| buckets.nearest(Point::new(x, y)))
                    .collect()
            })
            .collect();

        Self::from_rows(rows, sites.len(), width, height)
    }

    /// Partition the grid by comparing every pixel against every site
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Partition::compute`]
    pub fn compute_brute_force(sites: &[Site], width: u32, height: u32) -> Result<Self> {
        validate_sites(sites, width, height)?;

        let rows: Vec<Vec<u32>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| nearest_brute_force(sites, Point::new(x, y)))
                    .collect()
            })
            .collect();

        Self::from_rows(rows, sites.len(), width, height)
    }

    fn from_rows(rows: Vec<Vec<u32>>, site_count: usize, width: u32, height: u32) -> Result<Self> {
        let flat: Vec<u32> = rows.into_iter().flatten().collect();
        let labels = Array2::from_shape_vec((height as usize, width as usize), flat)
            .map_err(|e| computation_error("partition", &e))?;

        let mut cells: Vec<Vec<Point<u32>>> = vec![Vec::new(); site_count];
        let mut bounds: Vec<Option<PixelBounds>> = vec![None; site_count];

        for ((row, col), &label) in labels.indexed_iter() {
            let pixel = Point::new(col as u32, row as u32);
            if let Some(cell) = cells.get_mut(label as usize) {
                cell.push(pixel);
            }
            if let Some(slot) = bounds.get_mut(label as usize) {
                match slot {
                    Some(b) => b.include(pixel),
                    None => *slot = Some(PixelBounds::from_point(pixel)),
                }
            }
        }

        Ok(Self {
            labels,
            cells,
            bounds,
        })
    }

    /// Grid width in pixels
    pub fn width(&self) -> u32 {
        self.labels.ncols() as u32
    }

    /// Grid height in pixels
    pub fn height(&self) -> u32 {
        self.labels.nrows() as u32
    }

    /// Number of sites (including any that own no pixel)
    pub fn site_count(&self) -> usize {
        self.cells.len()
    }

    /// Site owning the pixel at `(x, y)`
    pub fn owner(&self, x: u32, y: u32) -> Option<SiteId> {
        self.labels
            .get((y as usize, x as usize))
            .map(|&label| SiteId(label as usize))
    }

    /// Member pixels of a site's cell in row-major order
    pub fn cell(&self, site: SiteId) -> &[Point<u32>] {
        self.cells.get(site.index()).map_or(&[], Vec::as_slice)
    }

    /// Tight inclusive bounding box of a site's cell
    pub fn bounds(&self, site: SiteId) -> Option<PixelBounds> {
        self.bounds.get(site.index()).copied().flatten()
    }

    /// Raw label grid, indexed `[row, col]`
    pub const fn labels(&self) -> &Array2<u32> {
        &self.labels
    }
}

fn validate_sites(sites: &[Site], width: u32, height: u32) -> Result<()> {
    if sites.is_empty() {
        return Err(invalid_parameter(
            "sites",
            &0,
            &"at least one site is required",
        ));
    }
    if u32::try_from(sites.len()).is_err() {
        return Err(invalid_parameter(
            "sites",
            &sites.len(),
            &"too many sites for the label grid",
        ));
    }
    if let Some(outside) = sites
        .iter()
        .find(|s| s.position.x >= width || s.position.y >= height)
    {
        return Err(invalid_parameter(
            "sites",
            &outside.position,
            &format!("lies outside the {width}x{height} grid"),
        ));
    }
    Ok(())
}

/// First site in list order among those nearest to `pixel`
fn nearest_brute_force(sites: &[Site], pixel: Point<u32>) -> u32 {
    let mut best_index = 0;
    let mut best_distance = u64::MAX;
    for (index, site) in sites.iter().enumerate() {
        let distance = squared_distance(site.position, pixel);
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index as u32
}

/// Uniform grid of buckets holding site indices in ascending order
struct SiteBuckets<'a> {
    sites: &'a [Site],
    bucket_size: u32,
    cols: u32,
    rows: u32,
    buckets: Vec<Vec<usize>>,
}

impl<'a> SiteBuckets<'a> {
    fn new(sites: &'a [Site], width: u32, height: u32) -> Self {
        // About one site per bucket
        let area = f64::from(width) * f64::from(height);
        let bucket_size = (area / sites.len() as f64).sqrt().ceil().max(1.0) as u32;
        let cols = width.div_ceil(bucket_size);
        let rows = height.div_ceil(bucket_size);

        let mut buckets = vec![Vec::new(); (cols as usize) * (rows as usize)];
        for (index, site) in sites.iter().enumerate() {
            let slot = (site.position.y / bucket_size) as usize * cols as usize
                + (site.position.x / bucket_size) as usize;
            if let Some(bucket) = buckets.get_mut(slot) {
                bucket.push(index);
            }
        }

        Self {
            sites,
            bucket_size,
            cols,
            rows,
            buckets,
        }
    }

    /// Nearest site, scanning square rings of buckets outwards
    fn nearest(&self, pixel: Point<u32>) -> u32 {
        let bx = i64::from(pixel.x / self.bucket_size);
        let by = i64::from(pixel.y / self.bucket_size);
        let max_ring = i64::from(self.cols.max(self.rows));

        // Compared as (distance, index) so equal distances keep list order
        let mut best: Option<(u64, usize)> = None;

        for ring in 0..=max_ring {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    for &index in self.bucket(bx + dx, by + dy) {
                        let Some(site) = self.sites.get(index) else {
                            continue;
                        };
                        let candidate = (squared_distance(site.position, pixel), index);
                        if best.is_none_or(|current| candidate < current) {
                            best = Some(candidate);
                        }
                    }
                }
            }

            if let Some((distance, _)) = best {
                match self.clearance(pixel, bx, by, ring) {
                    Some(clear) if distance >= clear * clear => {}
                    _ => break,
                }
            }
        }

        best.map_or(0, |(_, index)| index as u32)
    }

    fn bucket(&self, bx: i64, by: i64) -> &[usize] {
        if bx < 0 || by < 0 || bx >= i64::from(self.cols) || by >= i64::from(self.rows) {
            return &[];
        }
        let slot = by as usize * self.cols as usize + bx as usize;
        self.buckets.get(slot).map_or(&[], Vec::as_slice)
    }

    /// Lower bound on the distance from `pixel` to any site outside the
    /// square of buckets within `ring` of `(bx, by)`; `None` once that square
    /// covers the whole grid
    fn clearance(&self, pixel: Point<u32>, bx: i64, by: i64, ring: i64) -> Option<u64> {
        let size = i64::from(self.bucket_size);
        let (x, y) = (i64::from(pixel.x), i64::from(pixel.y));
        let mut bound: Option<i64> = None;
        let mut tighten = |gap: i64| bound = Some(bound.map_or(gap, |b| b.min(gap)));

        if bx - ring > 0 {
            tighten(x - (bx - ring) * size + 1);
        }
        if bx + ring + 1 < i64::from(self.cols) {
            tighten((bx + ring + 1) * size - x);
        }
        if by - ring > 0 {
            tighten(y - (by - ring) * size + 1);
        }
        if by + ring + 1 < i64::from(self.rows) {
            tighten((by + ring + 1) * size - y);
        }

        bound.map(|gap| gap.max(0) as u64)
    }
}
