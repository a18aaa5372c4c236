//! Edge erosion, softening and colour fading
//!
//! Each fragment is degraded independently in three steps:
//! 1. With the configured probability its opacity mask is eroded by a square
//!    structuring element rotated to a random angle, sized from the fragment's
//!    own opaque area, which chips the outline irregularly.
//! 2. The mask is always box-blurred and the softened mask limits the alpha
//!    channel, so edges fray instead of ending on a hard step. Pixels left at
//!    zero opacity become fully transparent.
//! 3. Saturation and value are scaled down by random factors; hue is kept.
//!
//! Opacity only ever decreases. Fragments are processed in parallel, each
//! with its own random stream derived from a single batch seed and the
//! fragment index.

use crate::fragment::Fragment;
use crate::io::configuration::{MAX_EROSION_KERNEL, SATURATION_FADE_RANGE, VALUE_FADE_RANGE};
use crate::io::error::{Result, invalid_parameter};
use crate::math::color::fade;
use crate::math::random::substream;
use bitvec::prelude::*;
use image::{Rgba, RgbaImage};
use ndarray::Array2;
use rand::Rng;
use rayon::prelude::*;

/// Degradation settings shared by a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErosionParameters {
    /// Minimum site separation; half of it bounds the blur size from below
    pub min_distance: u32,
    /// Chance in `[0, 1]` that a fragment gets chipped
    pub probability: f64,
    /// Chip size as a percentage of the fragment's opaque extent
    pub percentage: f64,
}

impl ErosionParameters {
    /// Check the probability and percentage ranges
    ///
    /// # Errors
    ///
    /// Returns an error naming the first parameter out of range
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(invalid_parameter(
                "erosion_probability",
                &self.probability,
                &"must be within [0, 1]",
            ));
        }
        if !(0.0..=100.0).contains(&self.percentage) {
            return Err(invalid_parameter(
                "erosion_percentage",
                &self.percentage,
                &"must be within [0, 100]",
            ));
        }
        Ok(())
    }
}

/// Read-only measurements of the whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStatistics {
    /// Largest width or height among all fragments
    pub largest_dimension: u32,
}

impl BatchStatistics {
    /// Measure a batch of fragments
    pub fn measure(fragments: &[Fragment]) -> Self {
        let largest_dimension = fragments
            .iter()
            .map(|f| {
                let (w, h) = f.dimensions();
                w.max(h)
            })
            .max()
            .unwrap_or(1);
        Self { largest_dimension }
    }

    /// Inclusive range of blur kernel sizes for this batch
    pub fn blur_range(&self, min_distance: u32) -> (usize, usize) {
        let low = (min_distance / 2).max(1) as usize;
        let high = (self.largest_dimension / 2) as usize;
        (low, high.max(low))
    }
}

/// Erode, soften and fade every fragment of a batch
///
/// # Errors
///
/// Returns an error if the parameters are out of range
pub fn erode_fragments<R: Rng + ?Sized>(
    fragments: Vec<Fragment>,
    parameters: &ErosionParameters,
    rng: &mut R,
) -> Result<Vec<Fragment>> {
    parameters.validate()?;
    let statistics = BatchStatistics::measure(&fragments);
    let batch_seed: u64 = rng.random();

    Ok(fragments
        .into_par_iter()
        .enumerate()
        .map(|(index, fragment)| {
            let mut stream = substream(batch_seed, index);
            erode_fragment(fragment, parameters, &statistics, &mut stream)
        })
        .collect())
}

/// Degrade a single fragment
pub fn erode_fragment<R: Rng + ?Sized>(
    mut fragment: Fragment,
    parameters: &ErosionParameters,
    statistics: &BatchStatistics,
    rng: &mut R,
) -> Fragment {
    let mut mask = alpha_mask(&fragment.pixels);

    let draw: f64 = rng.random();
    if draw >= 1.0 - parameters.probability {
        let opaque = mask.iter().filter(|&&a| a != 0).count();
        let size = chip_size(opaque, parameters.percentage);
        let angle = rng.random_range(0.0..360.0);
        if size > 1 {
            let element = StructuringElement::rotated_square(size, angle);
            mask = element.erode(&mask);
        }
    }

    let (low, high) = statistics.blur_range(parameters.min_distance);
    let blur_size = rng.random_range(low..=high);
    let softened = box_blur(&mask, blur_size);

    let saturation = rng.random_range(SATURATION_FADE_RANGE.0..=SATURATION_FADE_RANGE.1);
    let value = rng.random_range(VALUE_FADE_RANGE.0..=VALUE_FADE_RANGE.1);

    for (x, y, pixel) in fragment.pixels.enumerate_pixels_mut() {
        let index = (y as usize, x as usize);
        let kept = mask.get(index).copied().unwrap_or(0);
        let soft = softened.get(index).copied().unwrap_or(0);
        let alpha = kept.min(soft).min(pixel.0[3]);

        *pixel = if alpha == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            let [r, g, b] = fade([pixel.0[0], pixel.0[1], pixel.0[2]], saturation, value);
            Rgba([r, g, b, alpha])
        };
    }

    fragment
}

/// Side of the chipping element: `⌊√opaque · percentage / 100⌋`, capped
pub fn chip_size(opaque_pixels: usize, percentage: f64) -> usize {
    let size = ((opaque_pixels as f64).sqrt() * percentage / 100.0).floor();
    (size.max(0.0) as usize).min(MAX_EROSION_KERNEL)
}

/// Alpha channel as a `[row, col]` grid
pub fn alpha_mask(pixels: &RgbaImage) -> Array2<u8> {
    let (width, height) = pixels.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        pixels
            .get_pixel_checked(col as u32, row as u32)
            .map_or(0, |p| p.0[3])
    })
}

/// Square of `size`×`size` cells rotated about its centre cell
///
/// Cells whose centres fall inside the rotated square are set; corners
/// that rotate out of the box are dropped.
#[derive(Clone, Debug)]
pub struct StructuringElement {
    bits: BitVec,
    size: usize,
}

impl StructuringElement {
    /// Build a rotated square element; `size` is clamped to at least one
    pub fn rotated_square(size: usize, degrees: f64) -> Self {
        let size = size.max(1);
        let anchor = (size / 2) as f64;
        let (sin, cos) = degrees.to_radians().sin_cos();
        // Square extent around the anchor, half a cell of slack either side
        let low = -anchor - 0.5;
        let high = (size - 1) as f64 - anchor + 0.5;

        let mut bits = bitvec![0; size * size];
        for row in 0..size {
            for col in 0..size {
                let px = col as f64 - anchor;
                let py = row as f64 - anchor;
                let rx = px.mul_add(cos, py * sin);
                let ry = py.mul_add(cos, -(px * sin));
                if (low..=high).contains(&rx) && (low..=high).contains(&ry) {
                    bits.set(row * size + col, true);
                }
            }
        }

        Self { bits, size }
    }

    /// Side length in cells
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Test whether the cell at `(row, col)` is part of the element
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size
            && col < self.size
            && self.bits.get(row * self.size + col).as_deref() == Some(&true)
    }

    /// Number of set cells
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Offsets of the set cells relative to the anchor cell
    fn offsets(&self) -> Vec<(isize, isize)> {
        let anchor = (self.size / 2) as isize;
        self.bits
            .iter_ones()
            .map(|i| {
                (
                    (i / self.size) as isize - anchor,
                    (i % self.size) as isize - anchor,
                )
            })
            .collect()
    }

    /// Grayscale erosion: each cell takes the minimum under the element
    ///
    /// Neighbours outside the grid are ignored.
    pub fn erode(&self, mask: &Array2<u8>) -> Array2<u8> {
        let offsets = self.offsets();
        let (rows, cols) = mask.dim();

        Array2::from_shape_fn((rows, cols), |(row, col)| {
            let current = mask.get((row, col)).copied().unwrap_or(0);
            if current == 0 {
                return 0;
            }
            offsets
                .iter()
                .filter_map(|&(dr, dc)| {
                    let r = row.checked_add_signed(dr)?;
                    let c = col.checked_add_signed(dc)?;
                    mask.get((r, c)).copied()
                })
                .min()
                .unwrap_or(current)
        })
    }
}

/// Mean filter over a `size`×`size` window anchored at its centre
///
/// Windows are clipped at the grid border and averaged over the cells they
/// still cover. Runs in linear time through a summed-area table.
pub fn box_blur(mask: &Array2<u8>, size: usize) -> Array2<u8> {
    let (rows, cols) = mask.dim();
    if size <= 1 || rows == 0 || cols == 0 {
        return mask.clone();
    }

    // integral[(r, c)] holds the sum of mask[..r, ..c]
    let mut integral = Array2::<u64>::zeros((rows + 1, cols + 1));
    for row in 0..rows {
        let mut row_sum = 0u64;
        for col in 0..cols {
            row_sum += u64::from(mask.get((row, col)).copied().unwrap_or(0));
            let above = integral.get((row, col + 1)).copied().unwrap_or(0);
            if let Some(cell) = integral.get_mut((row + 1, col + 1)) {
                *cell = above + row_sum;
            }
        }
    }
    let sum_at = |r: usize, c: usize| integral.get((r, c)).copied().unwrap_or(0);

    let before = size / 2;
    let after = size - before;
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let top = row.saturating_sub(before);
        let left = col.saturating_sub(before);
        let bottom = (row + after).min(rows);
        let right = (col + after).min(cols);

        let total = sum_at(bottom, right) + sum_at(top, left)
            - sum_at(top, right)
            - sum_at(bottom, left);
        let area = ((bottom - top) * (right - left)) as u64;
        (total as f64 / area as f64).round() as u8
    })
}
