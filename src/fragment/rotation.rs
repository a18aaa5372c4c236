//! Free rotation of fragments with placement correction
//!
//! Rotation grows the buffer to fit the turned footprint. The offset is moved
//! back by half the growth so that undoing the rotation and pasting at the
//! stored offset puts the fragment where it was.

use crate::fragment::Fragment;
use crate::geometry::rotation::{normalize_degrees, recentered_offset, rotate_expanded};
use rand::Rng;
use rayon::prelude::*;

/// Rotate a fragment by `degrees` and correct its offset
pub fn rotate_fragment(mut fragment: Fragment, degrees: f64) -> Fragment {
    let old_size = fragment.dimensions();
    fragment.pixels = rotate_expanded(&fragment.pixels, degrees);
    fragment.offset = recentered_offset(fragment.offset, old_size, fragment.dimensions());
    fragment.rotation = normalize_degrees(fragment.rotation + degrees);
    fragment
}

/// Draw one angle in `[0, 360)` per fragment, in batch order
pub fn draw_angles<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<f64> {
    (0..count).map(|_| rng.random_range(0.0..360.0)).collect()
}

/// Rotate each fragment by the angle at the same position
///
/// Fragments without a matching angle are left as they are.
pub fn rotate_fragments(fragments: Vec<Fragment>, angles: &[f64]) -> Vec<Fragment> {
    fragments
        .into_par_iter()
        .enumerate()
        .map(|(index, fragment)| match angles.get(index) {
            Some(&angle) => rotate_fragment(fragment, angle),
            None => fragment,
        })
        .collect()
}
