//! Pairwise fusion of neighbouring fragments
//!
//! A random subset of fragments is taken out of the pool; each one is then
//! fused with the nearest fragment still left in the pool (by anchor
//! distance). Fused fragments are re-rendered from the partition over the
//! union of both bounding boxes, so every pixel of both cells keeps its
//! source position. No fragment takes part in more than one fusion.

use crate::fragment::Fragment;
use crate::fragment::extraction::render_cells;
use crate::geometry::{Partition, Point};
use crate::geometry::partition::PixelBounds;
use crate::io::error::{Result, computation_error, invalid_parameter};
use image::RgbaImage;
use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index::sample;
use tracing::debug;

/// Largest fusion count drawn for `fragment_count` fragments: `⌊√N⌋`,
/// capped so that every selected fragment can find a partner
pub fn max_combination_count(fragment_count: usize) -> usize {
    fragment_count.isqrt().min(fragment_count / 2)
}

/// Draw a fusion count uniformly from `[1, max_combination_count]`
///
/// Returns zero when there are too few fragments to fuse any pair.
pub fn draw_combination_count<R: Rng + ?Sized>(fragment_count: usize, rng: &mut R) -> usize {
    let upper = max_combination_count(fragment_count);
    if upper == 0 {
        0
    } else {
        rng.random_range(1..=upper)
    }
}

/// Fuse `count` fragment pairs, returning `N − count` shuffled fragments
///
/// # Errors
///
/// Returns an error if:
/// - `count` pairs cannot be formed from the available fragments
/// - A fragment references a cell missing from the partition
pub fn combine_fragments<R: Rng + ?Sized>(
    fragments: Vec<Fragment>,
    partition: &Partition,
    source: &RgbaImage,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Fragment>> {
    if count.saturating_mul(2) > fragments.len() {
        return Err(invalid_parameter(
            "combined_fragments",
            &count,
            &format!("cannot form that many pairs from {} fragments", fragments.len()),
        ));
    }

    let selected_indices = sample(rng, fragments.len(), count).into_vec();
    let mut slots: Vec<Option<Fragment>> = fragments.into_iter().map(Some).collect();
    let selected: Vec<Fragment> = selected_indices
        .iter()
        .filter_map(|&index| slots.get_mut(index).and_then(Option::take))
        .collect();
    let mut pool: Vec<Fragment> = slots.into_iter().flatten().collect();

    let mut fused = Vec::with_capacity(count);
    for fragment in selected {
        let Some(partner_index) = nearest_in_pool(&fragment, &pool) else {
            return Err(computation_error(
                "combination",
                &"partner pool exhausted before all pairs were formed",
            ));
        };
        let partner = pool.remove(partner_index);
        debug!(
            anchor = %fragment.anchor,
            partner = %partner.anchor,
            "fusing fragments"
        );
        fused.push(fuse(&fragment, &partner, partition, source)?);
    }

    pool.extend(fused);
    // Positional order must not reveal which fragments were fused
    pool.shuffle(rng);
    Ok(pool)
}

/// Index of the pool fragment whose anchor is closest; first wins on ties
fn nearest_in_pool(fragment: &Fragment, pool: &[Fragment]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in pool.iter().enumerate() {
        let distance = fragment.anchor.distance(candidate.anchor);
        if best.is_none_or(|(_, current)| distance < current) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Merge two fragments into one covering the union of their bounding boxes
///
/// # Errors
///
/// Returns an error if either fragment references a cell without pixels
pub fn fuse(
    first: &Fragment,
    second: &Fragment,
    partition: &Partition,
    source: &RgbaImage,
) -> Result<Fragment> {
    let mut cells: Vec<_> = first.cells.iter().chain(&second.cells).copied().collect();
    cells.sort_unstable();
    cells.dedup();

    let mut bounds: Option<PixelBounds> = None;
    for &cell in &cells {
        let cell_bounds = partition.bounds(cell).ok_or_else(|| {
            computation_error("combination", &format!("{cell} has no pixels"))
        })?;
        bounds = Some(bounds.map_or(cell_bounds, |b| b.union(cell_bounds)));
    }
    let bounds =
        bounds.ok_or_else(|| computation_error("combination", &"fragments have no cells"))?;

    Ok(Fragment {
        pixels: render_cells(partition, &cells, source, bounds),
        cells,
        anchor: first.anchor.midpoint(second.anchor),
        offset: Point::new(i64::from(bounds.min.x), i64::from(bounds.min.y)),
        rotation: 0.0,
    })
}
