//! Random discarding of fragments
//!
//! Simulates pieces lost from a find: `⌊N · percentage / 100⌋` fragments are
//! sampled uniformly without replacement and dropped. Survivors keep their
//! relative order.

use crate::fragment::Fragment;
use crate::io::error::{Result, invalid_parameter};
use rand::Rng;
use rand::seq::index::sample;

/// Number of fragments removed from a batch of `fragment_count`
pub fn removal_count(fragment_count: usize, percentage: f64) -> usize {
    let count = (fragment_count as f64 * percentage / 100.0).floor();
    (count.max(0.0) as usize).min(fragment_count)
}

/// Drop a random `percentage` of the fragments
///
/// # Errors
///
/// Returns an error if `percentage` is outside `[0, 100]`
pub fn remove_fragments<R: Rng + ?Sized>(
    fragments: Vec<Fragment>,
    percentage: f64,
    rng: &mut R,
) -> Result<Vec<Fragment>> {
    if !(0.0..=100.0).contains(&percentage) {
        return Err(invalid_parameter(
            "removal_percentage",
            &percentage,
            &"must be within [0, 100]",
        ));
    }

    let count = removal_count(fragments.len(), percentage);
    if count == 0 {
        return Ok(fragments);
    }

    let mut doomed = vec![false; fragments.len()];
    for index in sample(rng, fragments.len(), count).iter() {
        if let Some(flag) = doomed.get_mut(index) {
            *flag = true;
        }
    }

    Ok(fragments
        .into_iter()
        .zip(doomed)
        .filter_map(|(fragment, removed)| (!removed).then_some(fragment))
        .collect())
}
