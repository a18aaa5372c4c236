//! Seeded random streams
//!
//! Each run owns one [`StdRng`]. Stages that fan work out across threads draw
//! a single batch seed from it and give every item its own stream derived
//! from that seed and the item index, so results never depend on scheduling.

use rand::{Rng, SeedableRng, rngs::StdRng};

// Odd constant from the golden ratio, spreads consecutive indices apart
const STREAM_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Use the configured seed, or draw a fresh one from the thread RNG
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::rng().random())
}

/// Deterministic run generator
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Independent stream for item `index` of a batch
pub fn substream(batch_seed: u64, index: usize) -> StdRng {
    let mixed = batch_seed ^ (index as u64).wrapping_add(1).wrapping_mul(STREAM_SPREAD);
    StdRng::seed_from_u64(mixed)
}
