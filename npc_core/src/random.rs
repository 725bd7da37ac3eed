//! Label-scoped deterministic randomness.
//!
//! Every decision that can change a character draws from its own stream,
//! seeded from the SHA3-256 digest of `base_seed + label`. Adding or removing
//! a decision therefore never shifts the outcome of any other decision made
//! under the same base seed.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha3::{Digest, Sha3_256};
use uuid::Uuid;

/// The generator type behind every seeded decision.
pub type SeededRng = ChaCha8Rng;

/// Build the stream for one decision.
pub fn seeded_rng(base_seed: &str, label: &str) -> SeededRng {
    let mut hasher = Sha3_256::new();
    hasher.update(base_seed.as_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    ChaCha8Rng::from_seed(seed)
}

/// A new base seed for builds that did not supply one.
pub fn fresh_seed() -> String {
    Uuid::new_v4().to_string()
}

/// Draw an index proportionally to `weights`. `None` when there is nothing
/// with positive weight to draw.
pub fn weighted_index<R, W>(rng: &mut R, weights: &[W]) -> Option<usize>
where
    R: rand::Rng + ?Sized,
    W: rand::distributions::uniform::SampleUniform
        + PartialOrd
        + Default
        + Clone
        + for<'a> std::ops::AddAssign<&'a W>,
{
    WeightedIndex::new(weights).ok().map(|dist| dist.sample(rng))
}

/// Uniform choice from a slice.
pub fn choose<'a, T, R: rand::Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    items.choose(rng)
}

/// Uniformly pick up to `count` distinct items, preserving draw order.
pub fn choose_distinct<T: Clone, R: rand::Rng + ?Sized>(
    rng: &mut R,
    items: &[T],
    count: usize,
) -> Vec<T> {
    items.choose_multiple(rng, count).cloned().collect()
}
