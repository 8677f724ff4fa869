//! Deterministic random source, seeded with ChaCha8.
//!
//! Every draw in the solver pipeline (variable samples, weighted choices,
//! shuffles, tie-breaks) flows through a single `Rng` handle, in a fixed
//! order for a given input. Same seed -> same assignment, always. ChaCha8
//! is a fixed, portable algorithm, so the sequence is stable across
//! platforms and releases.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng as _, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded, repeatable random generator.
///
/// Exposes exactly the surface the solver needs: uniform integers, choice
/// from a sequence, weighted choice, and in-place shuffle. User-supplied
/// function domains receive `&mut Rng` so their draws share the same
/// deterministic stream.
#[derive(Debug, Clone)]
pub struct Rng {
    inner: ChaCha8Rng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A uniform value in `[0, 2^bits)`. `bits` must be at most 63.
    pub fn randbits(&mut self, bits: u32) -> i64 {
        if bits == 0 {
            return 0;
        }
        let mask = u64::MAX >> (64 - bits);
        (self.inner.gen::<u64>() & mask) as i64
    }

    /// A uniform value in the half-open range `[lo, hi)`.
    pub fn randrange(&mut self, lo: i64, hi: i64) -> i64 {
        self.inner.gen_range(lo..hi)
    }

    /// A uniform choice from a non-empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.choice_index(items.len())]
    }

    /// A uniform index into a sequence of `len` items.
    pub fn choice_index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// An index drawn proportionally to the weights behind `index`.
    pub fn weighted_index(&mut self, index: &WeightedIndex<u64>) -> usize {
        index.sample(&mut self.inner)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}
