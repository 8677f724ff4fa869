//! Domain encoding: the possible values of one random variable.
//!
//! Domains come in four shapes:
//! - **Bits**: integers `[0, 2^W)`, uniform. `W` is at most 63 so every
//!   value fits the scalar type.
//! - **Range / Values**: a finite ordered sequence, uniform.
//! - **Weighted**: `(value | range, weight)` entries sampled proportionally
//!   to weight; a chosen range entry then samples uniformly within itself.
//! - **Function**: an opaque callable handed the shared random source.
//!
//! All shapes except `Function` are enumerable: they report a size and can
//! list distinct values in a deterministic order.

use std::fmt;
use std::sync::Arc;

use rand::distributions::WeightedIndex;

use crate::error::BuildError;
use crate::rng::Rng;

/// An opaque value generator. Receives the shared random source so its
/// draws stay on the deterministic stream; the library cannot enforce
/// that it uses it, only document the requirement.
pub type SampleFn = Arc<dyn Fn(&mut Rng) -> i64 + Send + Sync>;

/// One entry of a weighted domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistEntry {
    Value(i64),
    /// Half-open range `[lo, hi)`, sampled uniformly once chosen.
    Range(i64, i64),
}

/// A weighted distribution over values and ranges. Weights are validated
/// at construction; sampling goes through a prebuilt `WeightedIndex`.
#[derive(Debug, Clone)]
pub struct Dist {
    entries: Vec<(DistEntry, u64)>,
    index: WeightedIndex<u64>,
}

impl Dist {
    pub(crate) fn new(entries: Vec<(DistEntry, u64)>) -> Result<Self, BuildError> {
        if entries.is_empty() {
            return Err(BuildError::EmptyDist);
        }
        for (entry, weight) in &entries {
            if *weight == 0 {
                return Err(BuildError::ZeroWeight);
            }
            if let DistEntry::Range(lo, hi) = entry {
                if lo >= hi {
                    return Err(BuildError::EmptyDistRange { lo: *lo, hi: *hi });
                }
            }
        }
        // Empty and zero-weight cases are rejected above; the remaining
        // failure mode is weight-sum overflow.
        let index = WeightedIndex::new(entries.iter().map(|(_, w)| *w))
            .map_err(|_| BuildError::WeightOverflow)?;
        Ok(Self { entries, index })
    }

    fn sample(&self, rng: &mut Rng) -> i64 {
        let (entry, _) = &self.entries[rng.weighted_index(&self.index)];
        match entry {
            DistEntry::Value(v) => *v,
            DistEntry::Range(lo, hi) => rng.randrange(*lo, *hi),
        }
    }

    /// Upper bound on the number of distinct values. Overlapping entries
    /// are counted once per entry; the bound is used only for budgeting.
    fn size(&self) -> u128 {
        self.entries
            .iter()
            .map(|(entry, _)| match entry {
                DistEntry::Value(_) => 1u128,
                DistEntry::Range(lo, hi) => (hi - lo) as u128,
            })
            .sum()
    }

    fn enumerate(&self, limit: usize) -> Vec<i64> {
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        'entries: for (entry, _) in &self.entries {
            match entry {
                DistEntry::Value(v) => {
                    if seen.insert(*v) {
                        out.push(*v);
                    }
                    if out.len() >= limit {
                        break 'entries;
                    }
                }
                DistEntry::Range(lo, hi) => {
                    for v in *lo..*hi {
                        if seen.insert(v) {
                            out.push(v);
                        }
                        if out.len() >= limit {
                            break 'entries;
                        }
                    }
                }
            }
        }
        out
    }
}

/// The declared set of possible values for a variable.
#[derive(Clone)]
pub enum Domain {
    /// Integers `[0, 2^W)`.
    Bits(u32),
    /// Half-open range `[lo, hi)`.
    Range(i64, i64),
    /// Finite ordered sequence.
    Values(Vec<i64>),
    /// Weighted values and ranges.
    Weighted(Dist),
    /// Opaque callable.
    Function(SampleFn),
}

impl Domain {
    /// Number of distinct values; `None` for opaque functions.
    pub fn size(&self) -> Option<u128> {
        match self {
            Domain::Bits(w) => Some(1u128 << w),
            Domain::Range(lo, hi) => Some((hi - lo) as u128),
            Domain::Values(values) => Some(values.len() as u128),
            Domain::Weighted(dist) => Some(dist.size()),
            Domain::Function(_) => None,
        }
    }

    /// Up to `limit` distinct values in deterministic order. Empty for
    /// function domains.
    pub fn enumerate(&self, limit: usize) -> Vec<i64> {
        match self {
            Domain::Bits(w) => {
                let count = (1u128 << *w).min(limit as u128).min(i64::MAX as u128) as i64;
                (0..count).collect()
            }
            Domain::Range(lo, hi) => {
                let count = ((hi - lo) as u128).min(limit as u128) as i64;
                (*lo..lo + count).collect()
            }
            Domain::Values(values) => {
                let mut seen = std::collections::BTreeSet::new();
                values
                    .iter()
                    .copied()
                    .filter(|v| seen.insert(*v))
                    .take(limit)
                    .collect()
            }
            Domain::Weighted(dist) => dist.enumerate(limit),
            Domain::Function(_) => Vec::new(),
        }
    }

    /// Draw one value from this domain.
    pub fn sample(&self, rng: &mut Rng) -> i64 {
        match self {
            Domain::Bits(w) => rng.randbits(*w),
            Domain::Range(lo, hi) => rng.randrange(*lo, *hi),
            Domain::Values(values) => *rng.choice(values),
            Domain::Weighted(dist) => dist.sample(rng),
            Domain::Function(f) => f(rng),
        }
    }

    pub fn is_enumerable(&self) -> bool {
        !matches!(self, Domain::Function(_))
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), BuildError> {
        match self {
            Domain::Bits(w) if *w > 63 => Err(BuildError::BitsTooWide(*w)),
            Domain::Range(lo, hi) if lo >= hi => Err(BuildError::EmptyRange {
                name: name.to_string(),
                lo: *lo,
                hi: *hi,
            }),
            Domain::Values(values) if values.is_empty() => {
                Err(BuildError::EmptyDomain(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Bits(w) => f.debug_tuple("Bits").field(w).finish(),
            Domain::Range(lo, hi) => f.debug_tuple("Range").field(lo).field(hi).finish(),
            Domain::Values(values) => f.debug_tuple("Values").field(values).finish(),
            Domain::Weighted(dist) => f.debug_tuple("Weighted").field(dist).finish(),
            Domain::Function(_) => f.write_str("Function(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_size_and_enumerate() {
        let domain = Domain::Bits(4);
        assert_eq!(domain.size(), Some(16));
        assert_eq!(domain.enumerate(4), vec![0, 1, 2, 3]);
        assert_eq!(domain.enumerate(100).len(), 16);
    }

    #[test]
    fn test_range_sample_in_bounds() {
        let domain = Domain::Range(3, 14);
        assert_eq!(domain.size(), Some(11));
        let mut rng = Rng::new(0);
        for _ in 0..100 {
            assert!((3..14).contains(&domain.sample(&mut rng)));
        }
    }

    #[test]
    fn test_values_enumerate_dedupes() {
        let domain = Domain::Values(vec![5, 3, 5, 7]);
        assert_eq!(domain.enumerate(10), vec![5, 3, 7]);
    }

    #[test]
    fn test_weighted_sample_respects_domain() {
        let dist = Dist::new(vec![
            (DistEntry::Value(0), 50),
            (DistEntry::Range(2, 10), 50),
        ])
        .unwrap();
        let domain = Domain::Weighted(dist);
        assert_eq!(domain.size(), Some(9));
        assert_eq!(domain.enumerate(100), vec![0, 2, 3, 4, 5, 6, 7, 8, 9]);
        let mut rng = Rng::new(0);
        for _ in 0..200 {
            let v = domain.sample(&mut rng);
            assert!(v == 0 || (2..10).contains(&v));
        }
    }

    #[test]
    fn test_function_not_enumerable() {
        let domain = Domain::Function(Arc::new(|rng: &mut Rng| rng.randbits(8)));
        assert!(!domain.is_enumerable());
        assert_eq!(domain.size(), None);
        assert!(domain.enumerate(10).is_empty());
    }

    #[test]
    fn test_validation_rejects_bad_shapes() {
        assert!(matches!(
            Domain::Bits(64).validate("x"),
            Err(BuildError::BitsTooWide(64))
        ));
        assert!(matches!(
            Domain::Range(5, 5).validate("x"),
            Err(BuildError::EmptyRange { .. })
        ));
        assert!(matches!(
            Domain::Values(vec![]).validate("x"),
            Err(BuildError::EmptyDomain(_))
        ));
        assert!(matches!(
            Dist::new(vec![]),
            Err(BuildError::EmptyDist)
        ));
        assert!(matches!(
            Dist::new(vec![(DistEntry::Value(1), 0)]),
            Err(BuildError::ZeroWeight)
        ));
        assert!(matches!(
            Dist::new(vec![(DistEntry::Range(4, 4), 1)]),
            Err(BuildError::EmptyDistRange { .. })
        ));
    }
}
