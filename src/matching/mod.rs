//! Household entity resolution: blocking, pairwise scoring and clustering.

use serde::{Deserialize, Serialize};

pub mod blocking;
pub mod cluster;
pub mod compare;

pub(crate) mod helpers;

pub use blocking::{BatchSpec, BlockingIndexer, BlockingRule, CandidateBatch, generate_candidates};
pub use cluster::{Household, MatchGraph, build_households};
pub use compare::{Comparator, FieldScores, FilterStats, compare_records, score_and_filter};

/// Two record positions selected for detailed comparison. Always `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub a: usize,
    pub b: usize,
}

impl CandidatePair {
    /// Canonical pair for two distinct positions; `None` for a self-pair.
    pub fn new(x: usize, y: usize) -> Option<Self> {
        match x.cmp(&y) {
            std::cmp::Ordering::Less => Some(Self { a: x, b: y }),
            std::cmp::Ordering::Greater => Some(Self { a: y, b: x }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// A candidate pair whose weighted similarity exceeded the match threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

impl MatchPair {
    pub fn positions(&self) -> (usize, usize) {
        (self.a, self.b)
    }
}

/// Order accepted pairs by position so clustering is independent of the
/// order batches finished in.
pub fn sort_match_pairs(pairs: &mut [MatchPair]) {
    pairs.sort_unstable_by_key(MatchPair::positions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_pair_is_canonical() {
        assert_eq!(CandidatePair::new(5, 2), Some(CandidatePair { a: 2, b: 5 }));
        assert_eq!(CandidatePair::new(2, 5), Some(CandidatePair { a: 2, b: 5 }));
        assert_eq!(CandidatePair::new(3, 3), None);
    }

    #[test]
    fn match_pairs_sort_by_position() {
        let mut v = vec![
            MatchPair { a: 3, b: 9, score: 0.9 },
            MatchPair { a: 1, b: 4, score: 0.95 },
            MatchPair { a: 1, b: 2, score: 0.88 },
        ];
        sort_match_pairs(&mut v);
        let order: Vec<_> = v.iter().map(MatchPair::positions).collect();
        assert_eq!(order, vec![(1, 2), (1, 4), (3, 9)]);
    }
}
