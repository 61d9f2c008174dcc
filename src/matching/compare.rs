use serde::{Deserialize, Serialize};

use crate::address::address_distance;
use crate::config::{FieldWeights, HouseholdConfig};
use crate::matching::helpers::{jaro_winkler, levenshtein_similarity};
use crate::matching::{CandidatePair, MatchPair};
use crate::models::{PersonRecord, RecordStore};

/// Per-field similarities for one candidate pair, each on [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldScores {
    pub family_name: f64,
    pub phone_number: f64,
    pub address: f64,
    /// Only computed when zip carries weight.
    pub zip: Option<f64>,
}

impl FieldScores {
    pub fn weighted(&self, w: &FieldWeights) -> f64 {
        self.family_name * w.family_name
            + self.phone_number * w.phone_number
            + self.address * w.address
            + self.zip.unwrap_or(0.0) * w.zip
    }
}

pub fn compare_records(r1: &PersonRecord, r2: &PersonRecord, score_zip: bool) -> FieldScores {
    FieldScores {
        family_name: jaro_winkler(&r1.family_name, &r2.family_name),
        phone_number: jaro_winkler(&r1.phone_number, &r2.phone_number),
        address: address_distance(&r1.address_parts, &r2.address_parts),
        zip: score_zip.then(|| levenshtein_similarity(&r1.household_zip, &r2.household_zip)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub compared: usize,
    pub address_rejected: usize,
    pub below_threshold: usize,
    pub accepted: usize,
}

impl FilterStats {
    pub fn merge(&mut self, other: &FilterStats) {
        self.compared += other.compared;
        self.address_rejected += other.address_rejected;
        self.below_threshold += other.below_threshold;
        self.accepted += other.accepted;
    }
}

/// Scores candidate pairs and keeps those above the match threshold.
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    pub weights: FieldWeights,
    pub threshold: f64,
    pub address_threshold: f64,
}

impl Comparator {
    pub fn new(weights: FieldWeights, threshold: f64, address_threshold: f64) -> Self {
        Self {
            weights,
            threshold,
            address_threshold,
        }
    }

    pub fn from_config(cfg: &HouseholdConfig) -> Self {
        Self::new(
            cfg.weights,
            cfg.match_threshold,
            cfg.address_prefilter_threshold,
        )
    }

    /// Weighted score of the pair, or `None` when it fails the address
    /// pre-filter. Names and phones cannot rescue a different address.
    pub fn score(&self, r1: &PersonRecord, r2: &PersonRecord) -> Option<f64> {
        let scores = compare_records(r1, r2, self.weights.zip > 0.0);
        if scores.address < self.address_threshold {
            return None;
        }
        Some(scores.weighted(&self.weights))
    }

    /// Accepted pairs of one batch, in candidate order.
    pub fn filter_batch(
        &self,
        candidates: &[CandidatePair],
        store: &RecordStore,
    ) -> (Vec<MatchPair>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut out = Vec::new();
        for pair in candidates {
            let (Some(r1), Some(r2)) = (store.get(pair.a), store.get(pair.b)) else {
                log::warn!("candidate {:?} outside record store; skipped", pair);
                continue;
            };
            // never compare an unknown address
            if r1.address_parts.is_blank() || r2.address_parts.is_blank() {
                continue;
            }
            stats.compared += 1;
            match self.score(r1, r2) {
                None => stats.address_rejected += 1,
                Some(total) if total > self.threshold => {
                    stats.accepted += 1;
                    out.push(MatchPair {
                        a: pair.a,
                        b: pair.b,
                        score: total,
                    });
                }
                Some(_) => stats.below_threshold += 1,
            }
        }
        (out, stats)
    }
}

pub fn score_and_filter(
    candidates: &[CandidatePair],
    store: &RecordStore,
    weights: FieldWeights,
    threshold: f64,
    address_threshold: f64,
) -> Vec<MatchPair> {
    Comparator::new(weights, threshold, address_threshold)
        .filter_batch(candidates, store)
        .0
}
