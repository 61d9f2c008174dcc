use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SPLIT_FACTOR: usize = 4;
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;
pub const DEFAULT_ADDRESS_PREFILTER: f64 = 0.95;

/// Per-field multipliers applied to similarity scores. They need not sum to 1.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct FieldWeights {
    pub family_name: f64,
    pub phone_number: f64,
    pub address: f64,
    /// Zero disables zip scoring; zip is already a blocking key.
    #[serde(default)]
    pub zip: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            family_name: 0.25,
            phone_number: 0.2,
            address: 0.55,
            zip: 0.0,
        }
    }
}

impl FieldWeights {
    /// Highest weighted sum any pair can reach (every similarity is at most 1).
    pub fn max_score(&self) -> f64 {
        self.family_name + self.phone_number + self.address + self.zip
    }

    fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("weights.family_name", self.family_name),
            ("weights.phone_number", self.phone_number),
            ("weights.address", self.address),
            ("weights.zip", self.zip),
        ]
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct HouseholdConfig {
    /// Number of partitions the record store is split into for blocking.
    pub split_factor: usize,
    #[serde(default)]
    pub weights: FieldWeights,
    /// A pair is accepted when its weighted sum is strictly greater than this.
    pub match_threshold: f64,
    /// Pairs whose address similarity is below this are dropped before weighting.
    pub address_prefilter_threshold: f64,
    /// Run blocking batches on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
    /// Keep every accepted pair in the run result for the debug dump.
    #[serde(default)]
    pub debug_pairs: bool,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            split_factor: DEFAULT_SPLIT_FACTOR,
            weights: FieldWeights::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            address_prefilter_threshold: DEFAULT_ADDRESS_PREFILTER,
            parallel: false,
            debug_pairs: false,
        }
    }
}

impl HouseholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.split_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "split_factor",
                reason: "must be >= 1".into(),
            });
        }
        for (field, w) in self.weights.fields() {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{} must be a finite, non-negative number", w),
                });
            }
        }
        for (field, t) in [
            ("match_threshold", self.match_threshold),
            ("address_prefilter_threshold", self.address_prefilter_threshold),
        ] {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{} not in 0..=1", t),
                });
            }
        }
        let max_score = self.weights.max_score();
        if max_score <= self.match_threshold {
            return Err(ConfigError::Unsatisfiable {
                max_score,
                threshold: self.match_threshold,
            });
        }
        Ok(())
    }
}
