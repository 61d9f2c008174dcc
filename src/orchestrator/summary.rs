//! Run summary for a household inference pass.

use serde::{Deserialize, Serialize};

use crate::matching::{FilterStats, Household};
use crate::models::LoadStats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub records: usize,
    /// Records retained with no address; they can only ever be singletons
    /// unless the address weight is zero.
    pub blank_addresses: usize,
    pub address_parse_failures: usize,
    pub split_factor: usize,
    pub batches: usize,
    pub candidate_pairs: usize,
    pub compared_pairs: usize,
    pub address_rejected: usize,
    pub match_pairs: usize,
    pub households: usize,
    pub singleton_households: usize,
    pub largest_household: usize,
    pub match_secs: f64,
    pub cluster_secs: f64,
    pub mem_used_start_mb: u64,
    pub mem_used_peak_mb: u64,
    pub started_utc: chrono::DateTime<chrono::Utc>,
    pub ended_utc: chrono::DateTime<chrono::Utc>,
    pub duration_secs: f64,
}

/// Accumulates run statistics; [`SummaryBuilder::build`] derives the household figures.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    load: LoadStats,
    split_factor: usize,
    batches: usize,
    candidate_pairs: usize,
    filter: FilterStats,
    match_time: std::time::Duration,
    cluster_time: std::time::Duration,
    mem_used_start_mb: u64,
    mem_used_peak_mb: u64,
    started_utc: chrono::DateTime<chrono::Utc>,
}

impl SummaryBuilder {
    pub fn new(load: LoadStats, split_factor: usize) -> Self {
        Self {
            load,
            split_factor,
            batches: 0,
            candidate_pairs: 0,
            filter: FilterStats::default(),
            match_time: std::time::Duration::ZERO,
            cluster_time: std::time::Duration::ZERO,
            mem_used_start_mb: 0,
            mem_used_peak_mb: 0,
            started_utc: chrono::Utc::now(),
        }
    }

    pub fn record_batch(&mut self, candidates: usize, stats: &FilterStats) {
        self.batches += 1;
        self.candidate_pairs += candidates;
        self.filter.merge(stats);
    }

    pub fn with_timings(
        mut self,
        match_time: std::time::Duration,
        cluster_time: std::time::Duration,
    ) -> Self {
        self.match_time = match_time;
        self.cluster_time = cluster_time;
        self
    }

    pub fn with_memory(mut self, start_used_mb: u64, peak_used_mb: u64) -> Self {
        self.mem_used_start_mb = start_used_mb;
        self.mem_used_peak_mb = peak_used_mb;
        self
    }

    pub fn build(self, households: &[Household]) -> RunSummary {
        let ended_utc = chrono::Utc::now();
        RunSummary {
            records: self.load.records,
            blank_addresses: self.load.blank_addresses,
            address_parse_failures: self.load.address_parse_failures,
            split_factor: self.split_factor,
            batches: self.batches,
            candidate_pairs: self.candidate_pairs,
            compared_pairs: self.filter.compared,
            address_rejected: self.filter.address_rejected,
            match_pairs: self.filter.accepted,
            households: households.len(),
            singleton_households: households.iter().filter(|h| h.is_singleton()).count(),
            largest_household: households.iter().map(Household::len).max().unwrap_or(0),
            match_secs: self.match_time.as_secs_f64(),
            cluster_secs: self.cluster_time.as_secs_f64(),
            mem_used_start_mb: self.mem_used_start_mb,
            mem_used_peak_mb: self.mem_used_peak_mb,
            started_utc: self.started_utc,
            ended_utc,
            duration_secs: (ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0,
        }
    }
}
