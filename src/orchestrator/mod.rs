//! End-to-end household inference: blocking batches, pair filtering and
//! clustering over one record store.

pub mod summary;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::HouseholdConfig;
use crate::error::ConfigError;
use crate::matching::{
    BatchSpec, BlockingIndexer, Comparator, FilterStats, Household, MatchPair, build_households,
    sort_match_pairs,
};
use crate::metrics::{MemoryWatermark, memory_stats_mb};
use crate::models::RecordStore;
use summary::{RunSummary, SummaryBuilder};

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
    /// Candidates and accepted pairs of the batch just finished.
    pub candidates: usize,
    pub matches: usize,
    pub mem_used_mb: u64,
    pub mem_avail_mb: u64,
    pub stage: &'static str,
}

#[derive(Debug, Clone)]
pub struct HouseholdRun {
    pub households: Vec<Household>,
    /// Every accepted pair, sorted; empty unless `debug_pairs` is set.
    pub match_pairs: Vec<MatchPair>,
    pub summary: RunSummary,
}

struct BatchOutcome {
    candidates: usize,
    stats: FilterStats,
    matches: Vec<MatchPair>,
}

fn run_batch(indexer: &BlockingIndexer<'_>, comparator: &Comparator, spec: BatchSpec) -> BatchOutcome {
    let batch = indexer.batch(spec);
    let (matches, stats) = comparator.filter_batch(&batch.pairs, indexer.store());
    debug!(
        "Compared rows [{}..{}] x [{}..{}]: {} accepted of {}",
        batch.spec.a.start,
        batch.spec.a.end,
        batch.spec.b.start,
        batch.spec.b.end,
        matches.len(),
        batch.pairs.len()
    );
    // candidate list is dropped here, before the next batch is built
    BatchOutcome {
        candidates: batch.pairs.len(),
        stats,
        matches,
    }
}

fn progress(processed: usize, total: usize, outcome: &BatchOutcome) -> ProgressUpdate {
    let mem = memory_stats_mb();
    ProgressUpdate {
        processed,
        total,
        percent: if total == 0 {
            100.0
        } else {
            processed as f32 / total as f32 * 100.0
        },
        candidates: outcome.candidates,
        matches: outcome.matches.len(),
        mem_used_mb: mem.used_mb,
        mem_avail_mb: mem.avail_mb,
        stage: "household_match",
    }
}

/// Infer households for every record in `store`.
///
/// Configuration is validated before any blocking work; an invalid
/// configuration aborts the run.
pub fn infer_households<F>(
    store: &RecordStore,
    cfg: &HouseholdConfig,
    on_progress: F,
) -> Result<HouseholdRun, ConfigError>
where
    F: Fn(ProgressUpdate) + Sync,
{
    cfg.validate()?;
    let mut watermark = MemoryWatermark::start();
    let mut summary = SummaryBuilder::new(store.stats(), cfg.split_factor);

    let load = store.stats();
    if load.blank_addresses > 0 {
        info!(
            "{} of {} records have a blank address and can only form singleton households",
            load.blank_addresses, load.records
        );
    }

    let match_start = Instant::now();
    let indexer = BlockingIndexer::new(store);
    let comparator = Comparator::from_config(cfg);
    let plan = indexer.plan(cfg.split_factor);
    let total = plan.len();
    info!(
        "Household matching: {} records, split_factor={}, {} batches{}",
        store.len(),
        cfg.split_factor,
        total,
        if cfg.parallel { " (parallel)" } else { "" }
    );

    let outcomes: Vec<BatchOutcome> = if cfg.parallel {
        let done = AtomicUsize::new(0);
        let peak_used_mb = AtomicU64::new(watermark.peak_used_mb);
        let outcomes: Vec<BatchOutcome> = plan
            .into_par_iter()
            .map(|spec| {
                // first chunk of a partition starts at the partition itself
                if spec.b.start == spec.a.start {
                    let mem = memory_stats_mb();
                    peak_used_mb.fetch_max(mem.used_mb, Ordering::Relaxed);
                    debug!(
                        "Starting {} [{}..{}]; mem used={}MB avail={}MB",
                        spec.partition, spec.a.start, spec.a.end, mem.used_mb, mem.avail_mb
                    );
                }
                let outcome = run_batch(&indexer, &comparator, spec);
                let processed = done.fetch_add(1, Ordering::Relaxed) + 1;
                let update = progress(processed, total, &outcome);
                peak_used_mb.fetch_max(update.mem_used_mb, Ordering::Relaxed);
                on_progress(update);
                outcome
            })
            .collect();
        watermark.observe(peak_used_mb.into_inner());
        outcomes
    } else {
        let mut out = Vec::with_capacity(total);
        let mut current_partition: Option<String> = None;
        for spec in plan {
            if current_partition.as_deref() != Some(spec.partition.as_str()) {
                let mem = watermark.sample();
                debug!(
                    "Starting {} [{}..{}]; mem used={}MB avail={}MB",
                    spec.partition, spec.a.start, spec.a.end, mem.used_mb, mem.avail_mb
                );
                current_partition = Some(spec.partition.clone());
            }
            let outcome = run_batch(&indexer, &comparator, spec);
            let update = progress(out.len() + 1, total, &outcome);
            watermark.observe(update.mem_used_mb);
            on_progress(update);
            out.push(outcome);
        }
        out
    };

    let mut match_pairs = Vec::new();
    for outcome in outcomes {
        summary.record_batch(outcome.candidates, &outcome.stats);
        match_pairs.extend(outcome.matches);
    }
    sort_match_pairs(&mut match_pairs);
    let match_time = match_start.elapsed();
    info!("Found {} matching pairs", match_pairs.len());

    let cluster_start = Instant::now();
    let households = build_households(store.len(), &match_pairs);
    let cluster_time = cluster_start.elapsed();
    watermark.sample();

    let summary = summary
        .with_timings(match_time, cluster_time)
        .with_memory(watermark.start_used_mb, watermark.peak_used_mb)
        .build(&households);
    info!(
        "Inferred {} households from {} records ({} singletons, largest {})",
        summary.households, summary.records, summary.singleton_households, summary.largest_household
    );

    if !cfg.debug_pairs {
        match_pairs = Vec::new();
    }
    Ok(HouseholdRun {
        households,
        match_pairs,
        summary,
    })
}
