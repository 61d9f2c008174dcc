//! Candidate-pair generation by equality blocking over bounded partitions.
//!
//! The store is split into `split_factor` partitions. Each partition `A` is
//! indexed only against the forward suffix starting at `A.start`, cut into
//! chunks roughly the size of `A`; one `(A, chunk)` combination is one batch.
//! Together with `a < b` this yields every qualifying unordered pair exactly
//! once, whatever the split factor.

use std::collections::HashMap;
use std::ops::Range;

use crate::matching::CandidatePair;
use crate::models::{PersonRecord, RecordStore};
use crate::normalize::normalize_key;
use crate::util::partition::{forward_chunks, record_partitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockingRule {
    /// Same zip and same parsed street name.
    ZipStreet,
    /// Same zip and same family name.
    ZipFamilyName,
}

impl BlockingRule {
    pub const ALL: [BlockingRule; 2] = [BlockingRule::ZipStreet, BlockingRule::ZipFamilyName];

    /// Blocking key for a record, or `None` when any component is blank.
    pub fn key(&self, r: &PersonRecord) -> Option<String> {
        let zip = normalize_key(&r.household_zip);
        if zip.is_empty() {
            return None;
        }
        let second = match self {
            BlockingRule::ZipStreet => normalize_key(&r.address_parts.street),
            BlockingRule::ZipFamilyName => normalize_key(&r.family_name),
        };
        if second.is_empty() {
            return None;
        }
        Some(format!("{}|{}", zip, second))
    }
}

/// One unit of blocking work: partition `a` against forward chunk `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub index: usize,
    pub partition: String,
    pub a: Range<usize>,
    pub b: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct CandidateBatch {
    pub spec: BatchSpec,
    /// Sorted, de-duplicated, `a < b`.
    pub pairs: Vec<CandidatePair>,
}

/// Precomputed blocking keys over a record store.
pub struct BlockingIndexer<'s> {
    store: &'s RecordStore,
    // keys[pos][rule]
    keys: Vec<[Option<String>; 2]>,
}

impl<'s> BlockingIndexer<'s> {
    pub fn new(store: &'s RecordStore) -> Self {
        let keys = store
            .records()
            .iter()
            .map(|r| {
                if r.address_parts.is_blank() {
                    // never compared, so never needs a key
                    [None, None]
                } else {
                    BlockingRule::ALL.map(|rule| rule.key(r))
                }
            })
            .collect();
        Self { store, keys }
    }

    pub fn store(&self) -> &'s RecordStore {
        self.store
    }

    /// Every batch the store splits into, in processing order.
    pub fn plan(&self, split_factor: usize) -> Vec<BatchSpec> {
        let n = self.store.len();
        let mut specs = Vec::new();
        for part in record_partitions(n, split_factor) {
            for b in forward_chunks(&part.range, n) {
                specs.push(BatchSpec {
                    index: specs.len(),
                    partition: part.name.clone(),
                    a: part.range.clone(),
                    b,
                });
            }
        }
        specs
    }

    /// Candidate pairs `(a, b)` with `a` in `spec.a`, `b` in `spec.b`, `a < b`,
    /// sharing at least one blocking key and both having a non-blank address.
    pub fn candidates(&self, spec: &BatchSpec) -> Vec<CandidatePair> {
        let mut blocks: [HashMap<&str, Vec<usize>>; 2] = [HashMap::new(), HashMap::new()];
        for pos in spec.b.clone() {
            for (rule_idx, key) in self.keys[pos].iter().enumerate() {
                if let Some(k) = key {
                    blocks[rule_idx].entry(k.as_str()).or_default().push(pos);
                }
            }
        }

        let mut pairs = Vec::new();
        for a in spec.a.clone() {
            for (rule_idx, key) in self.keys[a].iter().enumerate() {
                let Some(k) = key else {
                    continue;
                };
                if let Some(bucket) = blocks[rule_idx].get(k.as_str()) {
                    pairs.extend(
                        bucket
                            .iter()
                            .filter(|&&b| a < b)
                            .map(|&b| CandidatePair { a, b }),
                    );
                }
            }
        }
        // a pair can share both keys
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub fn batch(&self, spec: BatchSpec) -> CandidateBatch {
        let pairs = self.candidates(&spec);
        log::debug!(
            "Indexing rows [{}..{}] against [{}..{}]: {} candidates",
            spec.a.start,
            spec.a.end,
            spec.b.start,
            spec.b.end,
            pairs.len()
        );
        CandidateBatch { spec, pairs }
    }
}

/// Lazily produced candidate batches; each is released once consumed.
pub struct CandidateBatches<'s> {
    indexer: BlockingIndexer<'s>,
    specs: std::vec::IntoIter<BatchSpec>,
}

impl Iterator for CandidateBatches<'_> {
    type Item = CandidateBatch;

    fn next(&mut self) -> Option<CandidateBatch> {
        let spec = self.specs.next()?;
        Some(self.indexer.batch(spec))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.specs.size_hint()
    }
}

impl ExactSizeIterator for CandidateBatches<'_> {}

pub fn generate_candidates(store: &RecordStore, split_factor: usize) -> CandidateBatches<'_> {
    let indexer = BlockingIndexer::new(store);
    let specs = indexer.plan(split_factor).into_iter();
    CandidateBatches { indexer, specs }
}
