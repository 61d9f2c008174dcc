//! Scoring inferred households against a labelled answer key, for tuning
//! weights and thresholds.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::error::EvaluateError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkageScore {
    pub true_positives: usize,
    pub false_positives: usize,
    pub answer_key_size: usize,
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
}

fn records<R: Read>(reader: R) -> csv::StringRecordsIntoIter<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
        .into_records()
}

/// Answer key rows `pid, _, household_id, ...` as `(pid, household_id)`.
pub fn read_answer_key<R: Read>(reader: R) -> Result<HashSet<(String, String)>, EvaluateError> {
    let mut key = HashSet::new();
    for rec in records(reader) {
        let rec = rec?;
        match (rec.get(0), rec.get(2)) {
            (Some(pid), Some(hid)) => {
                key.insert((pid.to_string(), hid.to_string()));
            }
            _ => log::warn!("answer key row too short: {:?}", rec),
        }
    }
    Ok(key)
}

/// Two-column CSV with header as `(first, second)` pairs.
pub fn read_two_columns<R: Read>(reader: R) -> Result<Vec<(String, String)>, EvaluateError> {
    let mut out = Vec::new();
    for rec in records(reader) {
        let rec = rec?;
        if let (Some(a), Some(b)) = (rec.get(0), rec.get(1)) {
            out.push((a.to_string(), b.to_string()));
        }
    }
    Ok(out)
}

/// Precision/recall of `(household_position, pid)` assignments. A position is
/// translated to an answer-key household id through `position_to_hid`;
/// positions without a translation are not counted.
pub fn score_households(
    members: &[(String, String)],
    answer_key: &HashSet<(String, String)>,
    position_to_hid: &HashMap<String, String>,
) -> Result<LinkageScore, EvaluateError> {
    if answer_key.is_empty() {
        return Err(EvaluateError::EmptyAnswerKey);
    }
    let mut tp = 0usize;
    let mut fp = 0usize;
    for (hpos, pid) in members {
        let Some(hid) = position_to_hid.get(hpos) else {
            continue;
        };
        if answer_key.contains(&(pid.clone(), hid.clone())) {
            tp += 1;
        } else {
            fp += 1;
        }
    }
    let precision = if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    };
    let recall = tp as f64 / answer_key.len() as f64;
    let f_score = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    Ok(LinkageScore {
        true_positives: tp,
        false_positives: fp,
        answer_key_size: answer_key.len(),
        precision,
        recall,
        f_score,
    })
}
