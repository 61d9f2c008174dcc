use std::collections::BTreeSet;

use household_matcher::address::{AddressParser, UsAddressParser, address_distance};
use household_matcher::config::FieldWeights;
use household_matcher::matching::{CandidatePair, generate_candidates, score_and_filter};
use household_matcher::models::{AddressParts, PiiRow, RecordStore};
use proptest::prelude::*;

const STREETS: [&str; 3] = ["GARDEN", "GAREDN", "ELM"];
const SUFFIXES: [&str; 3] = ["ST", "AVE", ""];
const NAMES: [&str; 3] = ["SMITH", "SMYTH", "LEE"];
const ZIPS: [&str; 3] = ["43215", "43216", ""];

fn row_strategy() -> impl Strategy<Value = PiiRow> {
    (0..3usize, 1..4u32, 0..3usize, 0..3usize, 0..3usize, any::<bool>(), any::<bool>()).prop_map(
        |(zip, number, street, suffix, name, blank, unit)| {
            let address = if blank {
                String::new()
            } else {
                let base = format!("{} {} {}", number, STREETS[street], SUFFIXES[suffix]);
                if unit {
                    format!("{} APT {}", base.trim_end(), number)
                } else {
                    base.trim_end().to_string()
                }
            };
            PiiRow {
                record_id: String::new(),
                family_name: NAMES[name].into(),
                phone_number: if name == 2 { "3125550000" } else { "6145551234" }.into(),
                household_street_address: address,
                household_zip: ZIPS[zip].into(),
            }
        },
    )
}

fn store_strategy() -> impl Strategy<Value = RecordStore> {
    prop::collection::vec(row_strategy(), 0..30)
        .prop_map(|rows| RecordStore::from_rows(rows, &UsAddressParser))
}

fn all_candidates(store: &RecordStore, split_factor: usize) -> Vec<CandidatePair> {
    generate_candidates(store, split_factor)
        .flat_map(|batch| batch.pairs)
        .collect()
}

proptest! {
    #[test]
    fn candidates_are_canonical(store in store_strategy(), split in 1..8usize) {
        for p in all_candidates(&store, split) {
            prop_assert!(p.a < p.b);
            prop_assert!(p.b < store.len());
        }
    }

    #[test]
    fn candidate_set_is_split_invariant(store in store_strategy(), split in 2..40usize) {
        let whole: BTreeSet<_> = all_candidates(&store, 1).into_iter().collect();
        let parts = all_candidates(&store, split);
        let unique: BTreeSet<_> = parts.iter().copied().collect();
        prop_assert_eq!(unique.len(), parts.len(), "pair emitted by two batches");
        prop_assert_eq!(unique, whole);
    }

    #[test]
    fn raising_threshold_never_adds_matches(
        store in store_strategy(),
        low in 0.5f64..0.95,
        bump in 0.0f64..0.05,
    ) {
        let candidates = all_candidates(&store, 3);
        let w = FieldWeights::default();
        let loose: BTreeSet<_> = score_and_filter(&candidates, &store, w, low, 0.95)
            .iter()
            .map(|m| m.positions())
            .collect();
        let strict: BTreeSet<_> = score_and_filter(&candidates, &store, w, low + bump, 0.95)
            .iter()
            .map(|m| m.positions())
            .collect();
        prop_assert!(strict.is_subset(&loose));
    }

    #[test]
    fn address_score_is_bounded(a in "[0-9A-Z #]{0,24}", b in "[0-9A-Z #]{0,24}") {
        let parse = |s: &str| UsAddressParser.parse(s).unwrap_or_else(|_| AddressParts::empty(s));
        let score = address_distance(&parse(&a), &parse(&b));
        prop_assert!((0.0..=1.0).contains(&score), "score {score} for {a:?} / {b:?}");
    }

    #[test]
    fn identical_non_blank_address_scores_one(a in "[1-9][0-9]{0,3} [A-Z]{3,8} (ST|AVE|RD)") {
        let parts = UsAddressParser.parse(&a).unwrap();
        prop_assert_eq!(address_distance(&parts, &parts), 1.0);
    }
}

#[test]
fn blank_address_scores_zero() {
    let blank = AddressParts::empty("   ");
    let full = UsAddressParser.parse("205 GARDEN ST").unwrap();
    assert_eq!(address_distance(&blank, &full), 0.0);
    assert_eq!(address_distance(&full, &blank), 0.0);
    assert_eq!(address_distance(&blank, &blank), 0.0);
}
