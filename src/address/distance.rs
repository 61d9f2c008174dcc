use crate::matching::helpers::{hamming_similarity, jaro_winkler, join_space};
use crate::models::AddressParts;

/// Component weights; the secondary-unit term only counts when a unit exists.
#[derive(Debug, Clone, Copy)]
struct ComponentWeights {
    number: f64,
    street: f64,
    secondary: f64,
}

const WITHOUT_UNIT: ComponentWeights = ComponentWeights {
    number: 0.5,
    street: 0.5,
    secondary: 0.0,
};

const WITH_UNIT: ComponentWeights = ComponentWeights {
    number: 0.3,
    street: 0.5,
    secondary: 0.2,
};

/// Whole-string fallback is scaled by this on top of the number+street weight.
const RAW_FALLBACK_FACTOR: f64 = 0.6;
const NAME_PART_WEIGHT: f64 = 0.8;
const QUALIFIER_PART_WEIGHT: f64 = 0.2;
const MISALIGNED_DISCOUNT: f64 = 0.7;
const ASYMMETRIC_UNIT_DISCOUNT: f64 = 0.6;
const CONCATENATED_UNIT_DISCOUNT: f64 = 0.8;

/// Similarity of two parsed street addresses on `[0, 1]`.
///
/// Two blank addresses score 0, never 1: an unknown address is not evidence
/// of a shared household.
pub fn address_distance(a1: &AddressParts, a2: &AddressParts) -> f64 {
    if a1.is_blank() || a2.is_blank() {
        return 0.0;
    }
    if a1.raw == a2.raw {
        return 1.0;
    }

    let unit_present = a1.has_secondary_unit() || a2.has_secondary_unit();
    let w = if unit_present { WITH_UNIT } else { WITHOUT_UNIT };

    let mut structured = 0.0;
    if !a1.number.is_empty() && !a2.number.is_empty() {
        structured += w.number * hamming_similarity(&a1.number, &a2.number);
    }
    structured += w.street * street_score(a1, a2);

    let secondary = if unit_present {
        secondary_unit_score(a1, a2)
    } else {
        0.0
    };

    // The parse is unreliable on odd input, so the raw text gets a say.
    let whole = jaro_winkler(&a1.raw, &a2.raw) * (w.number + w.street) * RAW_FALLBACK_FACTOR;
    (structured.max(whole) + secondary * w.secondary).clamp(0.0, 1.0)
}

/// Best street-name agreement over the suffix alignments.
fn street_score(a1: &AddressParts, a2: &AddressParts) -> f64 {
    let (s1, s2) = (a1.street.as_str(), a2.street.as_str());
    let (x1, x2) = (a1.suffix.as_str(), a2.suffix.as_str());
    let mut best: f64 = 0.0;

    if !s1.is_empty() && !s2.is_empty() {
        if !x1.is_empty() && !x2.is_empty() {
            let name = jaro_winkler(s1, s2) * NAME_PART_WEIGHT;
            if name > 0.0 {
                best = name + jaro_winkler(x1, x2) * QUALIFIER_PART_WEIGHT;
            }
        }
        // One side may have had its suffix folded into the street name.
        if !x1.is_empty() {
            best = best.max(jaro_winkler(&join_space(s1, x1), s2));
        }
        if !x2.is_empty() {
            best = best.max(jaro_winkler(&join_space(s2, x2), s1));
        }
        let discount = if x1.is_empty() && x2.is_empty() {
            1.0
        } else {
            MISALIGNED_DISCOUNT
        };
        best = best.max(jaro_winkler(s1, s2) * discount);
    } else {
        // A missing street may have been parsed as the other side's suffix.
        if !s1.is_empty() && !x2.is_empty() {
            best = best
                .max(jaro_winkler(&join_space(s1, x1), x2) * MISALIGNED_DISCOUNT)
                .max(jaro_winkler(s1, x2) * MISALIGNED_DISCOUNT);
        }
        if !s2.is_empty() && !x1.is_empty() {
            best = best
                .max(jaro_winkler(&join_space(s2, x2), x1) * MISALIGNED_DISCOUNT)
                .max(jaro_winkler(s2, x1) * MISALIGNED_DISCOUNT);
        }
    }
    best
}

/// Best agreement of apartment/suite designators, same alignment idea as the street.
fn secondary_unit_score(a1: &AddressParts, a2: &AddressParts) -> f64 {
    let (t1, t2) = (
        a1.secondary_unit_type.as_str(),
        a2.secondary_unit_type.as_str(),
    );
    let (v1, v2) = (
        a1.secondary_unit_value.as_str(),
        a2.secondary_unit_value.as_str(),
    );
    let mut best: f64 = 0.0;

    if !v1.is_empty() && !v2.is_empty() {
        if !t1.is_empty() && !t2.is_empty() {
            best = jaro_winkler(v1, v2) * NAME_PART_WEIGHT
                + jaro_winkler(t1, t2) * QUALIFIER_PART_WEIGHT;
        }
        if !t1.is_empty() {
            best = best.max(jaro_winkler(&join_space(t1, v1), v2));
        }
        if !t2.is_empty() {
            best = best.max(jaro_winkler(&join_space(t2, v2), v1));
        }
        let discount = if t1.is_empty() && t2.is_empty() {
            1.0
        } else {
            MISALIGNED_DISCOUNT
        };
        best = best.max(jaro_winkler(v1, v2) * discount);
    } else {
        // Only one side has a value; it may have been parsed as the other's type.
        if !v1.is_empty() {
            best = best
                .max(jaro_winkler(&format!("{}{}", t1, v1), t2) * ASYMMETRIC_UNIT_DISCOUNT)
                .max(jaro_winkler(v1, t2) * ASYMMETRIC_UNIT_DISCOUNT);
        }
        if !v2.is_empty() {
            best = best
                .max(jaro_winkler(&format!("{}{}", t2, v2), t1) * ASYMMETRIC_UNIT_DISCOUNT)
                .max(jaro_winkler(v2, t1) * ASYMMETRIC_UNIT_DISCOUNT);
        }
    }

    let whole1 = format!("{}{}", t1, v1);
    let whole2 = format!("{}{}", t2, v2);
    best.max(jaro_winkler(&whole1, &whole2) * CONCATENATED_UNIT_DISCOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressParser, UsAddressParser};

    fn parsed(s: &str) -> AddressParts {
        UsAddressParser.parse(s).unwrap()
    }

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn identical_raw_is_one() {
        let a = parsed("205 GARDEN ST");
        assert_eq!(address_distance(&a, &a), 1.0);
        let unparsed = AddressParts::empty("whatever 12");
        assert_eq!(address_distance(&unparsed, &unparsed), 1.0);
    }

    #[test]
    fn blank_never_matches() {
        let blank = AddressParts::empty("");
        let a = parsed("205 GARDEN ST");
        assert_eq!(address_distance(&blank, &blank), 0.0);
        assert_eq!(address_distance(&blank, &a), 0.0);
        assert_eq!(address_distance(&a, &blank), 0.0);
        let spaces = AddressParts::empty("   ");
        assert_eq!(address_distance(&spaces, &spaces), 0.0);
    }

    #[test]
    fn street_typo_scores_high() {
        let a = parsed("205 GARDEN ST");
        let b = parsed("205 GAREDN ST");
        let s = address_distance(&a, &b);
        // 0.5 (number) + 0.5 * (0.8 * jw(GARDEN, GAREDN) + 0.2)
        assert!(approx(s, 0.9844, 1e-3), "got {}", s);
        assert_eq!(s, address_distance(&b, &a));
    }

    #[test]
    fn different_house_number_drops_below_prefilter() {
        let a = parsed("205 GARDEN ST");
        let b = parsed("207 GARDEN ST");
        let s = address_distance(&a, &b);
        assert!(s < 0.95, "got {}", s);
        assert!(s > 0.5);
    }

    #[test]
    fn different_apartments_are_penalized() {
        let a = parsed("12 OAK AVE APT 1");
        let b = parsed("12 OAK AVE APT 9");
        let same = parsed("12 OAK AVE UNIT 1");
        let diff = address_distance(&a, &b);
        assert!(diff < 0.95, "got {}", diff);
        assert!(address_distance(&a, &same) > diff);
    }

    #[test]
    fn suffix_folded_into_street() {
        let mut a = parsed("9 ELM ST");
        a.street = "ELM ST".into();
        a.suffix.clear();
        let b = parsed("9 ELM STREET");
        let s = address_distance(&a, &b);
        assert!(s > 0.8, "got {}", s);
    }

    #[test]
    fn unparsed_side_uses_raw_fallback() {
        let a = AddressParts::empty("205 GARDEN ST");
        let b = parsed("205 GARDEN STREET");
        let s = address_distance(&a, &b);
        // only the scaled whole-string comparison contributes
        assert!(s > 0.0 && s <= 0.6, "got {}", s);
    }

    #[test]
    fn score_is_bounded() {
        let pairs = [
            ("1 A ST APT 2", "1 A ST APT 2B"),
            ("1 A ST #2", "1 A ST"),
            ("PO BOX 7", "7 BOX RD"),
            ("100 MAIN", "100 MAIN ST"),
        ];
        for (x, y) in pairs {
            let s = address_distance(&parsed(x), &parsed(y));
            assert!((0.0..=1.0).contains(&s), "{} / {} -> {}", x, y, s);
        }
    }
}
