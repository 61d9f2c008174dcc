use crate::error::AddressParseError;
use crate::models::AddressParts;

/// Splits single-line address text into [`AddressParts`].
///
/// Failure is an ordinary outcome; the record store falls back to
/// [`AddressParts::empty`] so that scoring uses the whole-string path.
pub trait AddressParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<AddressParts, AddressParseError>;
}

impl<F> AddressParser for F
where
    F: Fn(&str) -> Result<AddressParts, AddressParseError> + Send + Sync,
{
    fn parse(&self, text: &str) -> Result<AddressParts, AddressParseError> {
        self(text)
    }
}

const STREET_SUFFIXES: &[&str] = &[
    "ALLEY", "ALY", "AVE", "AV", "AVENUE", "BEND", "BLVD", "BOULEVARD", "BND", "BYP", "BYPASS",
    "CIR", "CIRCLE", "CRES", "CRESCENT", "CT", "COURT", "CV", "COVE", "DR", "DRIVE", "EXPY",
    "EXPRESSWAY", "FWY", "FREEWAY", "GRN", "GREEN", "HOLW", "HOLLOW", "HTS", "HEIGHTS", "HWY",
    "HIGHWAY", "LN", "LANE", "LOOP", "MNR", "MANOR", "PASS", "PATH", "PIKE", "PKWY", "PARKWAY",
    "PL", "PLACE", "PLZ", "PLAZA", "PT", "POINT", "RD", "ROAD", "RDG", "RIDGE", "ROW", "RUN",
    "SQ", "SQUARE", "ST", "STREET", "TER", "TERRACE", "TRCE", "TRACE", "TRL", "TRAIL", "VW",
    "VIEW", "WALK", "WAY", "XING", "CROSSING",
];

const UNIT_DESIGNATORS: &[&str] = &[
    "APT", "APARTMENT", "BLDG", "BUILDING", "BSMT", "DEPT", "FL", "FLOOR", "FRNT", "LOT",
    "LOWR", "OFC", "PH", "REAR", "RM", "ROOM", "SPC", "STE", "SUITE", "TRLR", "UNIT", "UPPR",
];

const DIRECTIONALS: &[&str] = &["N", "S", "E", "W", "NE", "NW", "SE", "SW"];

/// Rule-based parser for US single-line street addresses such as
/// `"205 GARDEN ST APT 4B"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsAddressParser;

impl UsAddressParser {
    fn tokens(text: &str) -> Vec<String> {
        text.to_uppercase()
            .replace([',', '.'], " ")
            .split_whitespace()
            .filter(|t| *t == "#" || t.chars().any(|c| c.is_ascii_alphanumeric()))
            .map(str::to_string)
            .collect()
    }

    fn is_unit_designator(token: &str) -> bool {
        token.starts_with('#') || UNIT_DESIGNATORS.contains(&token)
    }
}

impl AddressParser for UsAddressParser {
    fn parse(&self, text: &str) -> Result<AddressParts, AddressParseError> {
        if text.trim().is_empty() {
            return Err(AddressParseError::Empty);
        }
        let mut tokens = Self::tokens(text);
        if tokens.is_empty() {
            return Err(AddressParseError::Unrecognized(text.to_string()));
        }
        let mut parts = AddressParts {
            raw: text.to_string(),
            ..Default::default()
        };

        // Secondary unit: first designator after the leading token.
        if let Some(i) = tokens
            .iter()
            .skip(1)
            .position(|t| Self::is_unit_designator(t))
            .map(|i| i + 1)
        {
            let unit: Vec<String> = tokens.split_off(i);
            let designator = &unit[0];
            match designator.strip_prefix('#') {
                Some(rest) if !rest.is_empty() => {
                    parts.secondary_unit_type = "#".into();
                    parts.secondary_unit_value = rest.to_string();
                }
                _ => {
                    parts.secondary_unit_type = designator.clone();
                    parts.secondary_unit_value = unit[1..].join(" ");
                }
            }
        }

        if tokens
            .first()
            .is_some_and(|t| t.starts_with(|c: char| c.is_ascii_digit()))
        {
            parts.number = tokens.remove(0);
        }

        // A trailing directional after the suffix ("MAIN ST NW") is not part of the name.
        if tokens.len() >= 3
            && DIRECTIONALS.contains(&tokens[tokens.len() - 1].as_str())
            && STREET_SUFFIXES.contains(&tokens[tokens.len() - 2].as_str())
        {
            tokens.pop();
        }
        if tokens.len() >= 2 && STREET_SUFFIXES.contains(&tokens[tokens.len() - 1].as_str()) {
            parts.suffix = tokens.pop().unwrap_or_default();
        }
        parts.street = tokens.join(" ");

        if parts.number.is_empty()
            && parts.street.is_empty()
            && parts.suffix.is_empty()
            && !parts.has_secondary_unit()
        {
            return Err(AddressParseError::Unrecognized(text.to_string()));
        }
        Ok(parts)
    }
}
