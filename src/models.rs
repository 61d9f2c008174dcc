use serde::{Deserialize, Serialize};

use crate::address::AddressParser;

/// One row of the cleaned PII extract. Columns beyond these are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PiiRow {
    pub record_id: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub household_street_address: String,
    #[serde(default)]
    pub household_zip: String,
}

/// Structured components of a street address. Every field is empty when the
/// parser did not produce that component.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressParts {
    pub number: String,
    pub street: String,
    pub suffix: String,
    pub secondary_unit_type: String,
    pub secondary_unit_value: String,
    pub raw: String,
}

impl AddressParts {
    /// Fallback used when parsing fails: only the raw text survives.
    pub fn empty(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            ..Default::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    pub fn has_secondary_unit(&self) -> bool {
        !self.secondary_unit_type.is_empty() || !self.secondary_unit_value.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    /// Index into the record store, assigned at load time.
    pub position: usize,
    pub record_id: String,
    pub family_name: String,
    pub phone_number: String,
    pub household_zip: String,
    pub address_raw: String,
    pub address_parts: AddressParts,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadStats {
    pub records: usize,
    pub blank_addresses: usize,
    pub address_parse_failures: usize,
}

/// Position-indexed, read-only table of the household fields for a run.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<PersonRecord>,
    stats: LoadStats,
}

impl RecordStore {
    pub fn from_rows<P>(rows: Vec<PiiRow>, parser: &P) -> Self
    where
        P: AddressParser + ?Sized,
    {
        let mut stats = LoadStats::default();
        let mut records = Vec::with_capacity(rows.len());
        for (position, row) in rows.into_iter().enumerate() {
            let raw = row.household_street_address;
            let address_parts = if raw.trim().is_empty() {
                stats.blank_addresses += 1;
                AddressParts::empty(&raw)
            } else {
                match parser.parse(&raw) {
                    Ok(parts) => parts,
                    Err(e) => {
                        log::debug!("address parse failed at position {}: {}", position, e);
                        stats.address_parse_failures += 1;
                        AddressParts::empty(&raw)
                    }
                }
            };
            records.push(PersonRecord {
                position,
                record_id: row.record_id,
                family_name: row.family_name,
                phone_number: row.phone_number,
                household_zip: row.household_zip,
                address_raw: raw,
                address_parts,
            });
        }
        stats.records = records.len();
        Self { records, stats }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&PersonRecord> {
        self.records.get(position)
    }

    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    /// Records in `[start, end)`.
    pub fn slice(&self, range: std::ops::Range<usize>) -> &[PersonRecord] {
        &self.records[range]
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }
}

impl std::ops::Index<usize> for RecordStore {
    type Output = PersonRecord;

    fn index(&self, position: usize) -> &PersonRecord {
        &self.records[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::UsAddressParser;

    fn row(id: &str, addr: &str) -> PiiRow {
        PiiRow {
            record_id: id.into(),
            family_name: "SMITH".into(),
            phone_number: "6145551234".into(),
            household_street_address: addr.into(),
            household_zip: "43215".into(),
        }
    }

    #[test]
    fn positions_follow_input_order() {
        let store = RecordStore::from_rows(
            vec![row("a", "1 MAIN ST"), row("b", "2 MAIN ST")],
            &UsAddressParser::default(),
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store[1].position, 1);
        assert_eq!(store[1].record_id, "b");
        assert_eq!(store[0].address_parts.street, "MAIN");
    }

    #[test]
    fn blank_and_unparsable_addresses_are_kept() {
        let store = RecordStore::from_rows(
            vec![row("a", "   "), row("b", "###"), row("c", "9 ELM AVE")],
            &UsAddressParser::default(),
        );
        assert_eq!(store.len(), 3);
        let stats = store.stats();
        assert_eq!(stats.blank_addresses, 1);
        assert_eq!(stats.address_parse_failures, 1);
        assert_eq!(store[1].address_parts, AddressParts::empty("###"));
        assert!(store[0].address_parts.is_blank());
    }
}
