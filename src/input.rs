use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::InputError;
use crate::models::PiiRow;

const REQUIRED_COLUMNS: [&str; 5] = [
    "record_id",
    "family_name",
    "phone_number",
    "household_street_address",
    "household_zip",
];

/// Read PII rows from CSV with a header row. Every value is taken as text,
/// including zips and phone numbers that look numeric.
pub fn read_pii_rows<R: Read>(reader: R) -> Result<Vec<PiiRow>, InputError> {
    // header names are matched after trimming; values stay as written
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(InputError::MissingColumn(col));
        }
    }
    let mut rows = Vec::new();
    for rec in rdr.deserialize::<PiiRow>() {
        rows.push(rec?);
    }
    Ok(rows)
}

pub fn read_pii_csv(path: &Path) -> Result<Vec<PiiRow>, InputError> {
    let file = std::fs::File::open(path)?;
    read_pii_rows(std::io::BufReader::with_capacity(512 * 1024, file))
}
