use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::ExportError;
use crate::matching::{Household, MatchPair};
use crate::models::RecordStore;
use crate::orchestrator::HouseholdRun;
use crate::orchestrator::summary::RunSummary;

pub const MAPPING_HEADERS: [&str; 2] = ["HOUSEHOLD_POSITION", "PII_POSITIONS"];
pub const HOUSEHOLD_POS_PID_HEADERS: [&str; 2] = ["household_position", "pid"];

/// One row of the households PII file handed to the hashing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseholdPiiRow {
    pub family_name: String,
    pub phone_number: String,
    pub household_street_address: String,
    pub household_zip: String,
    /// Member record ids, comma-joined in position order.
    pub record_ids: String,
}

fn csv_writer<W: Write>(out: W, headers: bool) -> Writer<BufWriter<W>> {
    WriterBuilder::new()
        .has_headers(headers)
        .from_writer(BufWriter::with_capacity(512 * 1024, out))
}

fn join_positions(members: &[usize]) -> String {
    members
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `HOUSEHOLD_POSITION,PII_POSITIONS` with members comma-joined.
pub fn write_household_mapping<W: Write>(
    out: W,
    households: &[Household],
) -> Result<(), ExportError> {
    let mut w = csv_writer(out, true);
    w.write_record(MAPPING_HEADERS)?;
    for hh in households {
        w.write_record([hh.id.to_string(), join_positions(&hh.members)])?;
    }
    w.flush()?;
    Ok(())
}

/// Representative PII (lowest member position) plus member record ids.
pub fn household_pii_rows(
    households: &[Household],
    store: &RecordStore,
) -> Result<Vec<HouseholdPiiRow>, ExportError> {
    households
        .iter()
        .map(|hh| -> Result<HouseholdPiiRow, ExportError> {
            let rep_pos = hh.representative();
            let rep = store
                .get(rep_pos)
                .ok_or(ExportError::UnknownPosition(rep_pos))?;
            let ids = hh
                .members
                .iter()
                .map(|&p| {
                    store
                        .get(p)
                        .map(|r| r.record_id.as_str())
                        .ok_or(ExportError::UnknownPosition(p))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(HouseholdPiiRow {
                family_name: rep.family_name.clone(),
                phone_number: rep.phone_number.clone(),
                household_street_address: rep.address_raw.clone(),
                household_zip: rep.household_zip.clone(),
                record_ids: ids.join(","),
            })
        })
        .collect()
}

/// Writes the households PII table in shuffled order so that row order does
/// not reveal household positions. A seed makes the order reproducible.
pub fn write_households_pii<W: Write>(
    out: W,
    mut rows: Vec<HouseholdPiiRow>,
    shuffle_seed: Option<u64>,
) -> Result<(), ExportError> {
    let mut rng = match shuffle_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    rows.shuffle(&mut rng);
    let mut w = csv_writer(out, true);
    for row in &rows {
        w.serialize(row)?;
    }
    if rows.is_empty() {
        w.write_record([
            "family_name",
            "phone_number",
            "household_street_address",
            "household_zip",
            "record_ids",
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Debug dump of accepted pairs: two integer columns, no header.
pub fn write_match_pairs<W: Write>(out: W, pairs: &[MatchPair]) -> Result<(), ExportError> {
    let mut w = csv_writer(out, false);
    for p in pairs {
        w.write_record([p.a.to_string(), p.b.to_string()])?;
    }
    w.flush()?;
    Ok(())
}

/// `household_position,pid` for every member; used to score against an answer key.
pub fn write_member_pids<W: Write>(
    out: W,
    households: &[Household],
    store: &RecordStore,
) -> Result<(), ExportError> {
    let mut w = csv_writer(out, true);
    w.write_record(HOUSEHOLD_POS_PID_HEADERS)?;
    for hh in households {
        for &p in &hh.members {
            let r = store.get(p).ok_or(ExportError::UnknownPosition(p))?;
            w.write_record([hh.id.to_string(), r.record_id.clone()])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// `household_position,pid` for each household's representative record.
pub fn write_representative_pids<W: Write>(
    out: W,
    households: &[Household],
    store: &RecordStore,
) -> Result<(), ExportError> {
    let mut w = csv_writer(out, true);
    w.write_record(HOUSEHOLD_POS_PID_HEADERS)?;
    for hh in households {
        let p = hh.representative();
        let r = store.get(p).ok_or(ExportError::UnknownPosition(p))?;
        w.write_record([hh.id.to_string(), r.record_id.clone()])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_summary_json<W: Write>(out: W, summary: &RunSummary) -> Result<(), ExportError> {
    let mut out = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, summary)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    /// Appended to the households PII and summary file names.
    pub timestamp: String,
    /// Also write the answer-key scoring files.
    pub test_run: bool,
    /// Write `household_pairs.csv` from the run's retained pairs.
    pub debug_pairs: bool,
    pub shuffle_seed: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportedFiles {
    pub mapping: PathBuf,
    pub households_pii: PathBuf,
    pub summary: PathBuf,
    pub match_pairs: Option<PathBuf>,
    pub member_pids: Option<PathBuf>,
    pub representative_pids: Option<PathBuf>,
}

fn create(path: &Path) -> Result<File, ExportError> {
    Ok(File::create(path)?)
}

/// Write every artifact of a run into `opts.out_dir`.
pub fn export_run(
    run: &HouseholdRun,
    store: &RecordStore,
    opts: &ExportOptions,
) -> Result<ExportedFiles, ExportError> {
    if opts.debug_pairs && run.match_pairs.is_empty() && run.summary.match_pairs > 0 {
        return Err(ExportError::PairsNotRetained(run.summary.match_pairs));
    }
    std::fs::create_dir_all(&opts.out_dir)?;
    let dir = &opts.out_dir;
    let mut files = ExportedFiles {
        mapping: dir.join("households.csv"),
        households_pii: dir.join(format!("households_pii-{}.csv", opts.timestamp)),
        summary: dir.join(format!("households_summary-{}.json", opts.timestamp)),
        ..Default::default()
    };

    write_household_mapping(create(&files.mapping)?, &run.households)?;
    let rows = household_pii_rows(&run.households, store)?;
    write_households_pii(create(&files.households_pii)?, rows, opts.shuffle_seed)?;
    write_summary_json(create(&files.summary)?, &run.summary)?;

    if opts.debug_pairs {
        let path = dir.join("household_pairs.csv");
        write_match_pairs(create(&path)?, &run.match_pairs)?;
        files.match_pairs = Some(path);
    }
    if opts.test_run {
        let members = dir.join("hh_pos_patids.csv");
        write_member_pids(create(&members)?, &run.households, store)?;
        files.member_pids = Some(members);
        let reps = dir.join("household_pos_pid.csv");
        write_representative_pids(create(&reps)?, &run.households, store)?;
        files.representative_pids = Some(reps);
    }
    log::info!(
        "Wrote {} households to {}",
        run.households.len(),
        files.mapping.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::UsAddressParser;
    use crate::models::PiiRow;
    use pretty_assertions::assert_eq;

    fn store() -> RecordStore {
        let row = |id: &str, fam: &str, addr: &str| PiiRow {
            record_id: id.into(),
            family_name: fam.into(),
            phone_number: "6145551234".into(),
            household_street_address: addr.into(),
            household_zip: "43215".into(),
        };
        RecordStore::from_rows(
            vec![
                row("r0", "SMITH", "205 GARDEN ST"),
                row("r1", "SMITH", "205 GARDEN ST"),
                row("r2", "LEE", "1 ELM AVE"),
                row("r3", "SMITH", "205 GAREDN ST"),
            ],
            &UsAddressParser,
        )
    }

    fn households() -> Vec<Household> {
        vec![
            Household {
                id: 0,
                members: vec![0, 1, 3],
            },
            Household {
                id: 1,
                members: vec![2],
            },
        ]
    }

    fn as_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn mapping_file_layout() {
        let mut buf = Vec::new();
        write_household_mapping(&mut buf, &households()).unwrap();
        assert_eq!(
            as_string(buf),
            "HOUSEHOLD_POSITION,PII_POSITIONS\n0,\"0,1,3\"\n1,2\n"
        );
    }

    #[test]
    fn pii_rows_use_representative() {
        let rows = household_pii_rows(&households(), &store()).unwrap();
        assert_eq!(rows[0].record_ids, "r0,r1,r3");
        assert_eq!(rows[0].household_street_address, "205 GARDEN ST");
        assert_eq!(rows[1].family_name, "LEE");
        assert_eq!(rows[1].record_ids, "r2");
    }

    #[test]
    fn pii_file_has_header_and_all_rows() {
        let rows = household_pii_rows(&households(), &store()).unwrap();
        let mut buf = Vec::new();
        write_households_pii(&mut buf, rows, Some(7)).unwrap();
        let text = as_string(buf);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("family_name,phone_number,household_street_address,household_zip,record_ids")
        );
        let mut body: Vec<_> = lines.collect();
        body.sort();
        assert_eq!(
            body,
            vec![
                "LEE,6145551234,1 ELM AVE,43215,r2",
                "SMITH,6145551234,205 GARDEN ST,43215,\"r0,r1,r3\"",
            ]
        );
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let rows: Vec<_> = (0..20)
            .map(|i| HouseholdPiiRow {
                family_name: format!("F{}", i),
                phone_number: String::new(),
                household_street_address: String::new(),
                household_zip: String::new(),
                record_ids: i.to_string(),
            })
            .collect();
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_households_pii(&mut a, rows.clone(), Some(42)).unwrap();
        write_households_pii(&mut b, rows, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn pairs_dump_has_no_header() {
        let mut buf = Vec::new();
        let pairs = [
            MatchPair { a: 0, b: 1, score: 1.0 },
            MatchPair { a: 1, b: 3, score: 0.9 },
        ];
        write_match_pairs(&mut buf, &pairs).unwrap();
        assert_eq!(as_string(buf), "0,1\n1,3\n");
    }

    #[test]
    fn pid_files() {
        let mut members = Vec::new();
        write_member_pids(&mut members, &households(), &store()).unwrap();
        assert_eq!(
            as_string(members),
            "household_position,pid\n0,r0\n0,r1\n0,r3\n1,r2\n"
        );
        let mut reps = Vec::new();
        write_representative_pids(&mut reps, &households(), &store()).unwrap();
        assert_eq!(as_string(reps), "household_position,pid\n0,r0\n1,r2\n");
    }

    #[test]
    fn pairs_dump_refused_when_run_dropped_pairs() {
        use crate::config::HouseholdConfig;
        use crate::orchestrator::infer_households;

        let s = store();
        let run = infer_households(&s, &HouseholdConfig::default(), |_| {}).unwrap();
        assert!(run.match_pairs.is_empty());
        assert!(run.summary.match_pairs > 0);
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let opts = ExportOptions {
            out_dir: out_dir.clone(),
            timestamp: "t".into(),
            test_run: false,
            debug_pairs: true,
            shuffle_seed: Some(3),
        };
        assert!(matches!(
            export_run(&run, &s, &opts),
            Err(ExportError::PairsNotRetained(n)) if n == run.summary.match_pairs
        ));
        assert!(!out_dir.exists());
    }

    #[test]
    fn unknown_position_is_an_error() {
        let bad = vec![Household {
            id: 0,
            members: vec![9],
        }];
        assert!(matches!(
            household_pii_rows(&bad, &store()),
            Err(ExportError::UnknownPosition(9))
        ));
    }
}
