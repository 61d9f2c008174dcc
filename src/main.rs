use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use household_matcher::address::UsAddressParser;
use household_matcher::cli::Cli;
use household_matcher::evaluate::{read_answer_key, read_two_columns, score_households};
use household_matcher::export::{ExportOptions, ExportedFiles, export_run};
use household_matcher::input::read_pii_csv;
use household_matcher::models::RecordStore;
use household_matcher::orchestrator::infer_households;
use household_matcher::util::envfile::{load_dotenv_if_present, write_env_template};

fn tracing_requested() -> bool {
    std::env::var("HOUSEHOLD_MATCHER_TRACING")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn init_logging() {
    #[cfg(feature = "tracing")]
    {
        if tracing_requested() {
            household_matcher::logging::init_tracing_from_env();
            return;
        }
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if tracing_requested() {
        log::warn!("HOUSEHOLD_MATCHER_TRACING set but built without the `tracing` feature");
    }
}

fn main() {
    // .env first so RUST_LOG and HOUSEHOLD_* from the file are visible to both
    let dotenv = load_dotenv_if_present();
    init_logging();
    if let Err(e) = dotenv {
        log::warn!("could not read .env: {:#}", e);
    }
    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.write_env_template {
        write_env_template(path)
            .with_context(|| format!("writing env template to {}", path.display()))?;
        info!("Wrote {}", path.display());
        return Ok(());
    }
    let cfg = cli.to_config().context("invalid configuration")?;
    let input = cli.input.as_deref().context("no input CSV given")?;

    let started = Instant::now();
    let rows = read_pii_csv(input).with_context(|| format!("reading {}", input.display()))?;
    let store = RecordStore::from_rows(rows, &UsAddressParser);
    let stats = store.stats();
    info!(
        "Loaded {} records from {} ({} blank addresses, {} unparsed)",
        stats.records,
        input.display(),
        stats.blank_addresses,
        stats.address_parse_failures
    );

    let run = infer_households(&store, &cfg, |u| {
        info!(
            "[{}] {:.1}% ({}/{}) candidates={} matches={} mem used={}MB avail={}MB",
            u.stage,
            u.percent,
            u.processed,
            u.total,
            u.candidates,
            u.matches,
            u.mem_used_mb,
            u.mem_avail_mb
        );
    })?;

    let opts = ExportOptions {
        out_dir: cli.out_dir.clone(),
        timestamp: chrono::Local::now().format("%Y%m%dT%H%M%S").to_string(),
        test_run: cli.test_run || cli.answer_key.is_some(),
        debug_pairs: cli.debug_pairs,
        shuffle_seed: cli.shuffle_seed,
    };
    let files = export_run(&run, &store, &opts)
        .with_context(|| format!("writing outputs to {}", opts.out_dir.display()))?;

    if let (Some(key), Some(mapping)) = (&cli.answer_key, &cli.key_mapping) {
        evaluate(&files, key, mapping)?;
    }
    info!(
        "Done: {} households from {} records in {:.2?}",
        run.summary.households,
        run.summary.records,
        started.elapsed()
    );
    Ok(())
}

fn open(path: &std::path::Path) -> Result<BufReader<File>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufReader::new(f))
}

fn evaluate(files: &ExportedFiles, key: &std::path::Path, mapping: &std::path::Path) -> Result<()> {
    let members_path = files
        .member_pids
        .as_deref()
        .context("member pid file was not written")?;
    let answer_key = read_answer_key(open(key)?)?;
    let position_to_hid: HashMap<String, String> = read_two_columns(open(mapping)?)?.into_iter().collect();
    let members = read_two_columns(open(members_path)?)?;
    let score = score_households(&members, &answer_key, &position_to_hid)?;
    info!(
        "Answer key: precision={:.4} recall={:.4} f={:.4} (tp={} fp={} key={})",
        score.precision,
        score.recall,
        score.f_score,
        score.true_positives,
        score.false_positives,
        score.answer_key_size
    );
    Ok(())
}
