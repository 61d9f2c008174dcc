//! Command-line surface. Every tuning flag falls back to a `HOUSEHOLD_*`
//! environment variable, which may itself come from `.env`.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use crate::config::{
    DEFAULT_ADDRESS_PREFILTER, DEFAULT_MATCH_THRESHOLD, DEFAULT_SPLIT_FACTOR, FieldWeights,
    HouseholdConfig,
};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "household_matcher",
    version,
    about = "Group person records into households by address, name and phone",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// PII CSV with record_id, family_name, phone_number, household_street_address, household_zip
    #[arg(value_name = "PII_CSV", required_unless_present = "write_env_template")]
    pub input: Option<PathBuf>,
    /// Output directory
    #[arg(long = "out-dir", value_name = "DIR", default_value = "output")]
    pub out_dir: PathBuf,
    /// Number of record partitions used for blocking (env: HOUSEHOLD_SPLIT_FACTOR)
    #[arg(long = "split-factor", env = "HOUSEHOLD_SPLIT_FACTOR", default_value_t = DEFAULT_SPLIT_FACTOR)]
    pub split_factor: usize,
    /// Pairs must score strictly above this (env: HOUSEHOLD_MATCH_THRESHOLD)
    #[arg(long = "match-threshold", env = "HOUSEHOLD_MATCH_THRESHOLD", default_value_t = DEFAULT_MATCH_THRESHOLD)]
    pub match_threshold: f64,
    /// Minimum address similarity before weighting (env: HOUSEHOLD_ADDRESS_PREFILTER)
    #[arg(long = "address-prefilter", env = "HOUSEHOLD_ADDRESS_PREFILTER", default_value_t = DEFAULT_ADDRESS_PREFILTER)]
    pub address_prefilter: f64,
    #[arg(long = "weight-family-name", env = "HOUSEHOLD_WEIGHT_FAMILY_NAME", default_value_t = 0.25)]
    pub weight_family_name: f64,
    #[arg(long = "weight-phone", env = "HOUSEHOLD_WEIGHT_PHONE", default_value_t = 0.2)]
    pub weight_phone: f64,
    #[arg(long = "weight-address", env = "HOUSEHOLD_WEIGHT_ADDRESS", default_value_t = 0.55)]
    pub weight_address: f64,
    /// Zero disables zip scoring (env: HOUSEHOLD_WEIGHT_ZIP)
    #[arg(long = "weight-zip", env = "HOUSEHOLD_WEIGHT_ZIP", default_value_t = 0.0)]
    pub weight_zip: f64,
    /// Run blocking batches in parallel (env: HOUSEHOLD_PARALLEL)
    #[arg(
        long = "parallel",
        env = "HOUSEHOLD_PARALLEL",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub parallel: bool,
    /// Also write household_pairs.csv with every accepted pair
    #[arg(long = "debug-pairs")]
    pub debug_pairs: bool,
    /// Write the pid files used for answer-key scoring
    #[arg(long = "test-run")]
    pub test_run: bool,
    /// Seed for the households PII row shuffle
    #[arg(long = "shuffle-seed", value_name = "SEED")]
    pub shuffle_seed: Option<u64>,
    /// Score the run against an answer key CSV (pid in column 1, household id in column 3)
    #[arg(long = "answer-key", value_name = "CSV", requires = "key_mapping")]
    pub answer_key: Option<PathBuf>,
    /// household_position,hid mapping used with --answer-key
    #[arg(long = "key-mapping", value_name = "CSV", requires = "answer_key")]
    pub key_mapping: Option<PathBuf>,
    /// Write a .env template to PATH and exit
    #[arg(long = "write-env-template", value_name = "PATH")]
    pub write_env_template: Option<PathBuf>,
}

impl Cli {
    pub fn to_config(&self) -> Result<HouseholdConfig, ConfigError> {
        let cfg = HouseholdConfig {
            split_factor: self.split_factor,
            weights: FieldWeights {
                family_name: self.weight_family_name,
                phone_number: self.weight_phone,
                address: self.weight_address,
                zip: self.weight_zip,
            },
            match_threshold: self.match_threshold,
            address_prefilter_threshold: self.address_prefilter,
            parallel: self.parallel,
            debug_pairs: self.debug_pairs,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_to_default_config() {
        let cli = Cli::try_parse_from(["household_matcher", "pii.csv"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("pii.csv")));
        assert_eq!(cli.to_config().unwrap(), HouseholdConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "household_matcher",
            "pii.csv",
            "--split-factor",
            "9",
            "--weight-zip",
            "0.1",
            "--parallel",
            "--debug-pairs",
        ])
        .unwrap();
        let cfg = cli.to_config().unwrap();
        assert_eq!(cfg.split_factor, 9);
        assert_eq!(cfg.weights.zip, 0.1);
        assert!(cfg.parallel);
        assert!(cfg.debug_pairs);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let cli =
            Cli::try_parse_from(["household_matcher", "pii.csv", "--split-factor", "0"]).unwrap();
        assert!(cli.to_config().is_err());
    }

    #[test]
    fn input_optional_only_for_template() {
        assert!(Cli::try_parse_from(["household_matcher"]).is_err());
        let cli =
            Cli::try_parse_from(["household_matcher", "--write-env-template", ".env.template"])
                .unwrap();
        assert!(cli.input.is_none());
    }

    #[test]
    fn answer_key_requires_mapping() {
        assert!(
            Cli::try_parse_from(["household_matcher", "pii.csv", "--answer-key", "key.csv"])
                .is_err()
        );
    }
}
