use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(
        "weights sum to {max_score:.4}, which can never exceed match_threshold {threshold:.4}"
    )]
    Unsatisfiable { max_score: f64, threshold: f64 },
}

/// Raised by an [`crate::address::AddressParser`] when no structure could be
/// recovered from the address text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address is empty")]
    Empty,
    #[error("no street components recognized in {0:?}")]
    Unrecognized(String),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input is missing required column: {0}")]
    MissingColumn(&'static str),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("summary serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("household references unknown position {0}")]
    UnknownPosition(usize),
    #[error("{0} match pairs were found but not retained; run with debug_pairs to dump them")]
    PairsNotRetained(usize),
}

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("answer key is empty")]
    EmptyAnswerKey,
}
