pub mod address;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod export;
pub mod input;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod util;

#[cfg(feature = "tracing")]
pub mod logging;
