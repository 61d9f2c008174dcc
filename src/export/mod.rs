//! Output artifacts of a household run.

pub mod csv_export;

pub use csv_export::{ExportOptions, ExportedFiles, HouseholdPiiRow, export_run};
