//! Reformat command implementation

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::CliError;
use crate::output::timeseries::reformat_file;

/// Arguments for reformatting a saved response
#[derive(Parser, Debug)]
pub struct ReformatArgs {
    /// Saved API response with time-series groupings
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory the CSV files are written to
    #[arg(short, long, default_value = "./outbox/time-series")]
    pub output: PathBuf,
}

impl ReformatArgs {
    /// Execute the reformat command; returns the files written
    pub fn execute(&self) -> Result<Vec<PathBuf>, CliError> {
        info!(
            "Reformatting {} into {}",
            self.input.display(),
            self.output.display()
        );
        let written = reformat_file(&self.input, &self.output)?;
        info!("Wrote {} time-series files", written.len());
        Ok(written)
    }
}
