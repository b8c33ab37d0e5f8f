//! CLI command implementations

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::settings::{DEFAULT_ACCOUNT_PATH, DEFAULT_SETTINGS_PATH};

pub mod error;
pub mod reformat;
pub mod run;

pub use error::CliError;
pub use reformat::ReformatArgs;
pub use run::{RunArgs, RunStatus};

/// Engagement Collector CLI
#[derive(Parser, Debug)]
#[command(name = "engagement-collector")]
#[command(about = "Collect engagement metrics for batches of Tweet IDs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Account file with API credentials
    #[arg(short = 'a', long, global = true, default_value = DEFAULT_ACCOUNT_PATH)]
    pub account: PathBuf,

    /// Application settings file
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    pub config: PathBuf,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect metrics for every Tweet ID in the inbox
    Run(RunArgs),

    /// Turn a saved time-series response into per-Tweet CSV files
    Reformat(ReformatArgs),
}
