//! Run command implementation
//!
//! Loads settings and identifiers, runs one session, and writes the report.

use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use super::{Cli, CliError};
use crate::output::{render_report, MetricsStore};
use crate::session::{SessionExecutor, SessionOutcome};
use crate::settings::{parse_date_spec, AccountSettings, AppSettings};
use crate::source::{IdentifierSource, InboxSource};
use crate::transport::http::{BearerToken, HttpTransport};
use crate::Endpoint;

/// Arguments for a collection run
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Dataset name used to label output (overrides settings)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Endpoint: totals, 28hr, or historical (overrides settings)
    #[arg(short, long)]
    pub point: Option<Endpoint>,

    /// Start of the historical period (e.g., 14d, 201601011200, 2016-01-01)
    #[arg(short, long)]
    pub start_date: Option<String>,

    /// End of the historical period
    #[arg(short, long)]
    pub end_date: Option<String>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

/// How a run finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The inbox held no identifiers
    NothingToProcess,
    /// Every batch was attempted and the report written
    Completed {
        /// Report file
        report: PathBuf,
    },
}

impl RunArgs {
    /// Execute the run command
    ///
    /// An aborted session still writes its partial report before returning
    /// [`CliError::SessionAborted`].
    pub async fn execute(&self, cli: &Cli) -> Result<RunStatus, CliError> {
        let settings = AppSettings::from_file(&cli.config)?;
        let s = &settings.engagement_settings;

        let endpoint = match self.point {
            Some(endpoint) => endpoint,
            None => settings.endpoint()?,
        };
        let name = self.name.clone().or_else(|| s.name.clone());
        let (start, end) = self.date_range(&settings, Utc::now())?;
        let config = settings.session_config(endpoint, start, end)?;

        if let Some(addr) = self.metrics_addr {
            crate::metrics::init_metrics(addr)
                .await
                .map_err(|e| CliError::MetricsError(e.to_string()))?;
        }

        let mut source = InboxSource::new(&s.inbox);
        if !source.has_files()? {
            info!("No Tweet IDs to process, quitting.");
            return Ok(RunStatus::NothingToProcess);
        }

        // Loading the inbox archives its files, so credentials come first
        let account = AccountSettings::from_file(&cli.account)?;
        let transport = HttpTransport::new(
            account.base_url(),
            BearerToken::new(account.engagement_api.bearer_token.clone()),
        )?;

        let store = MetricsStore::new(&s.outbox, name.as_deref(), s.name_based_folders);
        let mut executor =
            SessionExecutor::new(transport, config)?.with_response_sink(store.clone());

        let ids = source.load_identifiers()?;
        if ids.is_empty() {
            info!("No Tweet IDs to process, quitting.");
            return Ok(RunStatus::NothingToProcess);
        }

        info!(
            endpoint = %endpoint,
            identifiers = ids.len(),
            outbox = %store.root().display(),
            "Starting engagement session"
        );

        let spinner = create_spinner(endpoint, ids.len());
        let result = executor.run(&ids).await;
        spinner.finish_and_clear();
        let report = result?;

        let text = render_report(&report, name.as_deref());
        let path = store.write_report(&text, !report.is_success())?;

        match report.outcome {
            SessionOutcome::Completed => {
                info!(
                    requests = report.stats.requests,
                    skipped = report.stats.skipped,
                    "Engagement session completed, results in {}",
                    path.display()
                );
                Ok(RunStatus::Completed { report: path })
            }
            SessionOutcome::Aborted(reason) => {
                error!("Session aborted, partial results in {}", path.display());
                Err(CliError::SessionAborted(reason))
            }
        }
    }

    /// Command-line dates replace both settings dates when either is given
    fn date_range(
        &self,
        settings: &AppSettings,
        now: DateTime<Utc>,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), CliError> {
        if self.start_date.is_none() && self.end_date.is_none() {
            return Ok(settings.date_range(now)?);
        }
        let parse = |spec: &Option<String>| {
            spec.as_deref()
                .map(|spec| parse_date_spec(spec, now))
                .transpose()
        };
        Ok((parse(&self.start_date)?, parse(&self.end_date)?))
    }
}

fn create_spinner(endpoint: Endpoint, identifiers: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("{identifiers} Tweet IDs via /{endpoint}"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
