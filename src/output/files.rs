//! On-disk layout for responses and reports
//!
//! ```text
//! outbox/[<name>/]
//!   metrics/<name>_metrics.json
//!   metrics/<name>_metrics_1.json
//!   <name>_results.csv
//! ```

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{OutputError, OutputResult, ResponseSink};

/// Name used when a session has none
pub const DEFAULT_NAME: &str = "engagement";

/// Writes raw responses and the final report under one output root
#[derive(Debug, Clone)]
pub struct MetricsStore {
    root: PathBuf,
    name: String,
}

impl MetricsStore {
    /// Create a store under `outbox`
    ///
    /// With `name_based_folders` the root becomes `outbox/<name>`.
    pub fn new(outbox: impl AsRef<Path>, name: Option<&str>, name_based_folders: bool) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAME)
            .to_string();
        let outbox = outbox.as_ref();
        let root = if name_based_folders {
            outbox.join(&name)
        } else {
            outbox.to_path_buf()
        };
        Self { root, name }
    }

    /// Output root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding raw responses
    pub fn metrics_dir(&self) -> PathBuf {
        self.root.join("metrics")
    }

    /// Session name used in filenames
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First `<name>_metrics[_N].json` path that does not exist yet
    pub fn next_metrics_path(&self) -> PathBuf {
        let dir = self.metrics_dir();
        let base = format!("{}_metrics", self.name);
        let mut candidate = dir.join(format!("{base}.json"));
        let mut num = 0u32;
        while candidate.exists() {
            num += 1;
            candidate = dir.join(format!("{base}_{num}.json"));
        }
        candidate
    }

    /// Path the report is written to
    pub fn report_path(&self, partial: bool) -> PathBuf {
        let suffix = if partial { "results.partial" } else { "results" };
        self.root.join(format!("{}_{}.csv", self.name, suffix))
    }

    /// Write the report with tabs turned into commas
    ///
    /// A `partial` report marks a session that stopped early.
    pub fn write_report(&self, text: &str, partial: bool) -> OutputResult<PathBuf> {
        create_dir(&self.root)?;
        let path = self.report_path(partial);
        fs::write(&path, text.replace('\t', ","))
            .map_err(|e| OutputError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
        info!("Results written to {}", path.display());
        Ok(path)
    }
}

impl ResponseSink for MetricsStore {
    fn save_raw_response(&mut self, body: &Value) -> OutputResult<PathBuf> {
        create_dir(&self.metrics_dir())?;
        let path = self.next_metrics_path();
        let json = serde_json::to_string(body)
            .map_err(|e| OutputError::SerializationError(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| OutputError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Saved raw response: path={}", path.display());
        Ok(path)
    }
}

fn create_dir(dir: &Path) -> OutputResult<()> {
    fs::create_dir_all(dir)
        .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))
}
