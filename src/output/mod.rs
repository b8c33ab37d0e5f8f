//! Report and file output

use serde_json::Value;
use std::path::PathBuf;

pub mod files;
pub mod report;
pub mod timeseries;

pub use files::MetricsStore;
pub use report::render_report;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Input document lacks the expected structure
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for raw API responses
pub trait ResponseSink: Send {
    /// Persist one successful response body; returns the file written
    fn save_raw_response(&mut self, body: &Value) -> OutputResult<PathBuf>;
}
