//! CLI error types and conversions

use crate::output::OutputError;
use crate::session::{BusinessError, SessionError};
use crate::settings::SettingsError;
use crate::source::SourceError;
use crate::transport::TransportError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings error
    #[error("settings error: {0}")]
    SettingsError(#[from] SettingsError),

    /// Identifier source error
    #[error("source error: {0}")]
    SourceError(#[from] SourceError),

    /// Session error
    #[error("session error: {0}")]
    SessionError(#[from] SessionError),

    /// Transport error
    #[error("transport error: {0}")]
    TransportError(#[from] TransportError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Session stopped early; a partial report was written
    #[error("session aborted: {0}")]
    SessionAborted(BusinessError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Metrics exporter could not be installed
    #[error("metrics error: {0}")]
    MetricsError(String),
}
