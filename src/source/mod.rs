//! Identifier sources
//!
//! An [`IdentifierSource`] yields the unique Tweet identifiers for a session.
//! [`InboxSource`] reads them from a directory of exported files and archives
//! each consumed file so a later run does not pick it up again.

use crate::IdentifierSet;

pub mod inbox;

pub use inbox::InboxSource;

/// Identifier loading errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Document could not be parsed
    #[error("parse error in {file}: {message}")]
    ParseError {
        /// File being read
        file: String,
        /// What went wrong
        message: String,
    },

    /// CSV read error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Gzip decompression error
    #[error("gzip error: {0}")]
    GzipError(String),
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Yields the identifiers to process
pub trait IdentifierSource {
    /// Load unique identifiers, in first-seen order
    fn load_identifiers(&mut self) -> SourceResult<IdentifierSet>;
}

impl IdentifierSource for IdentifierSet {
    fn load_identifiers(&mut self) -> SourceResult<IdentifierSet> {
        Ok(std::mem::take(self))
    }
}
