//! Partition identifiers into request-sized batches

use super::SessionError;
use crate::TweetId;

/// One bounded group of identifiers sent as a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of this batch in the session
    pub index: usize,
    /// Identifiers in input order
    pub ids: Vec<TweetId>,
}

impl Batch {
    /// Number of identifiers in the batch
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the batch holds no identifiers
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Split identifiers into batches of at most `limit`, preserving order
///
/// Produces `ceil(len / limit)` batches; only the last may be shorter.
///
/// # Errors
/// Returns [`SessionError::ConfigError`] when `limit` is zero.
pub fn partition(ids: &[TweetId], limit: usize) -> Result<Vec<Batch>, SessionError> {
    if limit == 0 {
        return Err(SessionError::ConfigError(
            "batch limit must be positive".to_string(),
        ));
    }

    Ok(ids
        .chunks(limit)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            ids: chunk.to_vec(),
        })
        .collect())
}
