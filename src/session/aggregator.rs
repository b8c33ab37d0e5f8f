//! Running totals and top-N boards
//!
//! The [`Aggregator`] owns the session's [`TotalsTable`] and one [`TopBoard`]
//! per metric type. Batches are merged in the order they complete; boards are
//! sorted once with [`Aggregator::finalize`] when the session ends.

use tracing::debug;

use super::classifier::BatchResult;
use crate::TweetId;

/// Running non-negative count per metric type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalsTable {
    counts: Vec<(String, u64)>,
}

impl TotalsTable {
    /// Create a table with a zero entry for each metric type
    pub fn new(metric_types: &[String]) -> Self {
        Self {
            counts: metric_types.iter().map(|t| (t.clone(), 0)).collect(),
        }
    }

    /// Add `count` to a metric type; unknown types are ignored
    fn add(&mut self, metric_type: &str, count: u64) {
        if let Some((_, total)) = self.counts.iter_mut().find(|(t, _)| t == metric_type) {
            *total = total.saturating_add(count);
        }
    }

    /// Current total for a metric type
    pub fn get(&self, metric_type: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|(t, _)| t == metric_type)
            .map(|(_, total)| *total)
    }

    /// `(metric type, total)` pairs in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, total)| (t.as_str(), *total))
    }

    /// Number of metric types tracked
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no metric types are tracked
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// One leaderboard entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopEntry {
    /// Identifier
    pub id: TweetId,
    /// Count for the board's metric type
    pub count: u64,
}

/// Fixed-capacity leaderboard for one metric type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopBoard {
    capacity: usize,
    entries: Vec<TopEntry>,
}

impl TopBoard {
    /// Create an empty board holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    /// Offer a candidate; returns whether it was admitted
    ///
    /// A candidate is admitted while the board has room, or when its count
    /// exceeds the current minimum. Admission past capacity evicts the first
    /// minimum-count entry found in board order.
    pub fn offer(&mut self, id: TweetId, count: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity {
            match self.min_count() {
                Some(min) if count > min => {}
                _ => return false,
            }
        }

        self.entries.push(TopEntry { id, count });
        if self.entries.len() > self.capacity {
            self.evict_min();
        }
        true
    }

    fn min_count(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.count).min()
    }

    fn evict_min(&mut self) {
        // min_by_key returns the first of equal minima
        if let Some((idx, _)) = self.entries.iter().enumerate().min_by_key(|(_, e)| e.count) {
            self.entries.remove(idx);
        }
    }

    /// Sort descending by count, keeping board order among ties
    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
    }

    /// Entries in current order
    pub fn entries(&self) -> &[TopEntry] {
        &self.entries
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the board holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merges per-batch results into totals and boards
#[derive(Debug, Clone)]
pub struct Aggregator {
    totals: TotalsTable,
    boards: Vec<(String, TopBoard)>,
    top_n: usize,
    finalized: bool,
}

impl Aggregator {
    /// Create an aggregator for the session's metric types
    pub fn new(metric_types: &[String], top_n: usize) -> Self {
        let boards = if top_n > 0 {
            metric_types
                .iter()
                .map(|t| (t.clone(), TopBoard::new(top_n)))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            totals: TotalsTable::new(metric_types),
            boards,
            top_n,
            finalized: false,
        }
    }

    /// Merge one batch; metric types outside the session are ignored
    pub fn merge(&mut self, result: &BatchResult) {
        let mut merged = 0usize;
        for tweet in &result.tweets {
            for (metric_type, count) in &tweet.counts {
                if self.totals.get(metric_type).is_none() {
                    continue;
                }
                if let Some((_, board)) = self.boards.iter_mut().find(|(t, _)| t == metric_type) {
                    board.offer(tweet.id, *count);
                }
                if *count > 0 {
                    self.totals.add(metric_type, *count);
                }
                merged += 1;
            }
        }
        debug!(tweets = result.tweets.len(), merged, "Merged batch into totals");
    }

    /// Sort every board; further calls are no-ops
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        for (_, board) in &mut self.boards {
            board.sort();
        }
        self.finalized = true;
    }

    /// Whether boards have been sorted
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Board width; zero disables boards
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Totals table
    pub fn totals(&self) -> &TotalsTable {
        &self.totals
    }

    /// Board for a metric type
    pub fn board(&self, metric_type: &str) -> Option<&TopBoard> {
        self.boards
            .iter()
            .find(|(t, _)| t == metric_type)
            .map(|(_, board)| board)
    }

    /// `(metric type, board)` pairs in configuration order
    pub fn boards(&self) -> impl Iterator<Item = (&str, &TopBoard)> {
        self.boards.iter().map(|(t, board)| (t.as_str(), board))
    }
}
