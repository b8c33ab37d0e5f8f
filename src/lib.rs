//! # Engagement Collector Library
//!
//! Collects engagement metrics for large corpora of Tweet identifiers. Identifiers are
//! loaded from an inbox of heterogeneous files, partitioned into bounded batches, and
//! submitted one batch at a time to a rate-limited metrics API. Per-batch results are
//! merged into running totals and a bounded top-N leaderboard per metric type.
//!
//! ## Features
//!
//! - **Batching**: Endpoint-specific batch limits with an exact partition of the input
//! - **Pacing**: Requests are spaced to stay under a requests-per-window budget
//! - **Retry Classification**: Rate-limit and forbidden-identifier errors get one repaired retry
//! - **Aggregation**: Running totals plus a bounded top-N board per metric type
//! - **Reports**: Human-readable totals/top-N report and raw response archiving
//!
//! ## Quick Start
//!
//! ```no_run
//! use engagement_collector::session::{SessionConfig, SessionExecutor};
//! use engagement_collector::transport::http::{BearerToken, HttpTransport};
//! use engagement_collector::{Endpoint, IdentifierSet};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::builder(Endpoint::Totals)
//!     .metric_type("retweets", true)
//!     .metric_type("favorites", true)
//!     .grouping("by_tweet_type", ["tweet.id", "engagement.type"])
//!     .build()?;
//!
//! let transport = HttpTransport::new(
//!     "https://data-api.twitter.com",
//!     BearerToken::new("token"),
//! )?;
//!
//! let ids: IdentifierSet = [640022366307745792u64, 640026211712786432].into_iter().collect();
//! let mut executor = SessionExecutor::new(transport, config)?;
//! let report = executor.run(&ids).await?;
//! println!("{} requests", report.stats.requests);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`source`] - Identifier loading from the inbox (JSON, NDJSON, gzip, CSV)
//! - [`session`] - Batching, request building, classification, pacing, aggregation, orchestration
//! - [`transport`] - The signed HTTP POST seam and its `reqwest` implementation
//! - [`output`] - Report rendering, raw response archiving, time-series reformatting
//! - [`settings`] - YAML settings/account loading and date specifications
//! - [`cli`] - Command-line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Observability counters
pub mod metrics;

/// Report and file output
pub mod output;

/// Batch-request orchestration engine
pub mod session;

/// Settings and account configuration
pub mod settings;

/// Identifier sources
pub mod source;

/// Signed HTTP transport
pub mod transport;

/// Numeric Tweet identifier
pub type TweetId = u64;

/// Metric types the totals endpoint accepts
pub const TOTALS_METRIC_TYPES: [&str; 3] = ["retweets", "favorites", "replies"];

/// Dimension keys that turn a grouping into a time series
pub const TIME_SERIES_KEYS: [&str; 2] = ["engagement.hour", "engagement.day"];

/// Maximum span of the historical endpoint, in days
pub const MAX_HISTORICAL_DAYS: i64 = 28;

/// Remote service mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// All-time totals for a small set of metric types
    #[serde(rename = "totals")]
    Totals,
    /// Trailing 28-hour window
    #[serde(rename = "28hr", alias = "window", alias = "28h")]
    Window,
    /// Historical range of up to 28 days
    #[serde(rename = "historical")]
    Historical,
}

impl Endpoint {
    /// Maximum number of identifiers in a single request
    pub fn max_batch_size(&self) -> usize {
        match self {
            Endpoint::Totals => 250,
            Endpoint::Window => 25,
            Endpoint::Historical => 25,
        }
    }

    /// Request path relative to the API base URL
    pub fn path(&self) -> String {
        format!("/insights/engagement/{self}")
    }

    /// Whether time-series groupings may be requested
    pub fn supports_time_series(&self) -> bool {
        match self {
            Endpoint::Totals => false,
            Endpoint::Window | Endpoint::Historical => true,
        }
    }

    /// Whether a metric type may be requested from this endpoint
    pub fn allows_metric_type(&self, metric_type: &str) -> bool {
        match self {
            Endpoint::Totals => TOTALS_METRIC_TYPES.contains(&metric_type),
            Endpoint::Window | Endpoint::Historical => true,
        }
    }

    /// Whether a date range is sent with requests
    pub fn accepts_date_range(&self) -> bool {
        matches!(self, Endpoint::Historical)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Endpoint::Totals => "totals",
            Endpoint::Window => "28hr",
            Endpoint::Historical => "historical",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "totals" => Ok(Endpoint::Totals),
            "28hr" | "28h" | "window" => Ok(Endpoint::Window),
            "historical" => Ok(Endpoint::Historical),
            _ => Err(format!(
                "Invalid endpoint: {s}. Valid options: totals, 28hr, historical"
            )),
        }
    }
}

/// A metric type and whether the session requests it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFlag {
    /// Metric type name (e.g., "impressions")
    pub name: String,
    /// Whether the metric type is enabled
    pub enabled: bool,
}

/// A named set of dimension keys requested alongside metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    /// Grouping name, echoed back as a top-level key in the response
    pub name: String,
    /// Dimension keys (e.g., "tweet.id", "engagement.type")
    pub group_by: Vec<String>,
}

impl Grouping {
    /// Create a grouping from a name and its dimension keys
    pub fn new<I, S>(name: impl Into<String>, group_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            group_by: group_by.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether any dimension key buckets by hour or day
    pub fn is_time_series(&self) -> bool {
        self.group_by
            .iter()
            .any(|key| TIME_SERIES_KEYS.contains(&key.as_str()))
    }
}

/// Ordered collection of unique identifiers
///
/// Duplicates are dropped on construction, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    ids: Vec<TweetId>,
}

impl IdentifierSet {
    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set holds no identifiers
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in first-seen order
    pub fn as_slice(&self) -> &[TweetId] {
        &self.ids
    }

    /// Iterate identifiers in first-seen order
    pub fn iter(&self) -> std::slice::Iter<'_, TweetId> {
        self.ids.iter()
    }
}

impl FromIterator<TweetId> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = TweetId>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let ids = iter.into_iter().filter(|id| seen.insert(*id)).collect();
        Self { ids }
    }
}

impl<'a> IntoIterator for &'a IdentifierSet {
    type Item = &'a TweetId;
    type IntoIter = std::slice::Iter<'a, TweetId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
