//! Batch-request orchestration
//!
//! This module drives a collection session from a loaded identifier set to a
//! finalized set of totals and top-N boards.
//!
//! # Overview
//!
//! 1. **Batching**: Split identifiers into endpoint-sized batches with [`batcher::partition`]
//! 2. **Request Building**: Resolve metric types, groupings, and dates via [`request::RequestBuilder`]
//! 3. **Classification**: Sort each response into success, retryable, or fatal with [`classifier::classify`]
//! 4. **Pacing**: Space requests under the configured budget with [`rate_limit::RateLimiter`]
//! 5. **Aggregation**: Merge per-batch counts into totals and boards with [`aggregator::Aggregator`]
//! 6. **Execution**: [`executor::SessionExecutor`] runs the loop and owns the session state
//!
//! # Quick Start
//!
//! ```no_run
//! use engagement_collector::session::{SessionConfig, SessionExecutor};
//! use engagement_collector::transport::http::{BearerToken, HttpTransport};
//! use engagement_collector::{Endpoint, IdentifierSet};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::builder(Endpoint::Historical)
//!     .metric_type("impressions", true)
//!     .grouping("by_tweet_type", ["tweet.id", "engagement.type"])
//!     .rate_limit(6, std::time::Duration::from_secs(60))
//!     .build()?;
//! let transport = HttpTransport::new("https://data-api.twitter.com", BearerToken::new("t"))?;
//! let ids: IdentifierSet = [1u64, 2, 3].into_iter().collect();
//!
//! let report = SessionExecutor::new(transport, config)?.run(&ids).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Only configuration problems and an empty identifier set surface as
//! [`SessionError`]. Per-batch failures are logged and skipped; an
//! authentication failure ends the session with [`SessionState::Aborted`] and
//! is reported through [`SessionReport::outcome`].

pub mod aggregator;
pub mod batcher;
pub mod classifier;
pub mod config;
pub mod executor;
pub mod rate_limit;
pub mod request;

pub use aggregator::{Aggregator, TopBoard, TopEntry, TotalsTable};
pub use batcher::{partition, Batch};
pub use classifier::{
    classify, ApiResponse, BatchResult, BusinessError, ResponseOutcome, RetryKind, TweetMetrics,
};
pub use config::{RateBudget, SessionConfig, SessionConfigBuilder};
pub use executor::{SessionExecutor, SessionOutcome, SessionReport, SessionState, SessionStats};
pub use rate_limit::RateLimiter;
pub use request::{RequestBuilder, RequestPayload};

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Invalid or missing settings
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Identifier set was empty
    #[error("nothing to process: identifier set is empty")]
    NothingToProcess,

    /// Failed to parse a payload at the boundary
    #[error("serialization error: {0}")]
    SerializationError(String),
}
