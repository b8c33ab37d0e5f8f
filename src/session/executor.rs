//! Session executor
//!
//! Drives one collection session through its states:
//!
//! ```text
//! Idle -> Batching -> { Sending -> Classifying -> [Retrying -> Sending -> Classifying] -> Aggregating }*
//!      -> Sorting -> Done
//!                    Classifying -> Aborted   (authentication failure)
//! ```
//!
//! Batches run strictly one after another. Each retryable failure gets exactly
//! one retry; anything still failing after that is skipped.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::aggregator::Aggregator;
use super::batcher::partition;
use super::classifier::{classify, BatchResult, BusinessError, ResponseOutcome};
use super::config::SessionConfig;
use super::rate_limit::RateLimiter;
use super::request::{RequestBuilder, RequestPayload};
use super::SessionError;
use crate::metrics;
use crate::output::ResponseSink;
use crate::transport::{RawResponse, Transport};
use crate::{Endpoint, IdentifierSet};

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started
    Idle,
    /// Partitioning identifiers
    Batching,
    /// Transport call in flight
    Sending,
    /// Inspecting a response
    Classifying,
    /// Waiting to re-send a repaired request
    Retrying,
    /// Merging a successful batch
    Aggregating,
    /// Finalizing boards
    Sorting,
    /// Finished normally
    Done,
    /// Stopped on a session-fatal error
    Aborted,
}

/// Counters kept across the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Transport calls issued, retries included
    pub requests: u64,
    /// Batches planned
    pub batches: usize,
    /// Batches whose response was aggregated
    pub completed: usize,
    /// Batches skipped after a failure
    pub skipped: usize,
    /// Retry attempts made
    pub retries: usize,
    /// Wall-clock time from first request to finalization
    pub elapsed: Duration,
}

/// How the session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// All batches were attempted
    Completed,
    /// Stopped early on a session-fatal error
    Aborted(BusinessError),
}

/// Everything a finished session produced
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Endpoint the session targeted
    pub endpoint: Endpoint,
    /// Number of unique identifiers loaded
    pub identifiers: usize,
    /// Terminal outcome
    pub outcome: SessionOutcome,
    /// Session counters
    pub stats: SessionStats,
    /// Finalized totals and boards
    pub aggregator: Aggregator,
    /// Terminal state, `Done` or `Aborted`
    pub state: SessionState,
}

impl SessionReport {
    /// Whether the session finished without a session-fatal error
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SessionOutcome::Completed)
    }
}

enum BatchDisposition {
    Aggregated,
    Skipped,
    Aborted(BusinessError),
}

/// Runs sessions against a transport
pub struct SessionExecutor<T: Transport> {
    transport: T,
    config: SessionConfig,
    limiter: RateLimiter,
    sink: Option<Box<dyn ResponseSink>>,
    now: Option<DateTime<Utc>>,
    state: SessionState,
    last_sent: Option<Instant>,
}

impl<T: Transport> SessionExecutor<T> {
    /// Create an executor
    ///
    /// # Errors
    /// Returns [`SessionError::ConfigError`] if the rate-limit budget is unusable.
    pub fn new(transport: T, config: SessionConfig) -> Result<Self, SessionError> {
        let limiter = RateLimiter::from_budget(config.rate_budget())?;
        Ok(Self {
            transport,
            config,
            limiter,
            sink: None,
            now: None,
            state: SessionState::Idle,
            last_sent: None,
        })
    }

    /// Archive successful raw responses through `sink`
    pub fn with_response_sink(mut self, sink: impl ResponseSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Resolve historical date ranges against a fixed time
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }

    /// Process every identifier and return the finalized results
    ///
    /// # Errors
    /// Returns [`SessionError::NothingToProcess`] for an empty identifier set and
    /// [`SessionError::ConfigError`] for an unusable batch limit. Batch-level
    /// failures are not errors; a session-fatal failure is reported through
    /// [`SessionReport::outcome`].
    pub async fn run(&mut self, ids: &IdentifierSet) -> Result<SessionReport, SessionError> {
        self.state = SessionState::Idle;
        self.last_sent = None;
        if ids.is_empty() {
            info!("No Tweet IDs to process, quitting.");
            self.transition(SessionState::Done);
            return Err(SessionError::NothingToProcess);
        }

        self.transition(SessionState::Batching);
        let endpoint = self.config.endpoint();
        let path = endpoint.path();
        let batches = partition(ids.as_slice(), self.config.batch_limit())?;
        let builder = match self.now {
            Some(now) => RequestBuilder::with_now(&self.config, now),
            None => RequestBuilder::new(&self.config),
        };
        let mut aggregator = Aggregator::new(builder.engagement_types(), self.config.top_n());
        let mut stats = SessionStats {
            batches: batches.len(),
            ..SessionStats::default()
        };

        info!(
            endpoint = %endpoint,
            identifiers = ids.len(),
            "Will make {} API requests...",
            batches.len()
        );

        let started = Instant::now();
        let mut outcome = SessionOutcome::Completed;

        for batch in &batches {
            info!("Making {} of {} requests...", batch.index + 1, batches.len());
            let payload = builder.build(batch);

            match self
                .process_batch(&path, payload, &mut stats, &mut aggregator)
                .await
            {
                BatchDisposition::Aggregated => stats.completed += 1,
                BatchDisposition::Skipped => {
                    stats.skipped += 1;
                    metrics::record_batch_skipped();
                    warn!(batch = batch.index, "Skipping batch");
                }
                BatchDisposition::Aborted(reason) => {
                    error!(batch = batch.index, "Session-fatal error, aborting: {}", reason);
                    metrics::record_session_aborted();
                    outcome = SessionOutcome::Aborted(reason);
                    break;
                }
            }

            // Pacing is measured from the most recent send, retries included
            if batch.index + 1 < batches.len() {
                let since_last = self.last_sent.map(|t| t.elapsed()).unwrap_or_default();
                self.limiter.wait_after(since_last).await;
            }
        }

        stats.elapsed = started.elapsed();

        match outcome {
            SessionOutcome::Completed => {
                self.transition(SessionState::Sorting);
                info!("Sorting Top Tweets...");
                aggregator.finalize();
                self.transition(SessionState::Done);
            }
            SessionOutcome::Aborted(_) => {
                aggregator.finalize();
                self.transition(SessionState::Aborted);
            }
        }

        info!(
            requests = stats.requests,
            completed = stats.completed,
            skipped = stats.skipped,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "Session finished"
        );

        Ok(SessionReport {
            endpoint,
            identifiers: ids.len(),
            outcome,
            stats,
            aggregator,
            state: self.state,
        })
    }

    async fn process_batch(
        &mut self,
        path: &str,
        payload: RequestPayload,
        stats: &mut SessionStats,
        aggregator: &mut Aggregator,
    ) -> BatchDisposition {
        let Some(raw) = self.send(path, &payload, stats).await else {
            return BatchDisposition::Skipped;
        };

        self.transition(SessionState::Classifying);
        let (kind, repaired) = match classify(&raw, &payload) {
            ResponseOutcome::Success { result, body } => {
                return self.aggregate(result, &body, aggregator);
            }
            ResponseOutcome::FatalError(e) => return Self::fail(e),
            ResponseOutcome::RetryableError { kind, request } => (kind, request),
        };

        if repaired.tweet_ids.is_empty() {
            warn!("No identifiers left after removing forbidden ones");
            return BatchDisposition::Skipped;
        }

        self.transition(SessionState::Retrying);
        stats.retries += 1;
        metrics::record_retry(kind.as_error().label());
        warn!("Retrying after {}", kind.as_error());
        let delay = self.limiter.wait_full().await;
        info!(
            "Slept {:.2} seconds before retrying the API request",
            delay.as_secs_f64()
        );

        let Some(raw) = self.send(path, &repaired, stats).await else {
            return BatchDisposition::Skipped;
        };

        self.transition(SessionState::Classifying);
        match classify(&raw, &repaired) {
            ResponseOutcome::Success { result, body } => self.aggregate(result, &body, aggregator),
            ResponseOutcome::FatalError(e) => Self::fail(e),
            ResponseOutcome::RetryableError { kind, .. } => {
                warn!("Still failing after retry: {}", kind.as_error());
                BatchDisposition::Skipped
            }
        }
    }

    async fn send(
        &mut self,
        path: &str,
        payload: &RequestPayload,
        stats: &mut SessionStats,
    ) -> Option<RawResponse> {
        let body = match payload.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!("Could not serialize request: {}", e);
                return None;
            }
        };

        self.transition(SessionState::Sending);
        stats.requests += 1;
        self.last_sent = Some(Instant::now());
        match self.transport.post(path, &body).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                error!("Error making POST request: {}", e);
                None
            }
        }
    }

    fn aggregate(
        &mut self,
        result: Option<BatchResult>,
        body: &serde_json::Value,
        aggregator: &mut Aggregator,
    ) -> BatchDisposition {
        self.transition(SessionState::Aggregating);

        if self.config.save_responses() {
            if let Some(sink) = self.sink.as_mut() {
                match sink.save_raw_response(body) {
                    Ok(path) => debug!("Saved API response to {}", path.display()),
                    Err(e) => warn!("Could not save API response: {}", e),
                }
            }
        }

        match result {
            Some(result) => aggregator.merge(&result),
            None => error!(
                "Managing Top Tweets, but not finding 'by_tweet_type' in Engagement Groupings..."
            ),
        }
        BatchDisposition::Aggregated
    }

    fn fail(e: BusinessError) -> BatchDisposition {
        if e.is_session_fatal() {
            BatchDisposition::Aborted(e)
        } else {
            warn!("Batch failed: {}", e);
            BatchDisposition::Skipped
        }
    }
}
