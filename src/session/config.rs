//! Session configuration
//!
//! [`SessionConfig`] is immutable once built. The builder validates the
//! rate-limit budget, batch limit, and top-N width up front so the executor
//! never starts with settings it cannot honor.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::SessionError;
use crate::{Endpoint, Grouping, MetricFlag};

/// Default requests allowed per rate-limit window
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 6;

/// Default rate-limit window
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Default top-N board width
pub const DEFAULT_TOP_N: usize = 10;

/// Requests-per-window budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    /// Requests allowed in one window
    pub requests: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateBudget {
    fn default() -> Self {
        Self {
            requests: DEFAULT_RATE_LIMIT_REQUESTS,
            window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

/// Immutable settings for one collection session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    endpoint: Endpoint,
    metric_types: Vec<MetricFlag>,
    groupings: Vec<Grouping>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    rate_budget: RateBudget,
    top_n: usize,
    batch_limit: usize,
    save_responses: bool,
}

impl SessionConfig {
    /// Start building a configuration for an endpoint
    pub fn builder(endpoint: Endpoint) -> SessionConfigBuilder {
        SessionConfigBuilder::new(endpoint)
    }

    /// Selected endpoint
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// All configured metric flags in configuration order
    pub fn metric_flags(&self) -> &[MetricFlag] {
        &self.metric_types
    }

    /// Enabled metric types the endpoint accepts, in configuration order
    pub fn resolved_metric_types(&self) -> Vec<String> {
        self.metric_types
            .iter()
            .filter(|flag| flag.enabled && self.endpoint.allows_metric_type(&flag.name))
            .map(|flag| flag.name.clone())
            .collect()
    }

    /// All configured groupings in configuration order
    pub fn groupings(&self) -> &[Grouping] {
        &self.groupings
    }

    /// Optional historical start
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Optional historical end
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Rate-limit budget
    pub fn rate_budget(&self) -> RateBudget {
        self.rate_budget
    }

    /// Top-N board width (0 disables the boards)
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Identifiers per request
    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Whether raw responses are persisted
    pub fn save_responses(&self) -> bool {
        self.save_responses
    }
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    endpoint: Endpoint,
    metric_types: Vec<MetricFlag>,
    groupings: Vec<Grouping>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    rate_budget: RateBudget,
    top_n: usize,
    batch_limit: Option<usize>,
    save_responses: bool,
}

impl SessionConfigBuilder {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            metric_types: Vec::new(),
            groupings: Vec::new(),
            start: None,
            end: None,
            rate_budget: RateBudget::default(),
            top_n: DEFAULT_TOP_N,
            batch_limit: None,
            save_responses: true,
        }
    }

    /// Add a metric type flag
    pub fn metric_type(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.metric_types.push(MetricFlag {
            name: name.into(),
            enabled,
        });
        self
    }

    /// Replace all metric type flags
    pub fn metric_types(mut self, flags: Vec<MetricFlag>) -> Self {
        self.metric_types = flags;
        self
    }

    /// Add a grouping
    pub fn grouping<I, S>(mut self, name: impl Into<String>, group_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groupings.push(Grouping::new(name, group_by));
        self
    }

    /// Replace all groupings
    pub fn groupings(mut self, groupings: Vec<Grouping>) -> Self {
        self.groupings = groupings;
        self
    }

    /// Historical date range; either boundary may be absent
    pub fn date_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Requests-per-window budget
    pub fn rate_limit(mut self, requests: u32, window: Duration) -> Self {
        self.rate_budget = RateBudget { requests, window };
        self
    }

    /// Top-N board width
    pub fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Override the endpoint's batch limit with a smaller one
    pub fn batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    /// Whether raw responses are persisted
    pub fn save_responses(mut self, save: bool) -> Self {
        self.save_responses = save;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        if self.rate_budget.requests == 0 {
            return Err(SessionError::ConfigError(
                "rate limit requests must be positive".to_string(),
            ));
        }
        if self.rate_budget.window.is_zero() {
            return Err(SessionError::ConfigError(
                "rate limit window must be positive".to_string(),
            ));
        }

        let max = self.endpoint.max_batch_size();
        let batch_limit = self.batch_limit.unwrap_or(max);
        if batch_limit == 0 {
            return Err(SessionError::ConfigError(
                "batch limit must be positive".to_string(),
            ));
        }
        if batch_limit > max {
            return Err(SessionError::ConfigError(format!(
                "batch limit {batch_limit} exceeds the {} endpoint maximum of {max}",
                self.endpoint
            )));
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err(SessionError::ConfigError(format!(
                    "end date {end} must be after start date {start}"
                )));
            }
        }

        Ok(SessionConfig {
            endpoint: self.endpoint,
            metric_types: self.metric_types,
            groupings: self.groupings,
            start: self.start,
            end: self.end,
            rate_budget: self.rate_budget,
            top_n: self.top_n,
            batch_limit,
            save_responses: self.save_responses,
        })
    }
}
