//! Request pacing under a requests-per-window budget
//!
//! With a budget of `N` requests per `W`, consecutive requests are spaced at
//! least `W / N` apart. Only the residual part of that interval is slept after
//! a request; a rate-limit error sleeps the full interval.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::config::RateBudget;
use super::SessionError;

/// Paces sequential requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    interval: Duration,
}

impl RateLimiter {
    /// Create a limiter for `requests` per `window`
    ///
    /// # Errors
    /// Returns [`SessionError::ConfigError`] if either value is zero.
    pub fn new(requests: u32, window: Duration) -> Result<Self, SessionError> {
        if requests == 0 || window.is_zero() {
            return Err(SessionError::ConfigError(format!(
                "invalid rate limit budget: {requests} requests per {window:?}"
            )));
        }
        Ok(Self {
            interval: window / requests,
        })
    }

    /// Create a limiter from a session budget
    pub fn from_budget(budget: RateBudget) -> Result<Self, SessionError> {
        Self::new(budget.requests, budget.window)
    }

    /// Minimum spacing between request starts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Residual sleep after a request that took `request_duration`
    pub fn pace(&self, request_duration: Duration) -> Duration {
        self.interval.saturating_sub(request_duration)
    }

    /// Sleep before retrying a rate-limited request
    pub fn rate_limit_backoff(&self) -> Duration {
        self.interval
    }

    /// Sleep the residual pacing interval
    pub async fn wait_after(&self, request_duration: Duration) -> Duration {
        let delay = self.pace(request_duration);
        if !delay.is_zero() {
            info!(
                "Sleeping {:.2} seconds before next API request...",
                delay.as_secs_f64()
            );
            sleep(delay).await;
        } else {
            debug!("Request took longer than the pacing interval, no sleep needed");
        }
        delay
    }

    /// Sleep the full pacing interval
    pub async fn wait_full(&self) -> Duration {
        let delay = self.rate_limit_backoff();
        sleep(delay).await;
        delay
    }
}
