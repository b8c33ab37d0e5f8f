//! Response classification
//!
//! Turns a [`RawResponse`] into a [`ResponseOutcome`]. The remote JSON is
//! parsed here, at the boundary, into explicit records; nothing past this
//! point handles loosely-typed maps.
//!
//! Example error bodies the service returns:
//!
//! ```text
//! {"errors":["Forbidden to access metrics: retweets"]}
//! {"errors":["internal server error"]}
//! {"errors":["Forbidden to access tweets for author id 18435372: 640026211712786432, 640026277605339136"]}
//! ```

use serde_json::Value;
use tracing::{error, info, warn};

use super::request::RequestPayload;
use crate::transport::RawResponse;
use crate::TweetId;

const RATE_LIMIT_PHRASE: &str = "rate limit";
const FORBIDDEN_TWEETS_PHRASE: &str = "forbidden to access tweets for author id";
const AUTH_FAILURE_PHRASES: [&str; 2] = [
    "could not be authenticated",
    "application id is not authorized",
];

/// Business-level errors reported inside a structurally valid response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusinessError {
    /// Request budget exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Some identifiers belong to authors the account may not access
    #[error("forbidden identifiers: {0:?}")]
    ForbiddenIdentifiers(Vec<TweetId>),

    /// Credentials rejected; the whole session must stop
    #[error("authentication failure: {0}")]
    AuthFailure(String),

    /// Anything else; the batch is skipped
    #[error("unclassified error: {0}")]
    Unclassified(String),
}

impl BusinessError {
    /// Whether this error ends the session rather than just the batch
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, BusinessError::AuthFailure(_))
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            BusinessError::RateLimit => "rate_limit",
            BusinessError::ForbiddenIdentifiers(_) => "forbidden_identifiers",
            BusinessError::AuthFailure(_) => "auth_failure",
            BusinessError::Unclassified(_) => "unclassified",
        }
    }
}

/// Why a response may be retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryKind {
    /// Retry the unchanged request after the full pacing interval
    RateLimit,
    /// Retry with these identifiers removed
    ForbiddenIdentifiers(Vec<TweetId>),
}

impl RetryKind {
    /// Equivalent business error, used when the retry also fails
    pub fn as_error(&self) -> BusinessError {
        match self {
            RetryKind::RateLimit => BusinessError::RateLimit,
            RetryKind::ForbiddenIdentifiers(ids) => BusinessError::ForbiddenIdentifiers(ids.clone()),
        }
    }
}

/// Per-identifier metric counts from one successful response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Identifiers in response order
    pub tweets: Vec<TweetMetrics>,
}

/// Metric counts for one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetMetrics {
    /// Identifier
    pub id: TweetId,
    /// `(metric type, count)` pairs in response order
    pub counts: Vec<(String, u64)>,
}

impl BatchResult {
    /// Parse the `by_tweet_type` grouping, if the response carries one
    pub fn from_response(body: &Value) -> Option<Self> {
        let by_tweet = body.get("by_tweet_type")?.as_object()?;

        let tweets = by_tweet
            .iter()
            .filter_map(|(id, metrics)| {
                let id = match id.parse::<TweetId>() {
                    Ok(id) => id,
                    Err(_) => {
                        warn!("Skipping non-numeric identifier in response: {}", id);
                        return None;
                    }
                };
                let counts = metrics
                    .as_object()?
                    .iter()
                    .filter_map(|(metric_type, count)| {
                        parse_count(count).map(|count| (metric_type.clone(), count))
                    })
                    .collect();
                Some(TweetMetrics { id, counts })
            })
            .collect();

        Some(Self { tweets })
    }

    /// Total number of `(identifier, metric, count)` triples
    pub fn triple_count(&self) -> usize {
        self.tweets.iter().map(|t| t.counts.len()).sum()
    }
}

fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_i64().map(|v| v.max(0) as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Classified result of one transport call
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// No error list; `result` is `None` when `by_tweet_type` was absent
    Success {
        /// Parsed per-identifier counts
        result: Option<BatchResult>,
        /// Parsed body, kept for archiving
        body: Value,
    },
    /// Retry once with `request` after pacing
    RetryableError {
        /// Why the retry is allowed
        kind: RetryKind,
        /// Request to send on retry (repaired when identifiers were removed)
        request: RequestPayload,
    },
    /// Do not retry
    FatalError(BusinessError),
}

/// Classify a response against the request that produced it
pub fn classify(raw: &RawResponse, prior: &RequestPayload) -> ResponseOutcome {
    let body: Value = match serde_json::from_str(&raw.body) {
        Ok(body) => body,
        Err(e) => {
            return ResponseOutcome::FatalError(BusinessError::Unclassified(format!(
                "unparseable response (status {}): {}",
                raw.status, e
            )))
        }
    };

    let api = ApiResponse::from_value(&body);
    if api.errors.is_empty() {
        if !raw.is_success_status() {
            return ResponseOutcome::FatalError(BusinessError::Unclassified(format!(
                "status {} without an error list",
                raw.status
            )));
        }
        if !api.unavailable_tweet_ids.is_empty() {
            info!("Unavailable Tweet IDs: {:?}", api.unavailable_tweet_ids);
        }
        return ResponseOutcome::Success {
            result: BatchResult::from_response(&body),
            body,
        };
    }
    let errors = api.errors;

    error!("Server responded with an error: {:?}", errors);

    let mut auth_failure = None;
    let mut forbidden: Option<Vec<TweetId>> = None;
    let mut rate_limited = false;
    let mut unclassified = Vec::new();

    for message in &errors {
        let lower = message.to_lowercase();
        if lower.contains(RATE_LIMIT_PHRASE) {
            error!("Hit rate limit: {}", message);
            rate_limited = true;
        } else if lower.contains(FORBIDDEN_TWEETS_PHRASE) {
            let ids = parse_forbidden_ids(message);
            for id in &ids {
                error!("Removing Tweet from request: {}", id);
            }
            forbidden.get_or_insert_with(Vec::new).extend(ids);
        } else if AUTH_FAILURE_PHRASES.iter().any(|p| lower.contains(p)) {
            error!("Can't authenticate, confirm credentials: {}", message);
            auth_failure.get_or_insert_with(|| message.clone());
        } else {
            error!("Error occurred: {}", message);
            unclassified.push(message.as_str());
        }
    }

    if let Some(message) = auth_failure {
        return ResponseOutcome::FatalError(BusinessError::AuthFailure(message));
    }
    if let Some(ids) = forbidden {
        return ResponseOutcome::RetryableError {
            request: prior.without_ids(&ids),
            kind: RetryKind::ForbiddenIdentifiers(ids),
        };
    }
    if rate_limited {
        return ResponseOutcome::RetryableError {
            kind: RetryKind::RateLimit,
            request: prior.clone(),
        };
    }
    ResponseOutcome::FatalError(BusinessError::Unclassified(unclassified.join("; ")))
}

/// Error and availability fields common to every response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    /// Error messages; empty on success
    pub errors: Vec<String>,
    /// Identifiers the service reported as unavailable
    pub unavailable_tweet_ids: Vec<String>,
}

impl ApiResponse {
    /// Read the error list and unavailable identifiers from a parsed body
    pub fn from_value(body: &Value) -> Self {
        Self {
            errors: string_list(body.get("errors")),
            unavailable_tweet_ids: string_list(body.get("unavailable_tweet_ids")),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Identifiers listed after the last colon of a forbidden-tweets message
pub fn parse_forbidden_ids(message: &str) -> Vec<TweetId> {
    message
        .rsplit(':')
        .next()
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            match part.parse::<TweetId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    if !part.is_empty() {
                        warn!("Ignoring unparseable forbidden identifier: {}", part);
                    }
                    None
                }
            }
        })
        .collect()
}
