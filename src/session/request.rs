//! Request payload construction
//!
//! [`RequestBuilder`] resolves the endpoint-dependent parts of a request once
//! per session (metric types, groupings, date range) and then stamps out one
//! [`RequestPayload`] per batch.

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, info};

use super::batcher::Batch;
use super::config::SessionConfig;
use super::SessionError;
use crate::{Grouping, TweetId, MAX_HISTORICAL_DAYS};

/// One logical request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPayload {
    /// Identifiers, serialized as decimal strings
    #[serde(serialize_with = "serialize_ids")]
    pub tweet_ids: Vec<TweetId>,
    /// Requested metric types
    pub engagement_types: Vec<String>,
    /// Requested groupings keyed by name
    #[serde(serialize_with = "serialize_groupings")]
    pub groupings: Vec<Grouping>,
    /// ISO-8601 start, historical endpoint only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// ISO-8601 end, historical endpoint only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl RequestPayload {
    /// Serialize to the JSON body sent over the wire
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::SerializationError(e.to_string()))
    }

    /// Copy of this payload without the given identifiers
    pub fn without_ids(&self, removed: &[TweetId]) -> Self {
        let mut repaired = self.clone();
        repaired.tweet_ids.retain(|id| !removed.contains(id));
        repaired
    }
}

fn serialize_ids<S: Serializer>(ids: &[TweetId], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(ids.iter().map(|id| id.to_string()))
}

fn serialize_groupings<S: Serializer>(
    groupings: &[Grouping],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct GroupBy<'a> {
        group_by: &'a [String],
    }

    let mut map = serializer.serialize_map(Some(groupings.len()))?;
    for grouping in groupings {
        map.serialize_entry(
            &grouping.name,
            &GroupBy {
                group_by: &grouping.group_by,
            },
        )?;
    }
    map.end()
}

/// Builds per-batch payloads from a session configuration
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    engagement_types: Vec<String>,
    groupings: Vec<Grouping>,
    start: Option<String>,
    end: Option<String>,
}

impl RequestBuilder {
    /// Resolve the request shape against the current time
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_now(config, Utc::now())
    }

    /// Resolve the request shape against a fixed "now"
    pub fn with_now(config: &SessionConfig, now: DateTime<Utc>) -> Self {
        let endpoint = config.endpoint();

        let groupings = config
            .groupings()
            .iter()
            .filter(|grouping| {
                if grouping.is_time_series() && !endpoint.supports_time_series() {
                    info!(
                        grouping = %grouping.name,
                        endpoint = %endpoint,
                        "Not adding time-series grouping to request"
                    );
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        let (start, end) = if endpoint.accepts_date_range() {
            let (start, end) = resolve_date_range(config.start(), config.end(), now);
            (start.map(iso_timestamp), end.map(iso_timestamp))
        } else {
            (None, None)
        };

        debug!(?start, ?end, endpoint = %endpoint, "Resolved request shape");

        Self {
            engagement_types: config.resolved_metric_types(),
            groupings,
            start,
            end,
        }
    }

    /// Metric types every payload carries
    pub fn engagement_types(&self) -> &[String] {
        &self.engagement_types
    }

    /// Groupings every payload carries
    pub fn groupings(&self) -> &[Grouping] {
        &self.groupings
    }

    /// Build the payload for one batch
    pub fn build(&self, batch: &Batch) -> RequestPayload {
        RequestPayload {
            tweet_ids: batch.ids.clone(),
            engagement_types: self.engagement_types.clone(),
            groupings: self.groupings.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

/// Normalize and complete a historical date range
///
/// The start is floored and the end ceiled to the hour. A missing boundary is
/// derived from the other one by the 28-day maximum window. An end later than
/// `now` collapses to `None` so the service defaults it to now.
pub fn resolve_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let window = ChronoDuration::days(MAX_HISTORICAL_DAYS);
    let start = start.map(floor_hour);
    let end = end.map(ceil_hour);

    let (start, end) = match (start, end) {
        (None, None) => (None, None),
        (Some(start), None) => (Some(start), Some(start + window)),
        (None, Some(end)) => (Some(end.min(now) - window), Some(end)),
        (Some(start), Some(end)) => (Some(start), Some(end)),
    };

    (start, end.filter(|end| *end <= now))
}

/// Canonical ISO-8601 UTC string with zeroed seconds
pub fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:00Z").to_string()
}

fn floor_hour(time: DateTime<Utc>) -> DateTime<Utc> {
    time.duration_trunc(ChronoDuration::hours(1)).unwrap_or(time)
}

fn ceil_hour(time: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_hour(time);
    if floored == time {
        time
    } else {
        floored + ChronoDuration::hours(1)
    }
}
