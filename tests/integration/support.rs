//! Shared fixtures for session tests

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use engagement_collector::session::SessionConfig;
use engagement_collector::transport::{RawResponse, Transport, TransportError, TransportResult};
use engagement_collector::{Endpoint, IdentifierSet, TweetId};

/// One recorded POST
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub path: String,
    pub body: Value,
    pub at: Instant,
}

impl SentRequest {
    pub fn tweet_ids(&self) -> Vec<TweetId> {
        self.body["tweet_ids"]
            .as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_str().and_then(|s| s.parse().ok()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<TransportResult<RawResponse>>,
    sent: Vec<SentRequest>,
}

/// In-memory transport replaying scripted replies
///
/// Once the script runs out every request succeeds with a `by_tweet_type`
/// grouping where each requested metric type counts `id % 100`.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: Value) -> Self {
        self.push(Ok(RawResponse::new(status, body.to_string())))
    }

    pub fn reply_raw(self, status: u16, body: &str) -> Self {
        self.push(Ok(RawResponse::new(status, body)))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(TransportError::NetworkError(message.to_string())))
    }

    fn push(self, reply: TransportResult<RawResponse>) -> Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.script.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, path: &str, body: &str) -> TransportResult<RawResponse> {
        let body: Value = serde_json::from_str(body).expect("request body is JSON");
        let mut script = self.script.lock().unwrap();
        script.sent.push(SentRequest {
            path: path.to_string(),
            body: body.clone(),
            at: Instant::now(),
        });
        match script.replies.pop_front() {
            Some(reply) => reply,
            None => Ok(RawResponse::new(200, echo_success(&body).to_string())),
        }
    }
}

/// Success body with `id % 100` for every requested id and metric type
pub fn echo_success(request: &Value) -> Value {
    let types: Vec<String> = request["engagement_types"]
        .as_array()
        .map(|t| t.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let mut by_tweet = Map::new();
    for id in request["tweet_ids"].as_array().into_iter().flatten() {
        let Some(id) = id.as_str() else { continue };
        let count = id.parse::<u64>().unwrap_or(0) % 100;
        let metrics: Map<String, Value> = types
            .iter()
            .map(|t| (t.clone(), Value::String(count.to_string())))
            .collect();
        by_tweet.insert(id.to_string(), Value::Object(metrics));
    }
    json!({ "by_tweet_type": by_tweet })
}

pub fn rate_limited() -> Value {
    json!({"errors": ["Exceeded rate limit"]})
}

pub fn auth_failed() -> Value {
    json!({"errors": ["Your account could not be authenticated. Reason: Unknown Access Token"]})
}

pub fn forbidden(ids: &[TweetId]) -> Value {
    let list: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    json!({"errors": [format!(
        "Forbidden to access tweets for author id 9: {}",
        list.join(",")
    )]})
}

pub fn ids(range: std::ops::RangeInclusive<TweetId>) -> IdentifierSet {
    range.collect()
}

/// Favorites-only session with a fast one-request-per-10s budget
pub fn config(endpoint: Endpoint) -> SessionConfig {
    SessionConfig::builder(endpoint)
        .metric_type("favorites", true)
        .grouping("by_tweet_type", ["tweet.id", "engagement.type"])
        .rate_limit(6, std::time::Duration::from_secs(60))
        .build()
        .unwrap()
}
