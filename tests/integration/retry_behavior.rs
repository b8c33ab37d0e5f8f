//! Retry classification through the session executor
//!
//! Every retryable failure gets exactly one retry; failures after that skip the batch.

use serde_json::json;
use std::time::Duration;

use engagement_collector::session::{SessionExecutor, SessionState};
use engagement_collector::{Endpoint, IdentifierSet};

use super::support::{config, forbidden, ids, rate_limited, ScriptedTransport};

#[tokio::test(start_paused = true)]
async fn test_repeated_rate_limit_is_retried_once_then_skipped() {
    let transport = ScriptedTransport::new()
        .reply(429, rate_limited())
        .reply(429, rate_limited());
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Window)).unwrap();

    let report = executor.run(&ids(1..=50)).await.unwrap();

    // batch 1: original + one retry, batch 2: served by the echo fallback
    assert_eq!(transport.sent().len(), 3);
    assert_eq!(transport.sent()[0].body, transport.sent()[1].body);
    assert_eq!(report.stats.retries, 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.completed, 1);
    assert!(report.is_success());
    assert_eq!(report.state, SessionState::Done);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retry_waits_full_interval() {
    let transport = ScriptedTransport::new().reply(429, rate_limited());
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Window)).unwrap();

    let report = executor.run(&ids(1..=5)).await.unwrap();

    assert_eq!(transport.sent().len(), 2);
    assert_eq!(report.stats.completed, 1);
    assert!(report.stats.elapsed >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_identifiers_are_removed_before_retry() {
    let transport = ScriptedTransport::new().reply(403, forbidden(&[2, 3]));
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Totals)).unwrap();

    let report = executor.run(&ids(1..=3)).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].tweet_ids(), vec![1, 2, 3]);
    assert_eq!(sent[1].tweet_ids(), vec![1]);
    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.aggregator.totals().get("favorites"), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_repair_leaving_nothing_skips_without_resend() {
    let transport = ScriptedTransport::new().reply(403, forbidden(&[2, 3]));
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Totals)).unwrap();

    let set: IdentifierSet = vec![2u64, 3].into_iter().collect();
    let report = executor.run(&set).await.unwrap();

    assert_eq!(transport.sent().len(), 1);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.retries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unclassified_and_transport_failures_skip_batch() {
    let transport = ScriptedTransport::new()
        .reply(500, json!({"errors": ["internal server error"]}))
        .fail("connection reset")
        .reply_raw(502, "<html>bad gateway</html>");
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Window)).unwrap();

    let report = executor.run(&ids(1..=100)).await.unwrap();

    assert_eq!(transport.sent().len(), 4);
    assert_eq!(report.stats.skipped, 3);
    assert_eq!(report.stats.completed, 1);
    assert_eq!(report.stats.retries, 0);
    assert!(report.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_retry_that_hits_auth_failure_aborts() {
    let transport = ScriptedTransport::new()
        .reply(429, rate_limited())
        .reply(401, super::support::auth_failed());
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Window)).unwrap();

    let report = executor.run(&ids(1..=50)).await.unwrap();

    assert_eq!(transport.sent().len(), 2);
    assert!(!report.is_success());
    assert_eq!(report.state, SessionState::Aborted);
}

#[tokio::test(start_paused = true)]
async fn test_requests_stay_spaced_after_a_retry() {
    let transport = ScriptedTransport::new().reply(429, rate_limited());
    let mut executor = SessionExecutor::new(transport.clone(), config(Endpoint::Window)).unwrap();

    let report = executor.run(&ids(1..=50)).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(report.stats.completed, 2);
    for pair in sent.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(gap >= Duration::from_secs(10), "requests only {gap:?} apart");
    }
}
