//! Raw response archiving and report files

use std::fs;
use tempfile::TempDir;

use engagement_collector::output::{render_report, MetricsStore};
use engagement_collector::session::{SessionConfig, SessionExecutor};
use engagement_collector::Endpoint;

use super::support::{auth_failed, config, ids, ScriptedTransport};

#[tokio::test(start_paused = true)]
async fn test_each_successful_batch_is_archived() {
    let outbox = TempDir::new().unwrap();
    let store = MetricsStore::new(outbox.path(), Some("run"), true);
    let mut executor = SessionExecutor::new(ScriptedTransport::new(), config(Endpoint::Window))
        .unwrap()
        .with_response_sink(store.clone());

    let report = executor.run(&ids(1..=30)).await.unwrap();
    let path = store
        .write_report(&render_report(&report, Some("run")), false)
        .unwrap();

    let metrics = outbox.path().join("run/metrics");
    assert!(metrics.join("run_metrics.json").exists());
    assert!(metrics.join("run_metrics_1.json").exists());
    assert!(!metrics.join("run_metrics_2.json").exists());

    assert_eq!(path, outbox.path().join("run/run_results.csv"));
    let text = fs::read_to_string(path).unwrap();
    assert!(!text.contains('\t'));
    assert!(text.starts_with("Engagement API Results for run dataset."));
    assert!(text.contains("Number of requests: 2"));
}

#[tokio::test(start_paused = true)]
async fn test_archiving_can_be_disabled() {
    let outbox = TempDir::new().unwrap();
    let store = MetricsStore::new(outbox.path(), None, false);
    let config = SessionConfig::builder(Endpoint::Totals)
        .metric_type("favorites", true)
        .grouping("by_tweet_type", ["tweet.id", "engagement.type"])
        .save_responses(false)
        .build()
        .unwrap();
    let mut executor = SessionExecutor::new(ScriptedTransport::new(), config)
        .unwrap()
        .with_response_sink(store.clone());

    executor.run(&ids(1..=3)).await.unwrap();

    assert!(!store.metrics_dir().exists());
}

#[tokio::test(start_paused = true)]
async fn test_aborted_session_still_renders_partial_totals() {
    let outbox = TempDir::new().unwrap();
    let store = MetricsStore::new(outbox.path(), Some("partial"), false);
    let transport = ScriptedTransport::new()
        .reply(200, serde_json::json!({"by_tweet_type": {"4": {"favorites": 12}}}))
        .reply(401, auth_failed());
    let mut executor = SessionExecutor::new(transport, config(Endpoint::Window)).unwrap();

    let report = executor.run(&ids(1..=50)).await.unwrap();
    assert!(!report.is_success());

    let path = store
        .write_report(&render_report(&report, Some("partial")), true)
        .unwrap();
    assert!(path.ends_with("partial_results.partial.csv"));

    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("Favorites"));
    assert!(text.contains(" 12 "));
    assert!(text.contains("https://twitter.com/lookup/status/4"));
}
