//! Unit tests for request payload construction

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use engagement_collector::session::{partition, RequestBuilder, SessionConfig};
use engagement_collector::Endpoint;

fn config(endpoint: Endpoint) -> SessionConfig {
    SessionConfig::builder(endpoint)
        .metric_type("impressions", true)
        .metric_type("engagements", true)
        .metric_type("video_views", false)
        .grouping("by_tweet_type", ["tweet.id", "engagement.type"])
        .grouping("timeseries_daily", ["tweet.id", "engagement.type", "engagement.day"])
        .date_range(
            Some(Utc.with_ymd_and_hms(2016, 1, 1, 10, 30, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2016, 1, 5, 10, 30, 0).unwrap()),
        )
        .build()
        .unwrap()
}

fn body(endpoint: Endpoint) -> Value {
    let now = Utc.with_ymd_and_hms(2016, 3, 1, 0, 0, 0).unwrap();
    let builder = RequestBuilder::with_now(&config(endpoint), now);
    let batch = partition(&[7, 8], 25).unwrap().remove(0);
    serde_json::from_str(&builder.build(&batch).to_json().unwrap()).unwrap()
}

#[test]
fn test_historical_body_has_dates_and_series() {
    assert_eq!(
        body(Endpoint::Historical),
        json!({
            "tweet_ids": ["7", "8"],
            "engagement_types": ["impressions", "engagements"],
            "groupings": {
                "by_tweet_type": {"group_by": ["tweet.id", "engagement.type"]},
                "timeseries_daily": {"group_by": ["tweet.id", "engagement.type", "engagement.day"]}
            },
            "start": "2016-01-01T10:00:00Z",
            "end": "2016-01-05T11:00:00Z"
        })
    );
}

#[test]
fn test_window_body_keeps_series_but_drops_dates() {
    let body = body(Endpoint::Window);
    assert!(body.get("start").is_none());
    assert!(body.get("end").is_none());
    assert!(body["groupings"].get("timeseries_daily").is_some());
}

#[test]
fn test_totals_body_is_restricted() {
    let body = body(Endpoint::Totals);
    assert!(body.get("start").is_none());
    assert!(body["groupings"].get("timeseries_daily").is_none());
    // impressions and engagements are not totals metrics
    assert_eq!(body["engagement_types"], json!([]));
}

#[test]
fn test_repaired_payload_drops_only_named_ids() {
    let now = Utc.with_ymd_and_hms(2016, 3, 1, 0, 0, 0).unwrap();
    let builder = RequestBuilder::with_now(&config(Endpoint::Window), now);
    let batch = partition(&[1, 2, 3, 4], 25).unwrap().remove(0);
    let payload = builder.build(&batch);

    let repaired = payload.without_ids(&[2, 4, 99]);
    assert_eq!(repaired.tweet_ids, vec![1, 3]);
    assert_eq!(repaired.engagement_types, payload.engagement_types);
}
