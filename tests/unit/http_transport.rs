//! Unit tests for the HTTP transport

use engagement_collector::transport::http::{truncate, BearerToken, HttpTransport};
use engagement_collector::transport::{Transport, TransportError};

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let transport = HttpTransport::new("http://127.0.0.1:1/", BearerToken::new("token")).unwrap();
    assert_eq!(transport.base_url(), "http://127.0.0.1:1");

    let result = transport.post("/insights/engagement/totals", "{}").await;
    assert!(matches!(result, Err(TransportError::NetworkError(_))));
}

#[tokio::test]
async fn test_empty_token_fails_before_sending() {
    let transport = HttpTransport::new("http://127.0.0.1:1", BearerToken::new("  ")).unwrap();

    let result = transport.post("/insights/engagement/totals", "{}").await;
    assert!(matches!(result, Err(TransportError::CredentialsError(_))));
}

#[test]
fn test_truncate_respects_char_boundaries() {
    assert_eq!(truncate("héllo wörld", 4), "héll");
    assert_eq!(truncate("short", 80), "short");
}
