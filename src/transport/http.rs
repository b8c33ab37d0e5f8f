//! `reqwest`-backed transport
//!
//! Provides the HTTP client used for all metrics API calls with:
//! - JSON POST with transparent gzip decompression
//! - Pluggable request signing
//! - One credential refresh attempt per request
//! - Request counters and duration histograms

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{RawResponse, Transport, TransportError, TransportResult};
use crate::metrics::RequestMetrics;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Production API base URL
pub const DEFAULT_BASE_URL: &str = "https://data-api.twitter.com";

/// Produces the `Authorization` header value for a request
pub trait RequestSigner: Send + Sync {
    /// Authorization header value for a POST to `url` with `body`
    fn authorization(&self, url: &str, body: &str) -> TransportResult<String>;
}

/// Static bearer-token signer
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    /// Create a signer from a bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").field("token", &"***").finish()
    }
}

impl RequestSigner for BearerToken {
    fn authorization(&self, _url: &str, _body: &str) -> TransportResult<String> {
        if self.token.trim().is_empty() {
            return Err(TransportError::CredentialsError(
                "bearer token is empty".to_string(),
            ));
        }
        Ok(format!("Bearer {}", self.token.trim()))
    }
}

/// HTTP transport for the metrics API
pub struct HttpTransport {
    client: Arc<Client>,
    base_url: String,
    signer: Arc<dyn RequestSigner>,
}

impl HttpTransport {
    /// Create a transport with the default timeout
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g., "<https://data-api.twitter.com>")
    /// * `signer` - Produces the authorization header per request
    pub fn new(
        base_url: impl Into<String>,
        signer: impl RequestSigner + 'static,
    ) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .gzip(true)
            .build()
            .map_err(|e| TransportError::BuildError(e.to_string()))?;

        Ok(Self::with_client(Arc::new(client), base_url, Arc::new(signer)))
    }

    /// Create a transport around a shared client
    pub fn with_client(
        client: Arc<Client>,
        base_url: impl Into<String>,
        signer: Arc<dyn RequestSigner>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, url: &str, body: &str) -> TransportResult<String> {
        match self.signer.authorization(url, body) {
            Ok(header) => Ok(header),
            Err(e) => {
                warn!("Credentials unavailable ({}), refreshing once", e);
                self.signer.authorization(url, body)
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, path: &str, body: &str) -> TransportResult<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        let authorization = self.authorize(&url, body)?;
        let metrics = RequestMetrics::start(path);

        debug!("Client making API request: {}", truncate(body, 80));

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| {
                metrics.record_network_error();
                TransportError::NetworkError(e.to_string())
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::BodyError(e.to_string()))?;

        metrics.record_complete(status);

        if status > 201 {
            error!(status, "Response error, server says: {}", text);
        }

        Ok(RawResponse::new(status, text))
    }
}

/// Truncate a string to at most `max` characters for logging
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
