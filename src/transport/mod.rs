//! Signed HTTP transport
//!
//! The session core only needs to POST a JSON body to a path and get back a
//! status code and a body. [`Transport`] is that seam; [`http::HttpTransport`]
//! implements it with `reqwest`.

use async_trait::async_trait;

pub mod http;

/// Transport-level failures (network, credentials)
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout, or other network failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Credentials missing or unusable
    #[error("credentials error: {0}")]
    CredentialsError(String),

    /// Response body could not be read
    #[error("body read error: {0}")]
    BodyError(String),

    /// Client could not be constructed
    #[error("client build error: {0}")]
    BuildError(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Raw response as received from the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Decompressed body text
    pub body: String,
}

impl RawResponse {
    /// Create a response from a status and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code counts as success (200 or 201)
    pub fn is_success_status(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// Sends request bodies to the metrics service
///
/// Implementations handle signing and decompression. They may be invoked any
/// number of times, including with a repaired body for the same batch.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `path`
    async fn post(&self, path: &str, body: &str) -> TransportResult<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn post(&self, path: &str, body: &str) -> TransportResult<RawResponse> {
        (**self).post(path, body).await
    }
}
