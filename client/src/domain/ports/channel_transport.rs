//! Driven port that performs exactly one HTTP exchange.
//!
//! The domain resolves the URL and every header before calling the port, so
//! adapters own wire details only: connection handling, body encoding, and
//! mapping low-level failures onto [`TransportError`].

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::define_port_error;
use crate::domain::{Method, RequestBody};

/// Fully resolved request for one attempt on one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Header pairs, sent verbatim.
    pub headers: Vec<(String, String)>,
    /// Request payload.
    pub body: RequestBody,
    /// Deadline for this attempt alone.
    pub timeout: Duration,
}

impl OutboundRequest {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Build a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Failures that prevented a complete HTTP exchange.
    pub enum TransportError {
        /// The attempt hit its deadline or was aborted mid-flight.
        Timeout { message: String } =>
            "request timed out: {message}" [retryable],
        /// No connection could be established (DNS failure, refused).
        Connect { message: String } =>
            "connection failed: {message}" [retryable],
        /// The connection failed after it was established.
        Network { message: String } =>
            "network failure: {message}" [retryable],
        /// The request could not be encoded.
        InvalidRequest { message: String } =>
            "request could not be built: {message}",
    }
}

impl TransportError {
    /// Whether the failure happened before any response arrived.
    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Network { .. })
    }
}

/// Port for sending one request over HTTP.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Perform one exchange. Non-2xx statuses are responses, not errors.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use client::domain::ports::{ChannelTransport, FixtureChannelTransport};
    ///
    /// let transport = FixtureChannelTransport;
    /// let response = transport.send(&request).await?;
    /// assert_eq!(response.status, 200);
    /// # Ok::<(), client::domain::ports::TransportError>(())
    /// ```
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// Fixture implementation answering every request with `200 {}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureChannelTransport;

#[async_trait]
impl ChannelTransport for FixtureChannelTransport {
    async fn send(&self, _request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(200, b"{}".to_vec()))
    }
}
