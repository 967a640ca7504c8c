//! Classified errors returned by every resource method.
//!
//! The kind is attached once, at classification time. Callers switch on
//! [`AccessErrorKind`]; they never inspect messages to recover it.

use thiserror::Error;

/// Stable failure category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AccessErrorKind {
    /// The backend refused access (401/403 on the last channel tried).
    PermissionDenied,
    /// The server failed in a way that may clear up (500/502/503/504).
    Transient,
    /// The attempt timed out or was aborted.
    Timeout,
    /// The backend rejected the request (4xx other than 401/403).
    Validation,
    /// No response, or a response that could not be understood.
    Unknown,
    /// The caller cancelled the call.
    Cancelled,
}

impl AccessErrorKind {
    /// Snake-case label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::Transient => "transient",
            Self::Timeout => "timeout",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Classified access-layer failure.
///
/// Carries the original status and endpoint for logging; transport detail is
/// folded into `message`.
///
/// # Examples
/// ```
/// use client::domain::{AccessError, AccessErrorKind};
///
/// let error = AccessError::validation("activity not found")
///     .with_status(404)
///     .with_endpoint("GET /activities/9");
/// assert_eq!(error.kind(), AccessErrorKind::Validation);
/// assert_eq!(error.status(), Some(404));
/// assert_eq!(error.to_string(), "activity not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AccessError {
    kind: AccessErrorKind,
    message: String,
    status: Option<u16>,
    endpoint: Option<String>,
}

impl AccessError {
    /// Build an error of `kind`.
    pub fn new(kind: AccessErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            endpoint: None,
        }
    }

    /// Convenience constructor for [`AccessErrorKind::PermissionDenied`].
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::PermissionDenied, message)
    }

    /// Convenience constructor for [`AccessErrorKind::Transient`].
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::Transient, message)
    }

    /// Convenience constructor for [`AccessErrorKind::Timeout`].
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::Timeout, message)
    }

    /// Convenience constructor for [`AccessErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::Validation, message)
    }

    /// Convenience constructor for [`AccessErrorKind::Unknown`].
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::Unknown, message)
    }

    /// Convenience constructor for [`AccessErrorKind::Cancelled`].
    pub fn cancelled() -> Self {
        Self::new(AccessErrorKind::Cancelled, "request cancelled")
    }

    /// Attach the HTTP status that produced the error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the `METHOD path` label of the failing call.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Failure category.
    pub fn kind(&self) -> AccessErrorKind {
        self.kind
    }

    /// Human-readable message; for validation errors, the backend's text.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// `METHOD path` label of the failing call.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Whether offering the user a retry makes sense.
    pub fn is_retry_suggested(&self) -> bool {
        matches!(
            self.kind,
            AccessErrorKind::Transient | AccessErrorKind::Timeout
        )
    }
}
