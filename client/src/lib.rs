//! Network access layer for the mobile client.
//!
//! The crate mediates every call between the application and the remote
//! API: it picks the credential channel per call, retries transient failures
//! with exponential backoff, and folds transport and HTTP failures into the
//! small [`domain::AccessError`] vocabulary callers switch on.
//!
//! Resource methods on [`domain::AccessLayer`] are the only public entry
//! points; raw request construction stays inside the crate.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::AccessSettings;
pub use domain::{AccessError, AccessErrorKind, AccessLayer};
