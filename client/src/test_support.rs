//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled only for tests or with the `test-support` feature.

mod retry;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

pub use retry::{ImmediateSleeper, RecordingSleeper};
pub use transport::ScriptedTransport;

use crate::domain::{
    AccessLayer, AccessLayerPorts, Channel, ChannelKind, ChannelSet, Credential, NoJitter,
    RetryPolicies, RetryRuntime,
};
use crate::outbound::credentials::InMemoryCredentialStore;

/// Base address of the CDN-fronted public channel.
pub const PUBLIC_BASE: &str = "https://cdn.example.test/";
/// Base address of the authenticated channel.
pub const AUTHENTICATED_BASE: &str = "https://api.example.test/";
/// Direct origin used for uploads and public-channel writes.
pub const UPLOAD_ORIGIN: &str = "https://origin.example.test/";

fn parse(url: &str) -> Url {
    match Url::parse(url) {
        Ok(url) => url,
        Err(error) => panic!("test url {url} should parse: {error}"),
    }
}

/// Channel set pointing at the three `example.test` hosts.
pub fn test_channels() -> ChannelSet {
    let timeout = Duration::from_secs(5);
    let build = |kind, base| match Channel::new(kind, parse(base), timeout) {
        Ok(channel) => channel,
        Err(error) => panic!("test channel should build: {error}"),
    };
    match ChannelSet::new(
        build(ChannelKind::Public, PUBLIC_BASE),
        build(ChannelKind::Authenticated, AUTHENTICATED_BASE),
        parse(UPLOAD_ORIGIN),
    ) {
        Ok(channels) => channels,
        Err(error) => panic!("test channel set should build: {error}"),
    }
}

/// A fully wired access layer with inspectable doubles.
///
/// Backoff sleeps are recorded rather than awaited, so retry schedules can
/// be asserted without waiting.
pub struct TestHarness {
    /// Layer under test.
    pub layer: AccessLayer,
    /// Scripted transport; push responses before calling the layer.
    pub transport: Arc<ScriptedTransport>,
    /// Credential store shared with the layer.
    pub credentials: Arc<InMemoryCredentialStore>,
    /// Sleeper recording each backoff delay.
    pub sleeper: Arc<RecordingSleeper>,
}

impl TestHarness {
    /// Harness with default retry policies and an empty credential store.
    pub fn new() -> Self {
        Self::with_policies(RetryPolicies::default())
    }

    /// Harness with explicit retry policies.
    pub fn with_policies(policies: RetryPolicies) -> Self {
        let transport = Arc::new(ScriptedTransport::default());
        let credentials = Arc::new(InMemoryCredentialStore::default());
        let sleeper = Arc::new(RecordingSleeper::default());
        let layer = AccessLayer::with_runtime(
            test_channels(),
            AccessLayerPorts::new(credentials.clone(), transport.clone()),
            policies,
            RetryRuntime {
                sleeper: sleeper.clone(),
                jitter: Arc::new(NoJitter),
            },
        );
        Self {
            layer,
            transport,
            credentials,
            sleeper,
        }
    }

    /// Store `token` as the current credential.
    pub fn signed_in(self, token: &str) -> Self {
        let credential = match Credential::new(token) {
            Ok(credential) => credential,
            Err(error) => panic!("test token should be valid: {error}"),
        };
        if let Err(error) = self.layer.sign_in_with(credential) {
            panic!("in-memory store should accept the credential: {error}");
        }
        self
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
