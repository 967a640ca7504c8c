//! Dependency-injected access-layer instance.
//!
//! One `AccessLayer` owns both channel configurations, the credential store,
//! and the transport for its lifetime. Nothing is global, so tests build as
//! many isolated instances as they need.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::domain::classifier::{classify, decode_failure};
use crate::domain::dispatch::{Dispatched, Dispatcher};
use crate::domain::ports::{ChannelTransport, CredentialStore, TransportResponse};
use crate::domain::retry::{Outcome, RetryEngine, RetryPolicies, RetryRuntime};
use crate::domain::{AccessError, ChannelSet, Credential, RequestDescriptor};

/// Port bundle required by the access layer.
pub struct AccessLayerPorts {
    /// Persisted bearer credential.
    pub credentials: Arc<dyn CredentialStore>,
    /// HTTP transport adapter.
    pub transport: Arc<dyn ChannelTransport>,
}

impl AccessLayerPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn ChannelTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
        }
    }
}

/// Entry point for every call to the remote API.
pub struct AccessLayer {
    dispatcher: Dispatcher,
    credentials: Arc<dyn CredentialStore>,
}

impl AccessLayer {
    /// Build an access layer using the Tokio sleeper and no jitter.
    /// ```rust,ignore
    /// let layer = AccessLayer::new(channels, ports, RetryPolicies::default());
    /// ```
    pub fn new(channels: ChannelSet, ports: AccessLayerPorts, policies: RetryPolicies) -> Self {
        Self::with_runtime(channels, ports, policies, RetryRuntime::default())
    }

    /// Build an access layer with injected retry runtime helpers.
    /// ```rust,ignore
    /// let layer = AccessLayer::with_runtime(channels, ports, policies, runtime);
    /// ```
    pub fn with_runtime(
        channels: ChannelSet,
        ports: AccessLayerPorts,
        policies: RetryPolicies,
        runtime: RetryRuntime,
    ) -> Self {
        let credentials = ports.credentials;
        let dispatcher = Dispatcher::new(
            channels,
            credentials.clone(),
            ports.transport,
            RetryEngine::new(runtime),
            policies,
        );
        Self {
            dispatcher,
            credentials,
        }
    }

    /// Store a credential obtained outside the login and registration calls.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessError`] of kind `Unknown` when the credential
    /// cannot be persisted.
    pub fn sign_in_with(&self, credential: Credential) -> Result<(), AccessError> {
        self.credentials
            .set(credential)
            .map_err(|error| AccessError::unknown(format!("Could not save your session: {error}")))
    }

    /// Forget the stored credential; later authenticated attempts carry no
    /// `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessError`] of kind `Unknown` when the removal cannot
    /// be persisted.
    pub fn sign_out(&self) -> Result<(), AccessError> {
        self.credentials
            .clear()
            .map_err(|error| AccessError::unknown(format!("Could not end your session: {error}")))
    }

    /// Whether a credential is currently stored.
    pub fn has_credential(&self) -> bool {
        self.credentials.get().is_some()
    }

    pub(crate) async fn execute(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, AccessError> {
        let dispatched = self.dispatcher.dispatch(descriptor, cancel).await;
        settle(dispatched, &descriptor.endpoint_label())
    }

    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<T, AccessError> {
        let response = self.execute(descriptor, cancel).await?;
        decode(&response, &descriptor.endpoint_label())
    }

    pub(crate) async fn upload_json<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<T, AccessError> {
        let endpoint = descriptor.endpoint_label();
        let dispatched = self.dispatcher.dispatch_upload(descriptor, cancel).await;
        let response = settle(dispatched, &endpoint)?;
        decode(&response, &endpoint)
    }
}

fn settle(dispatched: Dispatched, endpoint: &str) -> Result<TransportResponse, AccessError> {
    match dispatched.outcome {
        Outcome::Success(response) => Ok(response),
        Outcome::Retryable(failure) | Outcome::Terminal(failure) => {
            Err(classify(&failure, endpoint))
        }
    }
}

fn decode<T: DeserializeOwned>(
    response: &TransportResponse,
    endpoint: &str,
) -> Result<T, AccessError> {
    serde_json::from_slice(&response.body)
        .map_err(|error| decode_failure(endpoint, &error).with_status(response.status))
}
