//! Dual-channel dispatch: which channel(s) carry a call, and in what order.
//!
//! Routing is an explicit state machine. [`transition`] is pure and holds
//! every escalation rule; [`Dispatcher`] only performs the I/O each state
//! asks for.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::domain::channel::resolve_endpoint;
use crate::domain::ports::{ChannelTransport, CredentialStore, OutboundRequest};
use crate::domain::retry::{Outcome, RetryEngine, RetryPolicies, RetryPolicy, assess};
use crate::domain::{
    ChannelKind, ChannelSet, Credential, IDEMPOTENCY_KEY_HEADER, IdempotencyKey, RequestBody,
    RequestDescriptor,
};

/// Channel order allowed for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Public channel, escalating to authenticated on 401/403.
    PublicFirst,
    /// Public channel only; 401/403 is a business outcome.
    PublicOnly,
    /// Authenticated channel only.
    AuthenticatedOnly,
}

impl Route {
    /// Pick the route for a descriptor.
    ///
    /// Pure-public endpoints never escalate, whatever their method. Reads
    /// and explicitly flagged writes go public-first; other writes go
    /// straight to the authenticated channel.
    pub fn for_request(descriptor: &RequestDescriptor) -> Self {
        if descriptor.is_pure_public() {
            Self::PublicOnly
        } else if descriptor.method().is_read() || descriptor.is_public_first() {
            Self::PublicFirst
        } else {
            Self::AuthenticatedOnly
        }
    }

    /// Channel tried first.
    pub const fn first_channel(self) -> ChannelKind {
        match self {
            Self::PublicFirst | Self::PublicOnly => ChannelKind::Public,
            Self::AuthenticatedOnly => ChannelKind::Authenticated,
        }
    }

    /// State the machine starts in.
    pub const fn initial_state(self) -> DispatchState {
        DispatchState::trying(self.first_channel())
    }
}

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Run the public channel next.
    TryPublic,
    /// Run the authenticated channel next.
    TryAuthenticated,
    /// Stop; the last channel outcome is final.
    Done,
}

impl DispatchState {
    /// State that runs `kind`.
    pub const fn trying(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Public => Self::TryPublic,
            ChannelKind::Authenticated => Self::TryAuthenticated,
        }
    }

    /// Channel this state runs, or `None` once done.
    pub const fn channel(self) -> Option<ChannelKind> {
        match self {
            Self::TryPublic => Some(ChannelKind::Public),
            Self::TryAuthenticated => Some(ChannelKind::Authenticated),
            Self::Done => None,
        }
    }
}

/// Summary of one channel's retried outcome, as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVerdict {
    /// 2xx.
    Success,
    /// 401 or 403.
    PermissionDenied,
    /// Anything else, including cancellation.
    Failed,
}

impl ChannelVerdict {
    /// Summarise a settled outcome.
    pub fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success(_) => Self::Success,
            Outcome::Terminal(failure) | Outcome::Retryable(failure)
                if failure.is_permission_denied() =>
            {
                Self::PermissionDenied
            }
            Outcome::Terminal(_) | Outcome::Retryable(_) => Self::Failed,
        }
    }
}

/// Next state after a channel settles.
///
/// The only non-terminal edge is public to authenticated, taken when a
/// public-first call is denied. Everything else, including a denial on the
/// authenticated channel, ends the call.
///
/// # Examples
/// ```
/// use client::domain::{ChannelVerdict, DispatchState, Route, transition};
///
/// assert_eq!(
///     transition(Route::PublicFirst, DispatchState::TryPublic, ChannelVerdict::PermissionDenied),
///     DispatchState::TryAuthenticated,
/// );
/// assert_eq!(
///     transition(Route::PublicOnly, DispatchState::TryPublic, ChannelVerdict::PermissionDenied),
///     DispatchState::Done,
/// );
/// ```
pub const fn transition(
    route: Route,
    state: DispatchState,
    verdict: ChannelVerdict,
) -> DispatchState {
    match (route, state, verdict) {
        (Route::PublicFirst, DispatchState::TryPublic, ChannelVerdict::PermissionDenied) => {
            DispatchState::TryAuthenticated
        }
        _ => DispatchState::Done,
    }
}

/// Final outcome of a dispatched call and the channel that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Settled outcome of the last channel tried.
    pub outcome: Outcome,
    /// Last channel tried.
    pub channel: ChannelKind,
}

/// Drives the routing state machine over the retry engine.
pub struct Dispatcher {
    channels: ChannelSet,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn ChannelTransport>,
    engine: RetryEngine,
    policies: RetryPolicies,
}

impl Dispatcher {
    /// Wire a dispatcher.
    pub fn new(
        channels: ChannelSet,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn ChannelTransport>,
        engine: RetryEngine,
        policies: RetryPolicies,
    ) -> Self {
        Self {
            channels,
            credentials,
            transport,
            engine,
            policies,
        }
    }

    /// Route `descriptor` through its channel(s).
    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Dispatched {
        let route = Route::for_request(descriptor);
        let policy = self.policies.for_method(descriptor.method());
        let key = idempotency_key_for(descriptor);
        let mut state = route.initial_state();
        let mut kind = route.first_channel();

        loop {
            let outcome = self
                .run_channel(kind, None, descriptor, key.as_ref(), policy, cancel)
                .await;
            state = transition(route, state, ChannelVerdict::of(&outcome));
            match state.channel() {
                Some(next) => {
                    debug!(
                        endpoint = %descriptor.endpoint_label(),
                        from = kind.as_str(),
                        to = next.as_str(),
                        "escalating after permission denial"
                    );
                    kind = next;
                }
                None => return Dispatched {
                    outcome,
                    channel: kind,
                },
            }
        }
    }

    /// Send an upload on the authenticated channel against the direct
    /// upload origin, skipping the public-first flow.
    pub async fn dispatch_upload(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Dispatched {
        let policy = self.policies.for_method(descriptor.method());
        let key = idempotency_key_for(descriptor);
        let outcome = self
            .run_channel(
                ChannelKind::Authenticated,
                Some(self.channels.upload_origin()),
                descriptor,
                key.as_ref(),
                policy,
                cancel,
            )
            .await;
        Dispatched {
            outcome,
            channel: ChannelKind::Authenticated,
        }
    }

    async fn run_channel(
        &self,
        kind: ChannelKind,
        origin: Option<&Url>,
        descriptor: &RequestDescriptor,
        key: Option<&IdempotencyKey>,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.engine
            .execute(policy, cancel, |attempt| async move {
                let credential = match kind {
                    ChannelKind::Public => None,
                    ChannelKind::Authenticated => self.credentials.get(),
                };
                let request =
                    self.build_request(kind, origin, descriptor, key, credential.as_ref());
                debug!(
                    endpoint = %descriptor.endpoint_label(),
                    channel = kind.as_str(),
                    attempt,
                    authorised = credential.is_some(),
                    "sending request"
                );
                let result = self.transport.send(&request).await;
                if let (Ok(response), Some(sent)) = (&result, &credential) {
                    if response.status == 401 {
                        self.revoke(sent, descriptor);
                    }
                }
                assess(result)
            })
            .await
    }

    fn build_request(
        &self,
        kind: ChannelKind,
        origin: Option<&Url>,
        descriptor: &RequestDescriptor,
        key: Option<&IdempotencyKey>,
        credential: Option<&Credential>,
    ) -> OutboundRequest {
        let channel = self.channels.channel(kind);
        let base = origin.unwrap_or_else(|| self.channels.base_for(kind, descriptor.method()));
        let url = resolve_endpoint(base, descriptor.path(), descriptor.query());

        let mut headers = channel.default_headers().to_vec();
        if matches!(
            descriptor.body(),
            RequestBody::Json(_) | RequestBody::SensitiveJson(_)
        ) {
            headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
        }
        if let Some(key) = key {
            headers.push((IDEMPOTENCY_KEY_HEADER.to_owned(), key.to_string()));
        }
        if let Some(credential) = credential {
            headers.push(("Authorization".to_owned(), credential.bearer_header()));
        }

        OutboundRequest {
            method: descriptor.method(),
            url,
            headers,
            body: descriptor.body().clone(),
            timeout: channel.timeout(),
        }
    }

    fn revoke(&self, sent: &Credential, descriptor: &RequestDescriptor) {
        match self.credentials.revoke(sent) {
            Ok(true) => warn!(
                endpoint = %descriptor.endpoint_label(),
                "authenticated channel rejected the credential; cleared it"
            ),
            Ok(false) => debug!(
                endpoint = %descriptor.endpoint_label(),
                "rejected credential was already replaced"
            ),
            Err(error) => warn!(
                endpoint = %descriptor.endpoint_label(),
                %error,
                "failed to clear rejected credential"
            ),
        }
    }
}

fn idempotency_key_for(descriptor: &RequestDescriptor) -> Option<IdempotencyKey> {
    (!descriptor.method().is_read()).then(IdempotencyKey::random)
}
