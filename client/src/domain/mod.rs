//! Domain core of the access layer.
//!
//! Purpose: own the routing, retry, and classification decisions made for
//! every call. Adapters plug in through [`ports`]; nothing here performs I/O
//! directly.
//!
//! Public surface:
//! - [`AccessLayer`] and its resource methods.
//! - [`AccessError`] / [`AccessErrorKind`], the stable error vocabulary.
//! - Value types for channels, credentials, and request descriptors.
//! - The pure routing table ([`transition`]) and retry assessment
//!   ([`assess`]) so callers can reason about behaviour without a network.

mod access_layer;
mod channel;
mod classifier;
mod credential;
mod dispatch;
mod error;
mod idempotency;
pub mod ports;
mod request;
mod resources;
mod retry;

pub use self::access_layer::{AccessLayer, AccessLayerPorts};
pub use self::channel::{Channel, ChannelConfigError, ChannelKind, ChannelSet};
pub use self::classifier::{classify, decode_failure};
pub use self::credential::{Credential, CredentialValidationError};
pub use self::dispatch::{ChannelVerdict, DispatchState, Dispatched, Dispatcher, Route, transition};
pub use self::error::{AccessError, AccessErrorKind};
pub use self::idempotency::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey};
pub use self::request::{
    Method, RequestBody, RequestDescriptor, SensitiveJson, UploadForm, UploadPart,
};
pub use self::resources::{
    Activity, ActivityOverview, ActivityQuery, ActivitySummary, ImageUpload, LoginRequest, Page,
    PaymentSession, PaymentSessionRequest, PaymentStatus, Profile, ProfileImage, ProfileUpdate,
    RegistrationRequest, Stage, UserAccount,
};
pub use self::retry::{
    BackoffJitter, BackoffSleeper, Failure, NoJitter, Outcome, ProportionalJitter, RetryEngine,
    RetryPolicies, RetryPolicy, RetryRuntime, TokioSleeper, assess,
};
