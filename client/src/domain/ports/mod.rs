//! Domain ports and supporting types for the access layer.

mod macros;
pub(crate) use macros::define_port_error;

mod channel_transport;
mod credential_store;

#[cfg(test)]
pub use channel_transport::MockChannelTransport;
pub use channel_transport::{
    ChannelTransport, FixtureChannelTransport, OutboundRequest, TransportError, TransportResponse,
};
#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, CredentialStoreError, FixtureCredentialStore};
