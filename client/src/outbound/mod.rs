//! Outbound adapters implementing the domain ports.
//!
//! - **http**: reqwest-backed [`ChannelTransport`](crate::domain::ports::ChannelTransport).
//! - **credentials**: in-memory and vault-backed
//!   [`CredentialStore`](crate::domain::ports::CredentialStore) adapters.
//!
//! Adapters translate between wire or storage representations and domain
//! types. Routing and retry decisions stay in the domain.

pub mod credentials;
pub mod http;
