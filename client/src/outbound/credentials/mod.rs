//! Credential store adapters.

mod memory;
mod vault;

pub use memory::InMemoryCredentialStore;
pub use vault::VaultCredentialStore;
