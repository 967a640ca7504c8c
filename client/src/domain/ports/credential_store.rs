//! Driven port for the single persisted bearer credential.
//!
//! The store is the only shared mutable state in the access layer. Ordinary
//! requests only read it; the sign-in, sign-out, and authenticated-401 paths
//! write it.

use super::define_port_error;
use crate::domain::Credential;

define_port_error! {
    /// Errors surfaced while mutating the credential store.
    pub enum CredentialStoreError {
        /// Backing storage could not be reached.
        Unavailable { message: String } =>
            "credential storage unavailable: {message}",
        /// Backing storage rejected the write.
        Write { message: String } =>
            "credential storage write failed: {message}",
    }
}

/// Port for reading and replacing the bearer credential.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Current credential. Storage failures read as `None`.
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the write cannot be persisted.
    fn set(&self, credential: Credential) -> Result<(), CredentialStoreError>;

    /// Remove the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the removal cannot be persisted.
    fn clear(&self) -> Result<(), CredentialStoreError>;

    /// Clear the store only when it still holds `stale`.
    ///
    /// Returns whether a credential was removed. The default compares then
    /// clears; adapters with a cheaper atomic primitive may override it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use client::domain::Credential;
    /// use client::domain::ports::CredentialStore;
    /// use client::outbound::credentials::InMemoryCredentialStore;
    ///
    /// let store = InMemoryCredentialStore::default();
    /// let old = Credential::new("old").expect("valid token");
    /// let fresh = Credential::new("fresh").expect("valid token");
    /// store.set(fresh.clone())?;
    ///
    /// assert!(!store.revoke(&old)?);
    /// assert_eq!(store.get(), Some(fresh));
    /// # Ok::<(), client::domain::ports::CredentialStoreError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the removal cannot be persisted.
    fn revoke(&self, stale: &Credential) -> Result<bool, CredentialStoreError> {
        match self.get() {
            Some(current) if current == *stale => self.clear().map(|()| true),
            _ => Ok(false),
        }
    }
}

/// Fixture implementation with no credential and no-op writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCredentialStore;

impl CredentialStore for FixtureCredentialStore {
    fn get(&self) -> Option<Credential> {
        None
    }

    fn set(&self, _credential: Credential) -> Result<(), CredentialStoreError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        Ok(())
    }
}
