//! Credential store persisted through a [`TokenVault`].

use std::sync::{Mutex, MutexGuard};

use camino::Utf8Path;
use token_vault::{TokenVault, VaultError};
use tracing::warn;

use crate::domain::Credential;
use crate::domain::ports::{CredentialStore, CredentialStoreError};

/// Persists the bearer credential as one vault entry.
///
/// A single mutex serialises writes so that compare-and-clear on a rejected
/// credential cannot race a concurrent sign-in.
#[derive(Debug)]
pub struct VaultCredentialStore {
    vault: TokenVault,
    key: String,
    writes: Mutex<()>,
}

impl VaultCredentialStore {
    /// Wrap an opened vault, storing the credential under `key`.
    pub fn new(vault: TokenVault, key: impl Into<String>) -> Self {
        Self {
            vault,
            key: key.into(),
            writes: Mutex::new(()),
        }
    }

    /// Open (creating if needed) the vault directory at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Unavailable`] when the directory
    /// cannot be opened.
    pub fn open(dir: &Utf8Path, key: impl Into<String>) -> Result<Self, CredentialStoreError> {
        let vault = TokenVault::open_ambient(dir).map_err(unavailable)?;
        Ok(Self::new(vault, key))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, CredentialStoreError> {
        self.writes
            .lock()
            .map_err(|_| CredentialStoreError::unavailable("credential write lock poisoned"))
    }

    fn load(&self) -> Option<Credential> {
        let secret = match self.vault.read(&self.key) {
            Ok(secret) => secret?,
            Err(error) => {
                warn!(key = %self.key, %error, "stored credential unreadable; treating as signed out");
                return None;
            }
        };
        match Credential::new(secret.as_str()) {
            Ok(credential) => Some(credential),
            Err(error) => {
                warn!(key = %self.key, %error, "stored credential malformed; treating as signed out");
                None
            }
        }
    }

    fn remove(&self) -> Result<(), CredentialStoreError> {
        self.vault.remove(&self.key).map_err(write_failed)
    }
}

impl CredentialStore for VaultCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.load()
    }

    fn set(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        let _guard = self.lock()?;
        self.vault
            .write(&self.key, credential.expose())
            .map_err(write_failed)
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.lock()?;
        self.remove()
    }

    fn revoke(&self, stale: &Credential) -> Result<bool, CredentialStoreError> {
        let _guard = self.lock()?;
        if self.load().as_ref() == Some(stale) {
            self.remove()?;
            return Ok(true);
        }
        Ok(false)
    }
}

fn unavailable(error: VaultError) -> CredentialStoreError {
    CredentialStoreError::unavailable(error.to_string())
}

fn write_failed(error: VaultError) -> CredentialStoreError {
    CredentialStoreError::write(error.to_string())
}
