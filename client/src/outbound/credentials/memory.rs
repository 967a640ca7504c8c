//! Process-local credential store.

use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use crate::domain::Credential;
use crate::domain::ports::{CredentialStore, CredentialStoreError};

/// Holds the credential in memory only; it is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl InMemoryCredentialStore {
    /// Store seeded with `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Credential>>, CredentialStoreError> {
        self.slot
            .lock()
            .map_err(|_| CredentialStoreError::unavailable("credential slot poisoned"))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        match self.lock() {
            Ok(slot) => slot.clone(),
            Err(error) => {
                warn!(%error, "credential slot unreadable; treating as signed out");
                None
            }
        }
    }

    fn set(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        *self.lock()? = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.lock()? = None;
        Ok(())
    }

    fn revoke(&self, stale: &Credential) -> Result<bool, CredentialStoreError> {
        let mut slot = self.lock()?;
        if slot.as_ref() == Some(stale) {
            *slot = None;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn credential(token: &str) -> Credential {
        Credential::new(token).expect("valid token")
    }

    #[rstest]
    fn starts_empty() {
        assert_eq!(InMemoryCredentialStore::default().get(), None);
    }

    #[rstest]
    fn set_then_clear() {
        let store = InMemoryCredentialStore::default();
        store.set(credential("abc")).expect("set");
        assert_eq!(store.get(), Some(credential("abc")));
        store.clear().expect("clear");
        assert_eq!(store.get(), None);
    }

    #[rstest]
    #[case::matching("abc", true, None)]
    #[case::replaced("older", false, Some("abc"))]
    fn revoke_only_clears_the_matching_credential(
        #[case] stale: &str,
        #[case] removed: bool,
        #[case] remaining: Option<&str>,
    ) {
        let store = InMemoryCredentialStore::with_credential(credential("abc"));
        assert_eq!(store.revoke(&credential(stale)).expect("revoke"), removed);
        assert_eq!(store.get(), remaining.map(credential));
    }
}
