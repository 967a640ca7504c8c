//! The vault handle and its key-scoped operations.

use std::io;

use camino::{Utf8Component, Utf8Path};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use zeroize::Zeroizing;

use crate::atomic_io::replace_entry;
use crate::error::VaultError;

/// Directory-scoped store holding one secret per key.
///
/// All filesystem access goes through the wrapped [`Dir`] capability, so a
/// vault can never reach outside the directory it was opened on.
#[derive(Debug)]
pub struct TokenVault {
    dir: Dir,
}

impl TokenVault {
    /// Wrap an already-opened directory capability.
    #[must_use]
    pub const fn open(dir: Dir) -> Self {
        Self { dir }
    }

    /// Open the vault at `path`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::OpenDirectory`] when the directory cannot be
    /// created or opened.
    pub fn open_ambient(path: &Utf8Path) -> Result<Self, VaultError> {
        let to_error = |error: io::Error| VaultError::OpenDirectory {
            path: path.to_path_buf(),
            message: error.to_string(),
        };
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(to_error)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority()).map_err(to_error)?;
        Ok(Self::open(dir))
    }

    /// Read the secret stored under `key`.
    ///
    /// A missing or empty entry reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidKey`] for malformed keys and
    /// [`VaultError::Read`] when the entry exists but cannot be read.
    pub fn read(&self, key: &str) -> Result<Option<Zeroizing<String>>, VaultError> {
        let entry = validate_key(key)?;
        match self.dir.read_to_string(entry) {
            Ok(contents) => {
                let secret = Zeroizing::new(contents);
                if secret.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(secret))
                }
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(VaultError::Read {
                key: key.to_owned(),
                message: error.to_string(),
            }),
        }
    }

    /// Atomically replace the secret stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidKey`] for malformed keys and
    /// [`VaultError::Write`] when staging or renaming fails.
    pub fn write(&self, key: &str, secret: &str) -> Result<(), VaultError> {
        let entry = validate_key(key)?;
        replace_entry(&self.dir, entry, secret.as_bytes()).map_err(|error| VaultError::Write {
            key: key.to_owned(),
            message: error.to_string(),
        })
    }

    /// Remove the secret stored under `key`; removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidKey`] for malformed keys and
    /// [`VaultError::Remove`] when the entry exists but cannot be removed.
    pub fn remove(&self, key: &str) -> Result<(), VaultError> {
        let entry = validate_key(key)?;
        match self.dir.remove_file(entry) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(VaultError::Remove {
                key: key.to_owned(),
                message: error.to_string(),
            }),
        }
    }
}

fn validate_key(key: &str) -> Result<&str, VaultError> {
    let mut components = Utf8Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(Utf8Component::Normal(name)), None) if !name.starts_with('.') => Ok(name),
        _ => Err(VaultError::InvalidKey {
            key: key.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for key validation and entry lifecycle.
    #![expect(
        clippy::expect_used,
        reason = "test code uses expect for clear failure messages"
    )]

    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct OpenVault {
        temp: TempDir,
        vault: TokenVault,
    }

    #[fixture]
    fn open_vault() -> OpenVault {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
        OpenVault {
            temp,
            vault: TokenVault::open(dir),
        }
    }

    #[rstest]
    #[case::nested("nested/token")]
    #[case::parent("../token")]
    #[case::hidden(".token")]
    #[case::absolute("/etc/token")]
    #[case::empty("")]
    fn rejects_keys_that_are_not_plain_file_names(#[case] key: &str) {
        assert!(matches!(
            validate_key(key),
            Err(VaultError::InvalidKey { .. })
        ));
    }

    #[rstest]
    fn accepts_plain_file_names() {
        assert_eq!(validate_key("session-token"), Ok("session-token"));
    }

    #[rstest]
    fn missing_entry_reads_as_none(open_vault: OpenVault) {
        let secret = open_vault.vault.read("session-token").expect("read");
        assert!(secret.is_none());
    }

    #[rstest]
    fn write_replaces_previous_secret(open_vault: OpenVault) {
        let vault = &open_vault.vault;
        vault.write("session-token", "first").expect("first write");
        vault.write("session-token", "second").expect("second write");

        let secret = vault.read("session-token").expect("read").expect("present");
        assert_eq!(secret.as_str(), "second");
    }

    #[rstest]
    fn write_leaves_no_staging_files_behind(open_vault: OpenVault) {
        let vault = &open_vault.vault;
        vault.write("session-token", "value").expect("write");

        let names: Vec<String> = vault
            .dir
            .entries()
            .expect("list entries")
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        assert_eq!(names, vec!["session-token".to_owned()]);
    }

    #[rstest]
    fn empty_entry_reads_as_none(open_vault: OpenVault) {
        let vault = &open_vault.vault;
        vault.write("session-token", "").expect("write");
        assert!(vault.read("session-token").expect("read").is_none());
    }

    #[rstest]
    fn removing_absent_entry_succeeds(open_vault: OpenVault) {
        open_vault
            .vault
            .remove("session-token")
            .expect("remove absent entry");
    }

    #[cfg(unix)]
    #[rstest]
    fn entries_are_private_to_the_owner(open_vault: OpenVault) {
        use std::os::unix::fs::PermissionsExt;

        open_vault
            .vault
            .write("session-token", "value")
            .expect("write");
        let path = open_vault.temp.path().join("session-token");
        let mode = std::fs::metadata(path)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
