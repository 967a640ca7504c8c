//! Error types for vault operations.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while opening, reading, or mutating a vault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The key is not a single visible file name.
    #[error("vault key `{key}` must be a single, non-hidden file name")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },
    /// The backing directory could not be opened or created.
    #[error("failed to open vault directory `{path}`: {message}")]
    OpenDirectory {
        /// Directory that failed to open.
        path: Utf8PathBuf,
        /// Underlying I/O error description.
        message: String,
    },
    /// Reading a stored secret failed for a reason other than absence.
    #[error("failed to read vault entry `{key}`: {message}")]
    Read {
        /// Key being read.
        key: String,
        /// Underlying I/O error description.
        message: String,
    },
    /// Writing a secret failed; the previous value is left in place.
    #[error("failed to write vault entry `{key}`: {message}")]
    Write {
        /// Key being written.
        key: String,
        /// Underlying I/O error description.
        message: String,
    },
    /// Removing a secret failed for a reason other than absence.
    #[error("failed to remove vault entry `{key}`: {message}")]
    Remove {
        /// Key being removed.
        key: String,
        /// Underlying I/O error description.
        message: String,
    },
}
