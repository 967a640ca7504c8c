//! Atomic, capability-scoped storage for small secrets.
//!
//! A [`TokenVault`] wraps one directory handle and keeps each secret in its
//! own file, named after the key. Writes go through a hidden temporary file
//! followed by a rename, so a reader observes either the previous secret or
//! the new one and never a torn write.
//!
//! The crate knows nothing about what the secrets mean; callers decide which
//! keys exist and when they are written or removed.
//!
//! # Example
//!
//! ```
//! use camino::Utf8Path;
//! use token_vault::TokenVault;
//!
//! let temp = tempfile::tempdir().expect("temp dir");
//! let root = Utf8Path::from_path(temp.path()).expect("utf-8 temp dir");
//! let vault = TokenVault::open_ambient(&root.join("vault")).expect("open vault");
//!
//! vault.write("session-token", "abc123").expect("write secret");
//! let secret = vault.read("session-token").expect("read secret");
//! assert_eq!(secret.as_deref().map(String::as_str), Some("abc123"));
//!
//! vault.remove("session-token").expect("remove secret");
//! assert!(vault.read("session-token").expect("read secret").is_none());
//! ```

mod atomic_io;
mod error;
mod vault;

pub use error::VaultError;
pub use vault::TokenVault;
