//! Bearer credential value.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

/// Validation errors for [`Credential`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialValidationError {
    /// The token was empty or whitespace.
    #[error("bearer token must not be blank")]
    Blank,
    /// The token contained characters that cannot appear in a header.
    #[error("bearer token must be visible ASCII without whitespace")]
    InvalidCharacters,
}

/// Opaque bearer token. The backing buffer is wiped on drop and never
/// rendered by `Debug`.
///
/// # Examples
/// ```
/// use client::domain::Credential;
///
/// let credential = Credential::new("abc.def").expect("valid token");
/// assert_eq!(credential.bearer_header(), "Bearer abc.def");
/// assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Validate and wrap a raw token.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialValidationError`] for blank tokens or tokens that
    /// cannot travel in an `Authorization` header.
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let token = Zeroizing::new(token.into());
        if token.trim().is_empty() {
            return Err(CredentialValidationError::Blank);
        }
        if !token.bytes().all(|byte| byte.is_ascii_graphic()) {
            return Err(CredentialValidationError::InvalidCharacters);
        }
        Ok(Self(token))
    }

    /// Raw token text.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// `Authorization` header value.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
