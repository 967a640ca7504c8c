//! Sign-in, registration, and sign-out.
//!
//! Login and registration are pure-public: their 401 means "wrong
//! credentials", so they never escalate to the authenticated channel. Each
//! successful call performs exactly one credential-store write.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::domain::{AccessError, AccessLayer, Credential, RequestDescriptor, SensitiveJson};

/// Email and password for `POST /auth/login`.
#[derive(Clone)]
pub struct LoginRequest {
    email: String,
    password: Zeroizing<String>,
}

impl LoginRequest {
    /// Build a login request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New-account details for `POST /auth/register`.
#[derive(Clone)]
pub struct RegistrationRequest {
    email: String,
    password: Zeroizing<String>,
    display_name: Option<String>,
}

impl RegistrationRequest {
    /// Build a registration request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Zeroizing::new(password.into()),
            display_name: None,
        }
    }

    /// Set the public display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Account returned by login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Account identifier.
    pub id: String,
    /// Sign-in email.
    pub email: String,
    /// Public display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Borrowed wire shape of a login or registration body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInDto<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

impl SignInDto<'_> {
    fn encode(&self, path: &str) -> Result<SensitiveJson, AccessError> {
        SensitiveJson::encode(self).map_err(|error| {
            AccessError::unknown(format!("Sign-in details could not be encoded: {error}"))
                .with_endpoint(format!("POST {path}"))
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponseDto {
    #[serde(alias = "accessToken")]
    token: String,
    user: UserAccount,
}

impl AccessLayer {
    /// Sign in and store the returned bearer token.
    ///
    /// A 401 surfaces as `PermissionDenied` carrying the backend's message
    /// verbatim; the authenticated channel is never tried.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AccessError`] of the call, or `Unknown` when
    /// the token is missing, malformed, or cannot be stored.
    pub async fn login(
        &self,
        request: &LoginRequest,
        cancel: &CancellationToken,
    ) -> Result<UserAccount, AccessError> {
        let body = SignInDto {
            email: &request.email,
            password: &request.password,
            display_name: None,
        }
        .encode("/auth/login")?;
        let descriptor = RequestDescriptor::post("/auth/login")
            .with_sensitive_json(body)
            .pure_public();
        self.authenticate(&descriptor, cancel).await
    }

    /// Create an account and store the returned bearer token.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AccessError`] of the call, or `Unknown` when
    /// the token is missing, malformed, or cannot be stored.
    pub async fn register(
        &self,
        request: &RegistrationRequest,
        cancel: &CancellationToken,
    ) -> Result<UserAccount, AccessError> {
        let body = SignInDto {
            email: &request.email,
            password: &request.password,
            display_name: request.display_name.as_deref(),
        }
        .encode("/auth/register")?;
        let descriptor = RequestDescriptor::post("/auth/register")
            .with_sensitive_json(body)
            .pure_public();
        self.authenticate(&descriptor, cancel).await
    }

    /// Sign out locally by clearing the stored credential.
    ///
    /// # Errors
    ///
    /// Returns `Unknown` when the removal cannot be persisted.
    pub fn logout(&self) -> Result<(), AccessError> {
        self.sign_out()
    }

    async fn authenticate(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<UserAccount, AccessError> {
        let response: AuthResponseDto = self.fetch_json(descriptor, cancel).await?;
        let credential = Credential::new(response.token).map_err(|error| {
            AccessError::unknown(format!("The server issued an unusable session: {error}"))
                .with_endpoint(descriptor.endpoint_label())
        })?;
        self.sign_in_with(credential)?;
        Ok(response.user)
    }
}
