//! Typed resource methods: the only sanctioned way to reach the API.
//!
//! Each method builds its [`RequestDescriptor`](crate::domain::RequestDescriptor),
//! hands it to the access layer, and decodes the payload. Routing, retries,
//! and classification are never re-implemented here.

mod activities;
mod auth;
mod payments;
mod profile;

pub use activities::{Activity, ActivityOverview, ActivityQuery, ActivitySummary, Page, Stage};
pub use auth::{LoginRequest, RegistrationRequest, UserAccount};
pub use payments::{PaymentSession, PaymentSessionRequest, PaymentStatus};
pub use profile::{ImageUpload, Profile, ProfileImage, ProfileUpdate};

use crate::domain::AccessError;

/// Validate an identifier before it becomes a path segment.
fn resource_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, AccessError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.contains('/') || trimmed == "." || trimmed == ".." {
        return Err(AccessError::validation(format!("`{id}` is not a valid {kind} id.")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests;
