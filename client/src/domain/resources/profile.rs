//! The signed-in user's profile.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::{AccessError, AccessLayer, RequestDescriptor, UploadForm};

/// Form field carrying the image bytes.
const IMAGE_FIELD: &str = "image";

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account identifier.
    pub id: String,
    /// Sign-in email.
    pub email: String,
    /// Public display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Current profile image address.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Free-text biography.
    #[serde(default)]
    pub bio: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Raw image bytes plus the metadata the multipart part needs.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// File name reported in the multipart part.
    pub file_name: String,
    /// MIME type of the image, e.g. `image/jpeg`.
    pub content_type: String,
    /// Encoded image.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of a profile image upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileImage {
    /// Address of the stored image.
    pub url: String,
}

impl AccessLayer {
    /// Fetch the profile. Reads are public-first and escalate on 401/403.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AccessError`] of the call.
    pub async fn get_profile(&self, cancel: &CancellationToken) -> Result<Profile, AccessError> {
        self.fetch_json(&RequestDescriptor::get("/profile"), cancel)
            .await
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty update, otherwise the classified
    /// [`AccessError`] of the call.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
        cancel: &CancellationToken,
    ) -> Result<Profile, AccessError> {
        if update == &ProfileUpdate::default() {
            return Err(AccessError::validation("There is nothing to update."));
        }
        let body = serde_json::to_value(update).map_err(|error| {
            AccessError::unknown(format!("Could not prepare the update: {error}"))
        })?;
        let descriptor = RequestDescriptor::put("/profile").with_json(body);
        self.fetch_json(&descriptor, cancel).await
    }

    /// Upload a new profile image straight to the backend origin.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty image, otherwise the classified
    /// [`AccessError`] of the call.
    pub async fn upload_profile_image(
        &self,
        image: ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<ProfileImage, AccessError> {
        if image.bytes.is_empty() {
            return Err(AccessError::validation("The selected image is empty."));
        }
        let form = UploadForm::new().file(
            IMAGE_FIELD,
            image.file_name,
            image.content_type,
            image.bytes,
        );
        let descriptor = RequestDescriptor::post("/profile/image").with_form(form);
        self.upload_json(&descriptor, cancel).await
    }
}
