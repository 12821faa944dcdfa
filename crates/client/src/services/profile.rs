//! Profile and avatar management for the signed-in user.
//!
//! Profile fields live only in the local session. The avatar is stored by
//! the server; the session keeps the last URL the server returned.

use std::path::Path;

use thiserror::Error;
use tracing::instrument;

use glow_core::{Email, EmailError};

use crate::api::{ApiClient, ApiError};
use crate::session::{Session, SessionError, SessionStore};
use crate::store::StoreError;

/// Errors that can occur during profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No session; the user must log in first.
    #[error("not signed in")]
    NotSignedIn,

    /// The new email address is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The server refused the upload; carries its reason verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The request did not complete.
    #[error("network request failed: {0}")]
    Network(#[source] ApiError),

    /// The image file could not be read.
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),

    /// The session could not be saved.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

impl From<SessionError> for ProfileError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotSignedIn => Self::NotSignedIn,
            SessionError::Store(e) => Self::Store(e),
        }
    }
}

impl From<ApiError> for ProfileError {
    fn from(err: ApiError) -> Self {
        err.into_rejection_reason()
            .map_or_else(Self::Network, Self::Rejected)
    }
}

/// Edits from the profile form. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// An empty string removes the phone number.
    pub phone: Option<String>,
}

/// Profile service.
pub struct ProfileService<'a> {
    api: &'a ApiClient,
    sessions: &'a SessionStore,
}

impl<'a> ProfileService<'a> {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(api: &'a ApiClient, sessions: &'a SessionStore) -> Self {
        Self { api, sessions }
    }

    /// Merge form edits into the session and save it.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, `InvalidEmail` for a
    /// malformed address, or a store error if the session cannot be saved.
    pub fn save_profile(&self, update: ProfileUpdate) -> Result<Session, ProfileError> {
        let mut session = self.sessions.require()?;

        if let Some(name) = update.name {
            session.name = name.trim().to_owned();
        }
        if let Some(email) = update.email {
            session.email = Email::parse(&email)?.into_inner();
        }
        if let Some(phone) = update.phone {
            let phone = phone.trim();
            session.phone = (!phone.is_empty()).then(|| phone.to_owned());
        }

        self.sessions.save(&session)?;
        tracing::info!(user_id = %session.user_id, "Profile updated");
        Ok(session)
    }

    /// Refresh the avatar URL from the server.
    ///
    /// On failure the session is left as is and its current avatar URL is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, or a store error if the
    /// refreshed session cannot be saved.
    #[instrument(skip(self))]
    pub async fn refresh_avatar(&self) -> Result<Option<String>, ProfileError> {
        let mut session = self.sessions.require()?;

        match self.api.get_profile_image(&session.user_id).await {
            Ok(image) => {
                session.avatar_url = Some(image.image_url).filter(|url| !url.is_empty());
                self.sessions.save(&session)?;
                Ok(session.avatar_url)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh profile image, keeping cached URL");
                Ok(session.avatar_url)
            }
        }
    }

    /// Upload an image file as the new avatar.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, `Io` if the file cannot be
    /// read, `Rejected`/`Network` if the upload fails (the session is left
    /// unchanged), or a store error if the session cannot be saved.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_avatar(&self, path: &Path) -> Result<Session, ProfileError> {
        let mut session = self.sessions.require()?;

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("avatar")
            .to_owned();

        let image = self
            .api
            .upload_profile_image(&session.user_id, &file_name, image_content_type(path), bytes)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Profile image upload failed"))?;

        session.avatar_url = Some(image.image_url);
        self.sessions.save(&session)?;
        tracing::info!(user_id = %session.user_id, "Profile image updated");
        Ok(session)
    }

    /// Clear the avatar URL locally.
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` without a session, or a store error if the
    /// session cannot be saved.
    pub fn remove_avatar(&self) -> Result<Session, ProfileError> {
        let mut session = self.sessions.require()?;
        session.avatar_url = None;
        self.sessions.save(&session)?;
        Ok(session)
    }
}

/// Content type for an image upload, from the file extension.
fn image_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
