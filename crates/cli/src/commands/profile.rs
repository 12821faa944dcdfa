//! Profile commands.

use std::path::Path;

use glow_client::services::ProfileUpdate;
use glow_client::session::Session;
use glow_client::{AppState, ClientError};

fn report(session: &Session) {
    tracing::info!("Name:     {}", session.name);
    tracing::info!("Email:    {}", session.email);
    tracing::info!("Phone:    {}", session.phone.as_deref().unwrap_or("-"));
    tracing::info!("Avatar:   {}", session.avatar_url.as_deref().unwrap_or("-"));
    tracing::info!(
        "Verified: {}",
        if session.is_account_verified { "yes" } else { "no" }
    );
}

/// Show the signed-in profile.
pub fn show(state: &AppState) -> Result<(), ClientError> {
    let session = state.sessions().require()?;
    report(&session);
    Ok(())
}

/// Update profile fields.
pub fn update(
    state: &AppState,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<(), ClientError> {
    let session = state
        .profile()
        .save_profile(ProfileUpdate { name, email, phone })?;
    tracing::info!("Profile updated successfully");
    report(&session);
    Ok(())
}

/// Upload a new avatar image.
pub async fn upload_avatar(state: &AppState, path: &Path) -> Result<(), ClientError> {
    let session = state.profile().upload_avatar(path).await?;
    tracing::info!(
        "Profile image updated: {}",
        session.avatar_url.as_deref().unwrap_or("-")
    );
    Ok(())
}

/// Refresh the avatar URL from the server.
pub async fn refresh_avatar(state: &AppState) -> Result<(), ClientError> {
    match state.profile().refresh_avatar().await? {
        Some(url) => tracing::info!("Profile image: {url}"),
        None => tracing::info!("No profile image"),
    }
    Ok(())
}

/// Remove the avatar locally.
pub fn remove_avatar(state: &AppState) -> Result<(), ClientError> {
    state.profile().remove_avatar()?;
    tracing::info!("Profile image removed");
    Ok(())
}
