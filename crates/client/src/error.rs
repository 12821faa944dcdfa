//! Unified error handling.
//!
//! Provides a unified `ClientError` that front ends can return from any
//! operation, and the user-facing text for each failure. Server rejections are
//! shown verbatim; transport and storage failures get generic text.

use thiserror::Error;

use glow_core::{OtpError, UnknownCategory};

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::{AddServiceError, AuthError, ClearCartError, ProfileError};
use crate::session::SessionError;
use crate::store::StoreError;

const NETWORK_MESSAGE: &str = "Network error. Please check your connection and try again.";
const STORAGE_MESSAGE: &str = "Could not read or write local data.";
const NOT_SIGNED_IN_MESSAGE: &str = "Please log in to continue.";

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Session lookup or save failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Adding a service to the cart failed.
    #[error("Add to cart failed: {0}")]
    AddService(#[from] AddServiceError),

    /// Clearing the cart failed.
    #[error("Clear cart failed: {0}")]
    ClearCart(#[from] ClearCartError),

    /// Profile operation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// An OTP was not six digits.
    #[error("Invalid OTP: {0}")]
    Otp(#[from] OtpError),

    /// A service category name is not in the catalog.
    #[error(transparent)]
    Category(#[from] UnknownCategory),
}

impl ClientError {
    /// Text to show the user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.to_string(),
            Self::Api(e) => api_message(e),
            Self::Store(_) => STORAGE_MESSAGE.to_string(),
            Self::Session(e) => match e {
                SessionError::NotSignedIn => NOT_SIGNED_IN_MESSAGE.to_string(),
                SessionError::Store(_) => STORAGE_MESSAGE.to_string(),
            },
            Self::AddService(e) => match e {
                AddServiceError::Rejected(reason) => reason.clone(),
                AddServiceError::NetworkFailed(_) => "Failed to add service. Please try again.".to_string(),
                AddServiceError::InFlight => "Still adding the previous service, please wait.".to_string(),
            },
            Self::ClearCart(e) => match e {
                ClearCartError::Rejected(reason) => reason.clone(),
                ClearCartError::NetworkFailed(_) => "Failed to clear cart. Please try again.".to_string(),
            },
            Self::Profile(e) => match e {
                ProfileError::NotSignedIn => NOT_SIGNED_IN_MESSAGE.to_string(),
                ProfileError::Rejected(reason) => reason.clone(),
                ProfileError::Network(_) => NETWORK_MESSAGE.to_string(),
                ProfileError::Store(_) => STORAGE_MESSAGE.to_string(),
                ProfileError::InvalidEmail(_) => "Invalid email address".to_string(),
                ProfileError::Io(err) => format!("Could not read image: {err}"),
            },
            Self::Auth(e) => match e {
                AuthError::Rejected(reason) => reason.clone(),
                AuthError::Network(_) => NETWORK_MESSAGE.to_string(),
                AuthError::Store(_) => STORAGE_MESSAGE.to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                other => other.to_string(),
            },
            Self::Otp(e) => e.to_string(),
            Self::Category(e) => e.to_string(),
        }
    }
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Rejected {
            message: Some(reason),
            ..
        } => reason.clone(),
        ApiError::Rejected { status, .. } => format!("Request failed with status {status}"),
        ApiError::NotFound(what) => what.clone(),
        ApiError::Http(_) => NETWORK_MESSAGE.to_string(),
        ApiError::Parse(_) | ApiError::Url(_) => "Unexpected response from the server.".to_string(),
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_verbatim() {
        let err = ClientError::from(AddServiceError::Rejected(
            "Service from this category already added".to_string(),
        ));
        assert_eq!(err.user_message(), "Service from this category already added");

        let err = ClientError::from(AuthError::Rejected("Invalid OTP".to_string()));
        assert_eq!(err.user_message(), "Invalid OTP");
    }

    #[test]
    fn test_not_signed_in_message() {
        let err = ClientError::from(SessionError::NotSignedIn);
        assert_eq!(err.user_message(), NOT_SIGNED_IN_MESSAGE);

        let err = ClientError::from(ProfileError::NotSignedIn);
        assert_eq!(err.user_message(), NOT_SIGNED_IN_MESSAGE);
    }

    #[test]
    fn test_storage_failures_are_generic() {
        let io = std::io::Error::other("disk full");
        let err = ClientError::from(StoreError::Io(io));
        assert_eq!(err.user_message(), STORAGE_MESSAGE);
    }

    #[test]
    fn test_api_rejection_without_reason() {
        let err = ClientError::from(ApiError::Rejected {
            status: 502,
            message: None,
        });
        assert_eq!(err.user_message(), "Request failed with status 502");
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::from(AddServiceError::InFlight);
        assert_eq!(
            err.to_string(),
            "Add to cart failed: an add-to-cart request for this salon is already in progress"
        );
    }
}
