//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::session::SessionError;
use crate::store::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] glow_core::EmailError),

    /// Registration without accepting the terms.
    #[error("you must accept the terms and conditions")]
    TermsNotAccepted,

    /// The server refused the request; carries its reason, or the flow's
    /// default message when the server gave none.
    #[error("{0}")]
    Rejected(String),

    /// The request did not complete.
    #[error("network request failed: {0}")]
    Network(#[source] ApiError),

    /// Login succeeded but the server returned no user id.
    #[error("login response did not include a user id")]
    MissingUserId,

    /// The session could not be saved or cleared.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Map an API failure, using `default` when a rejection has no reason.
    pub(crate) fn from_api(err: ApiError, default: &str) -> Self {
        match err {
            ApiError::Rejected { message, .. } => {
                Self::Rejected(message.unwrap_or_else(|| default.to_owned()))
            }
            ApiError::NotFound(_) => Self::Rejected(default.to_owned()),
            other => Self::Network(other),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Store(e) => Self::Store(e),
            SessionError::NotSignedIn => Self::Rejected("not signed in".to_owned()),
        }
    }
}
