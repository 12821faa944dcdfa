//! Authentication service.
//!
//! Account registration with email OTP verification, password login, and
//! password reset. All checks beyond basic form validation happen on the
//! server; a successful login is the only flow that creates local state.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use glow_core::{Email, OtpCode};

use crate::api::ApiClient;
use crate::session::{Session, SessionStore};

const REGISTER_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Login failed!";
const INVALID_OTP: &str = "Invalid OTP";
const SEND_OTP_FAILED: &str = "Failed to send OTP";
const RESET_FAILED: &str = "Failed!";

/// Fields of the registration form.
#[derive(Debug)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub accepted_terms: bool,
}

/// Authentication service.
pub struct AuthService<'a> {
    api: &'a ApiClient,
    sessions: &'a SessionStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: &'a ApiClient, sessions: &'a SessionStore) -> Self {
        Self { api, sessions }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account. On success the server emails an OTP to the
    /// returned address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` for a blank field,
    /// `AuthError::InvalidEmail` for a malformed address,
    /// `AuthError::TermsNotAccepted` if the terms box is unchecked, or
    /// `AuthError::Rejected`/`AuthError::Network` if the request fails.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegisterForm) -> Result<Email, AuthError> {
        let name = required("name", &form.name)?;
        let email = Email::parse(required("email", &form.email)?)?;
        required("password", form.password.expose_secret())?;
        if !form.accepted_terms {
            return Err(AuthError::TermsNotAccepted);
        }

        self.api
            .register(name, &email, &form.password)
            .await
            .map_err(|e| AuthError::from_api(e, REGISTER_FAILED))?;

        tracing::info!("Registration accepted, OTP sent");
        Ok(email)
    }

    /// Verify the OTP emailed after registration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, or
    /// `AuthError::Rejected`/`AuthError::Network` if the request fails.
    #[instrument(skip(self, otp))]
    pub async fn verify_otp(&self, email: &str, otp: &OtpCode) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.api
            .verify_otp(&email, otp)
            .await
            .map_err(|e| AuthError::from_api(e, INVALID_OTP))
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Log in and persist the resulting session.
    ///
    /// Missing name, email, or verification fields in the response default to
    /// empty/false.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField`/`AuthError::InvalidEmail` for bad
    /// input, `AuthError::Rejected`/`AuthError::Network` if the request fails,
    /// `AuthError::MissingUserId` if the response has no user id, or
    /// `AuthError::Store` if the session cannot be saved.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, AuthError> {
        let email = Email::parse(required("email", email)?)?;
        required("password", password.expose_secret())?;

        let user = self
            .api
            .login(&email, password)
            .await
            .map_err(|e| AuthError::from_api(e, LOGIN_FAILED))?;

        if user.user_id.is_empty() {
            tracing::warn!("Login response did not include a user id");
            return Err(AuthError::MissingUserId);
        }

        let session = Session {
            is_account_verified: user.is_account_verified,
            ..Session::new(user.user_id, user.name, user.email)
        };
        self.sessions.save(&session)?;

        tracing::info!(user_id = %session.user_id, "User logged in");
        Ok(session)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Request a password-reset OTP.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, or
    /// `AuthError::Rejected`/`AuthError::Network` if the request fails.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Email, AuthError> {
        let email = Email::parse(required("email", email)?)?;
        self.api
            .forgot_password(&email)
            .await
            .map_err(|e| AuthError::from_api(e, SEND_OTP_FAILED))?;
        Ok(email)
    }

    /// Verify the password-reset OTP.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, or
    /// `AuthError::Rejected`/`AuthError::Network` if the request fails.
    #[instrument(skip(self, otp))]
    pub async fn verify_reset_otp(&self, email: &str, otp: &OtpCode) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.api
            .verify_reset_otp(&email, otp)
            .await
            .map_err(|e| AuthError::from_api(e, INVALID_OTP))
    }

    /// Set a new password after a verified reset.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField`/`AuthError::InvalidEmail` for bad
    /// input, or `AuthError::Rejected`/`AuthError::Network` if the request
    /// fails.
    #[instrument(skip(self, password))]
    pub async fn new_password(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        required("password", password.expose_secret())?;
        self.api
            .new_password(&email, password)
            .await
            .map_err(|e| AuthError::from_api(e, RESET_FAILED))
    }
}

/// Trimmed value of a required form field.
fn required<'v>(field: &'static str, value: &'v str) -> Result<&'v str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(value)
    }
}
