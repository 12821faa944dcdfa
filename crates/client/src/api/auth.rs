//! Account endpoints: registration, OTP verification, login, password reset.
//!
//! Every call is a JSON `POST`; failures carry a `message` field which
//! [`ApiClient::send`] surfaces through [`ApiError::Rejected`].

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use glow_core::{Email, OtpCode};

use super::{ApiClient, ApiError, AuthUser, parse_body};

#[derive(Serialize)]
struct RegisterBody<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    otp: &'a str,
}

impl ApiClient {
    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        self.send(self.http().post(url).json(body)).await
    }

    /// Create an account. On success the server emails a verification OTP.
    ///
    /// The account id is the current time in epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<(), ApiError> {
        let body = RegisterBody {
            id: chrono::Utc::now().timestamp_millis().to_string(),
            name,
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.post_json("register", &body).await?;
        Ok(())
    }

    /// Confirm the OTP sent after registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the code is rejected.
    #[instrument(skip(self, otp), fields(email = %email))]
    pub async fn verify_otp(&self, email: &Email, otp: &OtpCode) -> Result<(), ApiError> {
        let body = OtpBody {
            email: email.as_str(),
            otp: otp.as_str(),
        };
        self.post_json("verify-otp", &body).await?;
        Ok(())
    }

    /// Sign in and return the user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the credentials are rejected,
    /// or the body is not a user record.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<AuthUser, ApiError> {
        let body = CredentialsBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response = self.post_json("login", &body).await?;
        parse_body(&response)
    }

    /// Ask the server to email a password-reset OTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &Email) -> Result<(), ApiError> {
        self.post_json(
            "forgot-password",
            &EmailBody {
                email: email.as_str(),
            },
        )
        .await?;
        Ok(())
    }

    /// Confirm the password-reset OTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the code is rejected.
    #[instrument(skip(self, otp), fields(email = %email))]
    pub async fn verify_reset_otp(&self, email: &Email, otp: &OtpCode) -> Result<(), ApiError> {
        let body = OtpBody {
            email: email.as_str(),
            otp: otp.as_str(),
        };
        self.post_json("verify-reset-otp", &body).await?;
        Ok(())
    }

    /// Set a new password after a verified reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn new_password(&self, email: &Email, password: &SecretString) -> Result<(), ApiError> {
        let body = CredentialsBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        self.post_json("new-password", &body).await?;
        Ok(())
    }
}
