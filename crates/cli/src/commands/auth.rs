//! Account commands: registration, OTP verification, login, password reset.

use secrecy::SecretString;

use glow_client::services::RegisterForm;
use glow_client::{AppState, ClientError};
use glow_core::OtpCode;

/// Build an OTP from either one six-digit value or six single digits.
fn parse_otp(input: &[String]) -> Result<OtpCode, ClientError> {
    let otp = match input {
        [code] => OtpCode::parse(code)?,
        digits => OtpCode::from_digits(digits)?,
    };
    Ok(otp)
}

/// Register a new account.
pub async fn register(
    state: &AppState,
    name: String,
    email: String,
    password: String,
    accepted_terms: bool,
) -> Result<(), ClientError> {
    let form = RegisterForm {
        name,
        email,
        password: SecretString::from(password),
        accepted_terms,
    };
    let email = state.auth().register(&form).await?;
    tracing::info!("OTP sent successfully to {email}");
    Ok(())
}

/// Verify the registration OTP.
pub async fn verify_otp(state: &AppState, email: &str, otp: &[String]) -> Result<(), ClientError> {
    let otp = parse_otp(otp)?;
    state.auth().verify_otp(email, &otp).await?;
    tracing::info!("OTP verified, you can now log in");
    Ok(())
}

/// Log in and persist the session.
pub async fn login(state: &AppState, email: &str, password: String) -> Result<(), ClientError> {
    let session = state
        .auth()
        .login(email, &SecretString::from(password))
        .await?;
    tracing::info!("Welcome, {}", session.name);
    Ok(())
}

/// Log out.
pub fn logout(state: &AppState) -> Result<(), ClientError> {
    state.logout()?;
    tracing::info!("Logged out");
    Ok(())
}

/// Request a password-reset OTP.
pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), ClientError> {
    let email = state.auth().forgot_password(email).await?;
    tracing::info!("Reset OTP sent to {email}");
    Ok(())
}

/// Verify the password-reset OTP.
pub async fn verify_reset_otp(
    state: &AppState,
    email: &str,
    otp: &[String],
) -> Result<(), ClientError> {
    let otp = parse_otp(otp)?;
    state.auth().verify_reset_otp(email, &otp).await?;
    tracing::info!("OTP verified, set a new password with `glow auth new-password`");
    Ok(())
}

/// Set a new password.
pub async fn new_password(state: &AppState, email: &str, password: String) -> Result<(), ClientError> {
    state
        .auth()
        .new_password(email, &SecretString::from(password))
        .await?;
    tracing::info!("Password changed successfully");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_otp_single_value() {
        let otp = parse_otp(&["481516".to_string()]).unwrap();
        assert_eq!(otp.as_str(), "481516");
    }

    #[test]
    fn test_parse_otp_digit_per_value() {
        let digits: Vec<String> = "481516".chars().map(String::from).collect();
        assert_eq!(parse_otp(&digits).unwrap().as_str(), "481516");
    }

    #[test]
    fn test_parse_otp_rejects_short_code() {
        assert!(matches!(
            parse_otp(&["4815".to_string()]),
            Err(ClientError::Otp(_))
        ));
    }
}
