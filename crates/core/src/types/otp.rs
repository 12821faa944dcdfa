//! One-time passcodes for email verification and password reset.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building an [`OtpCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// The code does not have exactly [`OtpCode::LENGTH`] digits.
    #[error("OTP must be exactly {expected} digits (got {actual})")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
        /// Number of digits supplied.
        actual: usize,
    },
    /// A position holds something other than a single ASCII digit.
    #[error("OTP position {position} is not a digit")]
    NotADigit {
        /// Zero-based position of the offending input.
        position: usize,
    },
}

/// A six-digit one-time passcode.
///
/// The verification screens collect the code one digit per input box; the
/// code sent to the server is those boxes concatenated in order.
///
/// ```
/// use glow_core::OtpCode;
///
/// let otp = OtpCode::from_digits(["4", "8", "1", "5", "1", "6"]).unwrap();
/// assert_eq!(otp.as_str(), "481516");
///
/// assert!(OtpCode::parse("48151").is_err());
/// assert!(OtpCode::parse("48151x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Number of digits in a passcode.
    pub const LENGTH: usize = 6;

    /// Parse a code typed as one string.
    ///
    /// # Errors
    ///
    /// Returns an error unless the trimmed input is exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, OtpError> {
        let s = s.trim();
        let actual = s.chars().count();
        if actual != Self::LENGTH {
            return Err(OtpError::WrongLength {
                expected: Self::LENGTH,
                actual,
            });
        }
        if let Some(position) = s.chars().position(|c| !c.is_ascii_digit()) {
            return Err(OtpError::NotADigit { position });
        }
        Ok(Self(s.to_owned()))
    }

    /// Assemble a code from per-box inputs.
    ///
    /// Each input must be a single digit; an empty box counts as missing.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::WrongLength`] if the number of boxes is wrong or a
    /// box is empty, and [`OtpError::NotADigit`] for a non-digit box.
    pub fn from_digits<I, S>(boxes: I) -> Result<Self, OtpError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut code = String::with_capacity(Self::LENGTH);
        for (position, input) in boxes.into_iter().enumerate() {
            let input = input.as_ref();
            match input.len() {
                0 => {}
                1 if input.as_bytes().iter().all(u8::is_ascii_digit) => code.push_str(input),
                _ => return Err(OtpError::NotADigit { position }),
            }
        }
        Self::parse(&code)
    }

    /// The code as sent to the server.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OtpCode {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
