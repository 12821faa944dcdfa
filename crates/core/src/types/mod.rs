//! Core types for Glow & Shine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod otp;
pub mod price;

pub use category::{GenderCategory, GenderFilter, ServiceCategory, UnknownCategory};
pub use email::{Email, EmailError};
pub use id::*;
pub use otp::{OtpCode, OtpError};
pub use price::Price;
