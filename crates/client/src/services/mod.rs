//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, OTP verification, login, and password reset
//! - `cart` - Cart synchronization between the server and the local mirror
//! - `profile` - Profile edits and avatar upload/refresh

pub mod auth;
pub mod cart;
pub mod profile;

pub use auth::{AuthError, AuthService, RegisterForm};
pub use cart::{AddServiceError, CartApi, CartSynchronizer, ClearCartError};
pub use profile::{ProfileError, ProfileService, ProfileUpdate};
