//! Command implementations.
//!
//! Each command resolves the signed-in user where needed, calls into
//! `glow_client`, and reports the outcome through `tracing`.

pub mod auth;
pub mod cart;
pub mod profile;
pub mod salons;
