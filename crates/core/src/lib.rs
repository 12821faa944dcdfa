//! Glow & Shine Core - Shared domain types.
//!
//! This crate provides the types shared by every Glow & Shine component:
//! - `client` - Remote API client, session store, and cart synchronizer
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, OTP codes, and the
//!   service-category catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
