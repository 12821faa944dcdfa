//! Glow & Shine client library.
//!
//! Everything the salon-booking front end needs besides rendering: the remote
//! API client, the persisted session and cart mirror, the auth and profile
//! flows, and salon/service filtering.
//!
//! # Modules
//!
//! - [`api`] - HTTP client for the remote salon API
//! - [`store`] - Persisted key-value store with versioned records
//! - [`session`] - The signed-in user's session
//! - [`services`] - Auth, cart, and profile services
//! - [`search`] - Salon and service filters
//! - [`state`] - Shared application state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod search;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use error::ClientError;
pub use state::AppState;
