//! Persisted key-value store for client-side state.
//!
//! The store holds small JSON records under fixed keys (see [`keys`]). Every
//! record is wrapped in a versioned envelope by [`record`]; the store itself
//! only moves strings.
//!
//! # Implementations
//!
//! - [`FileStore`] - one file per key under a state directory
//! - [`MemoryStore`] - process-local map, used by tests and ephemeral runs

mod file;
mod memory;
pub mod record;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Keys of the persisted records.
pub mod keys {
    /// The signed-in user's session.
    pub const SESSION: &str = "user";

    /// The last known cart snapshot.
    pub const CART: &str = "cartData";
}

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key cannot be used as a storage name.
    #[error("invalid store key: {0}")]
    InvalidKey(String),
}

/// Port for raw persisted records.
///
/// Writes replace the whole value for a key. Implementations must make each
/// write atomic per key; there is no cross-key transaction.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read. A missing key is
    /// `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete the value stored under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be updated.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Check that a key is usable as a file name on every platform.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}
