//! Versioned record envelope.
//!
//! Records are stored as `{ "version": 1, "savedAt": "...", "data": ... }`.
//! Records without a `version` field predate the envelope and are handed to
//! a caller-supplied migration. Records with a newer version than
//! [`CURRENT_VERSION`] were written by a newer client and are ignored.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StoreError;

/// Envelope version written by this client.
pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a, T> {
    version: u32,
    saved_at: DateTime<Utc>,
    data: &'a T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    data: Value,
}

/// A successfully decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// Written in the current envelope format.
    Current(T),
    /// Migrated from the unversioned legacy shape; should be rewritten.
    Legacy(T),
}

impl<T> Decoded<T> {
    /// The decoded value.
    pub fn into_inner(self) -> T {
        match self {
            Self::Current(value) | Self::Legacy(value) => value,
        }
    }

    /// Whether the record came from the legacy shape.
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

/// Wrap `data` in a current-version envelope.
///
/// # Errors
///
/// Returns an error if `data` cannot be serialized.
pub fn encode<T: Serialize>(data: &T) -> Result<String, StoreError> {
    let envelope = EnvelopeRef {
        version: CURRENT_VERSION,
        saved_at: Utc::now(),
        data,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode a stored record.
///
/// Returns `None` for malformed JSON, unknown future versions, and legacy
/// records `migrate` cannot convert. Each case is logged at `warn`.
pub fn decode<T, F>(key: &str, raw: &str, migrate: F) -> Option<Decoded<T>>
where
    T: DeserializeOwned,
    F: FnOnce(Value) -> Option<T>,
{
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored record is not valid JSON");
            return None;
        }
    };

    let is_enveloped = value.as_object().is_some_and(|o| o.contains_key("version"));
    if !is_enveloped {
        let migrated = migrate(value);
        if migrated.is_none() {
            tracing::warn!(key, "Legacy record could not be migrated");
        }
        return migrated.map(Decoded::Legacy);
    }

    let envelope: Envelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored record has a malformed envelope");
            return None;
        }
    };

    if envelope.version > CURRENT_VERSION {
        tracing::warn!(
            key,
            version = envelope.version,
            supported = CURRENT_VERSION,
            "Stored record was written by a newer client, ignoring"
        );
        return None;
    }
    if envelope.version < CURRENT_VERSION {
        tracing::warn!(key, version = envelope.version, "Unknown record version");
        return None;
    }

    match serde_json::from_value(envelope.data) {
        Ok(data) => {
            tracing::debug!(key, saved_at = ?envelope.saved_at, "Loaded stored record");
            Some(Decoded::Current(data))
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored record data is malformed");
            None
        }
    }
}
