//! The signed-in user's session.
//!
//! A session exists from a successful login until logout. It is persisted
//! under [`keys::SESSION`] so that later invocations stay signed in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use glow_core::UserId;

use crate::store::record;
use crate::store::{KeyValueStore, StoreError, keys};

/// Errors raised by [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session is persisted; the user must log in first.
    #[error("not signed in")]
    NotSignedIn,

    /// The session could not be written.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

/// Locally held identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Server-side user id. Never empty for a loaded session.
    pub user_id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address as entered at login.
    #[serde(default)]
    pub email: String,
    /// Phone number, set from the profile screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Profile image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Whether the server reported the account as verified at login.
    #[serde(default)]
    pub is_account_verified: bool,
}

impl Session {
    /// A session with only the identity fields set.
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            email: email.into(),
            phone: None,
            avatar_url: None,
            is_account_verified: false,
        }
    }
}

/// Unversioned session shape written by earlier clients.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacySession {
    user_id: String,
    name: String,
    email: String,
    phone: Option<String>,
    avatar: Option<String>,
    is_account_verified: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn migrate_legacy(value: Value) -> Option<Session> {
    let legacy: LegacySession = serde_json::from_value(value).ok()?;
    Some(Session {
        user_id: UserId::new(legacy.user_id),
        name: legacy.name,
        email: legacy.email,
        phone: non_blank(legacy.phone),
        avatar_url: non_blank(legacy.avatar),
        is_account_verified: legacy.is_account_verified,
    })
}

/// Persisted session access.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a session store over a shared key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the persisted session.
    ///
    /// Returns `None` when nothing is stored, the record is unreadable or from
    /// a newer client, or its user id is empty. Never fails; read problems
    /// are logged.
    pub fn load(&self) -> Option<Session> {
        let raw = match self.store.get(keys::SESSION) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session");
                return None;
            }
        };

        let decoded = record::decode(keys::SESSION, &raw, migrate_legacy)?;
        let is_legacy = decoded.is_legacy();
        let session = decoded.into_inner();

        if session.user_id.is_empty() {
            tracing::warn!("Stored session has an empty user id, treating as signed out");
            return None;
        }

        if is_legacy {
            tracing::info!(user_id = %session.user_id, "Migrating legacy session record");
            if let Err(e) = self.save(&session) {
                tracing::warn!(error = %e, "Failed to rewrite migrated session");
            }
        }

        Some(session)
    }

    /// Replace the persisted session wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let raw = record::encode(session)?;
        self.store.set(keys::SESSION, &raw)?;
        Ok(())
    }

    /// Remove the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(keys::SESSION)?;
        Ok(())
    }

    /// Load the session or fail with [`SessionError::NotSignedIn`].
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` when there is no usable session.
    pub fn require(&self) -> Result<Session, SessionError> {
        self.load().ok_or(SessionError::NotSignedIn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> (Arc<MemoryStore>, SessionStore) {
        let raw = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(raw.clone());
        (raw, sessions)
    }

    fn sample() -> Session {
        Session {
            user_id: UserId::new("694800ad64ee233d55c0ba67"),
            name: "Riya".to_string(),
            email: "riya@example.com".to_string(),
            phone: Some("9876543210".to_string()),
            avatar_url: None,
            is_account_verified: true,
        }
    }

    #[test]
    fn test_save_then_load() {
        let (_, sessions) = store();
        sessions.save(&sample()).unwrap();
        assert_eq!(sessions.load(), Some(sample()));
    }

    #[test]
    fn test_clear_then_load() {
        let (_, sessions) = store();
        sessions.save(&sample()).unwrap();
        sessions.clear().unwrap();
        assert_eq!(sessions.load(), None);
        assert!(matches!(sessions.require(), Err(SessionError::NotSignedIn)));
    }

    #[test]
    fn test_empty_user_id_is_no_session() {
        let (_, sessions) = store();
        let mut session = sample();
        session.user_id = UserId::default();
        sessions.save(&session).unwrap();
        assert_eq!(sessions.load(), None);
    }

    #[test]
    fn test_malformed_record_is_no_session() {
        let (raw, sessions) = store();
        raw.set(keys::SESSION, "{{{").unwrap();
        assert_eq!(sessions.load(), None);
    }

    #[test]
    fn test_legacy_record_is_migrated_and_rewritten() {
        let (raw, sessions) = store();
        raw.set(
            keys::SESSION,
            r#"{"userId":"u1","name":"Riya","email":"riya@example.com","isAccountVerified":false,"phone":"","avatar":"https://cdn/x.png"}"#,
        )
        .unwrap();

        let session = sessions.load().unwrap();
        assert_eq!(session.user_id.as_str(), "u1");
        assert_eq!(session.phone, None);
        assert_eq!(session.avatar_url.as_deref(), Some("https://cdn/x.png"));

        let rewritten: Value = serde_json::from_str(&raw.get(keys::SESSION).unwrap().unwrap()).unwrap();
        assert_eq!(rewritten["version"], record::CURRENT_VERSION);
        assert_eq!(rewritten["data"]["avatarUrl"], "https://cdn/x.png");
    }

    #[test]
    fn test_future_version_is_no_session() {
        let (raw, sessions) = store();
        raw.set(
            keys::SESSION,
            r#"{"version":9,"savedAt":"2031-01-01T00:00:00Z","data":{"userId":"u1"}}"#,
        )
        .unwrap();
        assert_eq!(sessions.load(), None);
    }
}
