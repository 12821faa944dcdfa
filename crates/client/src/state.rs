//! Application state shared across front-end actions.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::services::{AuthService, CartSynchronizer, ProfileService};
use crate::session::SessionStore;
use crate::store::{FileStore, KeyValueStore};

/// Application state shared by every action.
///
/// This struct is cheaply cloneable via `Arc` and owns the single API client,
/// the persisted store, and the cart mirror. Nothing is reachable globally;
/// front ends pass this around explicitly.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api: ApiClient,
    sessions: SessionStore,
    cart: CartSynchronizer,
}

impl AppState {
    /// Create application state backed by files in `config.state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let store = FileStore::open(&config.state_dir)?;
        Ok(Self::with_store(config, Arc::new(store))?)
    }

    /// Create application state over an existing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_store(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let sessions = SessionStore::new(Arc::clone(&store));
        let cart = CartSynchronizer::new(api.clone(), store);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                api,
                sessions,
                cart,
            }),
        })
    }

    /// Get a reference to the remote API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Get a reference to the cart synchronizer.
    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    /// Authentication flows bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.api, &self.inner.sessions)
    }

    /// Profile operations bound to this state.
    #[must_use]
    pub fn profile(&self) -> ProfileService<'_> {
        ProfileService::new(&self.inner.api, &self.inner.sessions)
    }

    /// Sign out: remove the session and the cart mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if either record cannot be removed. The cart mirror is
    /// still dropped if removing the session fails.
    pub fn logout(&self) -> Result<(), ClientError> {
        let session = self.inner.sessions.clear();
        let cart = self.inner.cart.forget();
        session?;
        cart?;
        tracing::info!("User logged out");
        Ok(())
    }
}
