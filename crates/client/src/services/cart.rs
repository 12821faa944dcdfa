//! Cart synchronizer.
//!
//! Keeps a local mirror of the server-side cart. The server is the source of
//! truth: writes are confirmed by the server before the mirror changes, and
//! reads prefer the server, falling back to the last snapshot the server
//! returned for the same user and salon.
//!
//! The mirror holds a single `(user, salon)` cart. Working with another
//! salon's cart replaces it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use glow_core::{SalonId, UserId};

use crate::api::{AddToCartRequest, ApiClient, ApiError, CartItem, CartSnapshot, ServiceDetail};
use crate::store::{KeyValueStore, StoreError, keys, record};

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur when adding a service to a cart.
#[derive(Debug, Error)]
pub enum AddServiceError {
    /// The server refused the service; carries its reason verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The request did not complete.
    #[error("network request failed: {0}")]
    NetworkFailed(#[source] ApiError),

    /// Another add for the same cart is still pending.
    #[error("an add-to-cart request for this salon is already in progress")]
    InFlight,
}

/// Errors that can occur when clearing a cart.
#[derive(Debug, Error)]
pub enum ClearCartError {
    /// The server refused to clear the cart; carries its reason verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The request did not complete.
    #[error("network request failed: {0}")]
    NetworkFailed(#[source] ApiError),
}

impl From<ApiError> for AddServiceError {
    fn from(err: ApiError) -> Self {
        err.into_rejection_reason().map_or_else(Self::NetworkFailed, Self::Rejected)
    }
}

impl From<ApiError> for ClearCartError {
    fn from(err: ApiError) -> Self {
        err.into_rejection_reason().map_or_else(Self::NetworkFailed, Self::Rejected)
    }
}

// =============================================================================
// Remote port
// =============================================================================

/// Remote cart operations the synchronizer depends on.
pub trait CartApi: Send + Sync {
    /// Fetch the server's cart for a user and salon.
    fn get_cart(
        &self,
        user_id: &UserId,
        salon_id: &SalonId,
    ) -> impl Future<Output = Result<CartSnapshot, ApiError>> + Send;

    /// Ask the server to add a service.
    fn add_to_cart(
        &self,
        request: &AddToCartRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Ask the server to empty a cart.
    fn clear_cart(
        &self,
        user_id: &UserId,
        salon_id: &SalonId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl CartApi for ApiClient {
    async fn get_cart(&self, user_id: &UserId, salon_id: &SalonId) -> Result<CartSnapshot, ApiError> {
        Self::get_cart(self, user_id, salon_id).await
    }

    async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<(), ApiError> {
        Self::add_to_cart(self, request).await
    }

    async fn clear_cart(&self, user_id: &UserId, salon_id: &SalonId) -> Result<(), ApiError> {
        Self::clear_cart(self, user_id, salon_id).await
    }
}

// =============================================================================
// Cached state
// =============================================================================

/// Identifies one cart: a user's selection at one salon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartKey {
    pub user_id: UserId,
    pub salon_id: SalonId,
}

impl CartKey {
    #[must_use]
    pub fn new(user_id: &UserId, salon_id: &SalonId) -> Self {
        Self {
            user_id: user_id.clone(),
            salon_id: salon_id.clone(),
        }
    }
}

/// The persisted mirror: a snapshot and the cart it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCart {
    #[serde(flatten)]
    pub key: CartKey,
    pub snapshot: CartSnapshot,
}

/// Convert the unversioned cart record (the raw server response) into a
/// keyed mirror. The owner comes from the record's top-level ids when
/// present, otherwise from its first item; an empty legacy cart is dropped.
fn migrate_legacy(value: Value) -> Option<CachedCart> {
    let top_level = |field: &str| {
        value
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let user_id = top_level("userId");
    let salon_id = top_level("salonId");

    let snapshot: CartSnapshot = serde_json::from_value(value).ok()?;
    let first = snapshot.items.first();

    let key = CartKey {
        user_id: user_id
            .map(UserId::new)
            .or_else(|| first.map(|item| item.user_id.clone()))?,
        salon_id: salon_id
            .map(SalonId::new)
            .or_else(|| first.map(|item| item.salon_id.clone()))?,
    };

    Some(CachedCart { key, snapshot })
}

/// Marks a cart as having an add request outstanding; released on drop.
struct InFlightGuard<'a> {
    pending: &'a Mutex<HashSet<CartKey>>,
    key: CartKey,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(pending: &'a Mutex<HashSet<CartKey>>, key: CartKey) -> Option<Self> {
        lock(pending).insert(key.clone()).then(|| Self { pending, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.key);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// CartSynchronizer
// =============================================================================

/// Reconciles the local cart mirror with the server.
pub struct CartSynchronizer<A = ApiClient> {
    api: A,
    store: Arc<dyn KeyValueStore>,
    memory: Mutex<Option<CachedCart>>,
    pending: Mutex<HashSet<CartKey>>,
}

impl<A: CartApi> CartSynchronizer<A> {
    /// Create a synchronizer over a remote API and the shared local store.
    #[must_use]
    pub fn new(api: A, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            memory: Mutex::new(None),
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Fetch a cart from the server, falling back to the local mirror.
    ///
    /// A successful response replaces the mirror. On any failure the mirror
    /// is returned if it belongs to the same user and salon, otherwise an
    /// empty cart. Never fails.
    #[instrument(skip(self), fields(user_id = %user_id, salon_id = %salon_id))]
    pub async fn fetch_cart(&self, user_id: &UserId, salon_id: &SalonId) -> CartSnapshot {
        match self.api.get_cart(user_id, salon_id).await {
            Ok(snapshot) => {
                self.remember(CartKey::new(user_id, salon_id), snapshot.clone());
                snapshot
            }
            Err(e) => {
                let cached = self.cached(user_id, salon_id);
                tracing::warn!(
                    error = %e,
                    fallback = if cached.is_some() { "cached" } else { "empty" },
                    "Failed to fetch cart, using local copy"
                );
                cached.unwrap_or_default()
            }
        }
    }

    /// Add a service to a cart.
    ///
    /// The mirror changes only after the server accepts the request; the new
    /// item is built from the service metadata the caller already holds.
    ///
    /// # Errors
    ///
    /// - [`AddServiceError::InFlight`] if an add for the same cart is pending;
    ///   the server is not contacted.
    /// - [`AddServiceError::Rejected`] with the server's reason.
    /// - [`AddServiceError::NetworkFailed`] if the request did not complete.
    #[instrument(skip(self, service), fields(user_id = %user_id, salon_id = %salon_id, service_id = %service.id))]
    pub async fn add_service(
        &self,
        user_id: &UserId,
        salon_id: &SalonId,
        service: &ServiceDetail,
    ) -> Result<CartSnapshot, AddServiceError> {
        let key = CartKey::new(user_id, salon_id);
        let _guard =
            InFlightGuard::acquire(&self.pending, key.clone()).ok_or(AddServiceError::InFlight)?;

        let request = AddToCartRequest {
            user_id: user_id.clone(),
            salon_id: salon_id.clone(),
            service_id: service.id.clone(),
        };

        if let Err(e) = self.api.add_to_cart(&request).await {
            let err = AddServiceError::from(e);
            tracing::warn!(error = %err, "Add to cart failed");
            return Err(err);
        }

        let mut snapshot = self.cached(user_id, salon_id).unwrap_or_default();
        snapshot
            .items
            .push(CartItem::from_service(user_id, salon_id, service));
        self.remember(key, snapshot.clone());

        tracing::info!(items = snapshot.len(), "Service added to cart");
        Ok(snapshot)
    }

    /// Empty a cart on the server, then locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request or it does not
    /// complete; the mirror is left untouched.
    #[instrument(skip(self), fields(user_id = %user_id, salon_id = %salon_id))]
    pub async fn clear_cart(&self, user_id: &UserId, salon_id: &SalonId) -> Result<(), ClearCartError> {
        if let Err(e) = self.api.clear_cart(user_id, salon_id).await {
            let err = ClearCartError::from(e);
            tracing::warn!(error = %err, "Clear cart failed");
            return Err(err);
        }

        self.remember(CartKey::new(user_id, salon_id), CartSnapshot::empty());
        Ok(())
    }

    /// The last known snapshot for a cart, without contacting the server.
    pub fn cached(&self, user_id: &UserId, salon_id: &SalonId) -> Option<CartSnapshot> {
        let key = CartKey::new(user_id, salon_id);

        let mut memory = lock(&self.memory);
        if memory.is_none() {
            *memory = self.load_persisted();
        }

        memory
            .as_ref()
            .filter(|cached| cached.key == key)
            .map(|cached| cached.snapshot.clone())
    }

    /// Drop the local mirror, in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be removed.
    pub fn forget(&self) -> Result<(), StoreError> {
        *lock(&self.memory) = None;
        self.store.remove(keys::CART)
    }

    /// Replace the mirror. A failed write is logged; the in-memory copy is
    /// still updated.
    fn remember(&self, key: CartKey, snapshot: CartSnapshot) {
        let cached = CachedCart { key, snapshot };

        match record::encode(&cached).and_then(|raw| self.store.set(keys::CART, &raw)) {
            Ok(()) => tracing::debug!(items = cached.snapshot.len(), "Persisted cart snapshot"),
            Err(e) => tracing::warn!(error = %e, "Failed to persist cart snapshot"),
        }

        *lock(&self.memory) = Some(cached);
    }

    fn load_persisted(&self) -> Option<CachedCart> {
        let raw = match self.store.get(keys::CART) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart snapshot");
                return None;
            }
        };
        record::decode(keys::CART, &raw, migrate_legacy).map(record::Decoded::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use glow_core::{Price, ServiceId};

    use super::*;
    use crate::store::MemoryStore;

    /// Scripted remote: answers from fields, counts calls.
    #[derive(Default)]
    struct FakeApi {
        remote: Mutex<Option<CartSnapshot>>,
        reject_with: Mutex<Option<String>>,
        add_calls: AtomicUsize,
    }

    impl FakeApi {
        fn failure(&self) -> Option<ApiError> {
            lock(&self.reject_with).clone().map(|message| ApiError::Rejected {
                status: 400,
                message: Some(message),
            })
        }
    }

    impl CartApi for FakeApi {
        async fn get_cart(&self, _: &UserId, _: &SalonId) -> Result<CartSnapshot, ApiError> {
            lock(&self.remote)
                .clone()
                .ok_or_else(|| ApiError::NotFound("offline".to_string()))
        }

        async fn add_to_cart(&self, _: &AddToCartRequest) -> Result<(), ApiError> {
            self.add_calls.fetch_add(1, Ordering::SeqCst);
            self.failure().map_or(Ok(()), Err)
        }

        async fn clear_cart(&self, _: &UserId, _: &SalonId) -> Result<(), ApiError> {
            self.failure().map_or(Ok(()), Err)
        }
    }

    /// Remote whose add requests block until released.
    #[derive(Default)]
    struct GatedApi {
        started: Notify,
        release: Notify,
        add_calls: AtomicUsize,
    }

    impl CartApi for GatedApi {
        async fn get_cart(&self, _: &UserId, _: &SalonId) -> Result<CartSnapshot, ApiError> {
            Ok(CartSnapshot::empty())
        }

        async fn add_to_cart(&self, _: &AddToCartRequest) -> Result<(), ApiError> {
            self.add_calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(())
        }

        async fn clear_cart(&self, _: &UserId, _: &SalonId) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn ids() -> (UserId, SalonId) {
        (UserId::new("u1"), SalonId::new("s1"))
    }

    fn service(id: &str, price: i64) -> ServiceDetail {
        ServiceDetail {
            id: ServiceId::new(id),
            name: format!("Service {id}"),
            description: String::new(),
            price: Price::from_rupees(price),
            time: 30,
            image_url: String::new(),
            gender_category: None,
        }
    }

    fn synchronizer<A: CartApi>(api: A) -> (Arc<MemoryStore>, CartSynchronizer<A>) {
        let store = Arc::new(MemoryStore::new());
        let sync = CartSynchronizer::new(api, store.clone());
        (store, sync)
    }

    #[tokio::test]
    async fn test_fetch_persists_server_snapshot() {
        let (user, salon) = ids();
        let api = FakeApi::default();
        let remote = CartSnapshot {
            items: vec![CartItem::from_service(&user, &salon, &service("a", 100))],
        };
        *lock(&api.remote) = Some(remote.clone());
        let (store, sync) = synchronizer(api);

        assert_eq!(sync.fetch_cart(&user, &salon).await, remote);
        assert!(store.get(keys::CART).unwrap().is_some());

        // A fresh synchronizer over the same store sees the persisted copy
        let offline = CartSynchronizer::new(FakeApi::default(), store);
        assert_eq!(offline.fetch_cart(&user, &salon).await, remote);
    }

    #[tokio::test]
    async fn test_fetch_without_cache_is_empty() {
        let (user, salon) = ids();
        let (_, sync) = synchronizer(FakeApi::default());
        assert!(sync.fetch_cart(&user, &salon).await.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_ignores_other_salon() {
        let (user, salon) = ids();
        let api = FakeApi::default();
        *lock(&api.remote) = Some(CartSnapshot {
            items: vec![CartItem::from_service(&user, &salon, &service("a", 100))],
        });
        let (store, sync) = synchronizer(api);
        sync.fetch_cart(&user, &salon).await;

        let offline = CartSynchronizer::new(FakeApi::default(), store);
        let other = SalonId::new("s2");
        assert!(offline.fetch_cart(&user, &other).await.is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_after_acceptance() {
        let (user, salon) = ids();
        let (_, sync) = synchronizer(FakeApi::default());

        sync.add_service(&user, &salon, &service("a", 100)).await.unwrap();
        let cart = sync.add_service(&user, &salon, &service("b", 150)).await.unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_price(), Price::from_rupees(250));
        assert_eq!(cart.last_added().unwrap().service_id.as_str(), "b");
        assert_eq!(sync.cached(&user, &salon), Some(cart));
    }

    #[tokio::test]
    async fn test_rejected_add_leaves_cache_untouched() {
        let (user, salon) = ids();
        let api = FakeApi::default();
        let (store, sync) = synchronizer(api);
        sync.add_service(&user, &salon, &service("a", 100)).await.unwrap();
        let before = store.get(keys::CART).unwrap();

        *lock(&sync.api.reject_with) = Some("Service from this category already added".to_string());
        let err = sync
            .add_service(&user, &salon, &service("b", 100))
            .await
            .unwrap_err();

        assert!(matches!(&err, AddServiceError::Rejected(reason) if reason == "Service from this category already added"));
        assert_eq!(store.get(keys::CART).unwrap(), before);
        assert_eq!(sync.cached(&user, &salon).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_add_while_pending_is_in_flight() {
        let (user, salon) = ids();
        let (_, sync) = synchronizer(GatedApi::default());
        let a = service("a", 100);
        let c = service("c", 100);

        let first = sync.add_service(&user, &salon, &a);
        let second = async {
            sync.api.started.notified().await;
            let result = sync.add_service(&user, &salon, &service("b", 100)).await;
            sync.api.release.notify_one();
            result
        };

        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap().len(), 1);
        assert!(matches!(second, Err(AddServiceError::InFlight)));
        assert_eq!(sync.api.add_calls.load(Ordering::SeqCst), 1);

        // The flag is released once the first request finishes
        let gate = async {
            sync.api.started.notified().await;
            sync.api.release.notify_one();
        };
        let (third, ()) = tokio::join!(sync.add_service(&user, &salon, &c), gate);
        assert_eq!(third.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_success_empties_mirror() {
        let (user, salon) = ids();
        let (_, sync) = synchronizer(FakeApi::default());
        sync.add_service(&user, &salon, &service("a", 100)).await.unwrap();

        sync.clear_cart(&user, &salon).await.unwrap();
        assert_eq!(sync.cached(&user, &salon), Some(CartSnapshot::empty()));
    }

    #[tokio::test]
    async fn test_clear_failure_keeps_mirror() {
        let (user, salon) = ids();
        let (store, sync) = synchronizer(FakeApi::default());
        sync.add_service(&user, &salon, &service("a", 100)).await.unwrap();
        let before = store.get(keys::CART).unwrap();

        *lock(&sync.api.reject_with) = Some("Cart not found".to_string());
        let err = sync.clear_cart(&user, &salon).await.unwrap_err();
        assert!(matches!(err, ClearCartError::Rejected(_)));
        assert_eq!(store.get(keys::CART).unwrap(), before);
    }

    #[tokio::test]
    async fn test_forget_drops_mirror() {
        let (user, salon) = ids();
        let (store, sync) = synchronizer(FakeApi::default());
        sync.add_service(&user, &salon, &service("a", 100)).await.unwrap();

        sync.forget().unwrap();
        assert_eq!(sync.cached(&user, &salon), None);
        assert_eq!(store.get(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_legacy_cart_record_migrates_from_items() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                keys::CART,
                r#"{"items":[{"serviceId":"v1","salonId":"s1","userId":"u1","serviceName":"Fade","price":250,"time":30,"imageUrl":""}]}"#,
            )
            .unwrap();
        let sync = CartSynchronizer::new(FakeApi::default(), store);

        let (user, salon) = ids();
        let cart = sync.cached(&user, &salon).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_price(), Price::from_rupees(250));
    }

    #[test]
    fn test_empty_legacy_cart_without_owner_is_dropped() {
        assert_eq!(migrate_legacy(serde_json::json!({ "items": [] })), None);
        let keyed = migrate_legacy(serde_json::json!({ "userId": "u1", "salonId": "s1", "items": [] }));
        assert!(keyed.unwrap().snapshot.is_empty());
    }

    #[test]
    fn test_api_error_classification() {
        let rejected = AddServiceError::from(ApiError::Rejected {
            status: 409,
            message: Some("nope".to_string()),
        });
        assert!(matches!(rejected, AddServiceError::Rejected(ref m) if m == "nope"));

        let parse = serde_json::from_str::<CartSnapshot>("x").unwrap_err();
        let failed = ClearCartError::from(ApiError::Parse(parse));
        assert!(matches!(failed, ClearCartError::NetworkFailed(_)));
    }
}
