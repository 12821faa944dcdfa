//! Integration tests for the cart synchronizer against the mock API.

use std::path::Path;
use std::sync::Arc;

use glow_client::AppState;
use glow_client::api::ServiceDetail;
use glow_client::config::{ApiConfig, ClientConfig};
use glow_client::services::{AddServiceError, ClearCartError};
use glow_client::store::{KeyValueStore, MemoryStore, keys};
use glow_core::{SalonId, UserId};
use glow_integration_tests::{
    FACIAL_SERVICE, GLAM_SALON, HAIRCUT_SERVICE, KIDS_HAIRCUT_SERVICE, MockApi,
    SAME_CATEGORY_MESSAGE, STYLE_SALON, UNREACHABLE_BASE_URL,
};

struct Fixture {
    mock: MockApi,
    store: Arc<MemoryStore>,
    state: AppState,
    user: UserId,
    salon: SalonId,
}

async fn setup() -> Fixture {
    let mock = MockApi::start().await.expect("Failed to start mock API");
    let config = mock.client_config(Path::new(".unused"));
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(&config, store.clone()).expect("Failed to build state");
    let user = UserId::new(mock.seed_user("Riya", "riya@example.com", "secret"));
    Fixture {
        mock,
        store,
        state,
        user,
        salon: SalonId::new(GLAM_SALON),
    }
}

/// State over `store` whose API calls cannot reach any server.
fn offline_state(store: Arc<MemoryStore>) -> AppState {
    let config = ClientConfig {
        api: ApiConfig::with_base_url(UNREACHABLE_BASE_URL).expect("Invalid base URL"),
        state_dir: ".unused".into(),
        sentry_dsn: None,
        sentry_environment: None,
    };
    AppState::with_store(&config, store).expect("Failed to build state")
}

async fn service(state: &AppState, id: &str) -> ServiceDetail {
    state
        .api()
        .get_salon(&SalonId::new(GLAM_SALON))
        .await
        .expect("Failed to get salon")
        .services
        .into_iter()
        .find(|s| s.id.as_str() == id)
        .expect("Service missing from menu")
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_updates_server_and_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;

    let cart = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");

    assert_eq!(cart.len(), 1);
    assert_eq!(
        cart.last_added().map(|i| i.service_name.as_str()),
        Some("Classic Haircut")
    );
    assert_eq!(
        f.mock.cart_service_ids(f.user.as_str(), GLAM_SALON),
        [HAIRCUT_SERVICE]
    );
    assert_eq!(f.state.cart().cached(&f.user, &f.salon), Some(cart));
}

#[tokio::test]
async fn test_same_category_rejection_is_verbatim_and_keeps_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let kids = service(&f.state, KIDS_HAIRCUT_SERVICE).await;

    let before = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("First add failed");
    let persisted = f.store.get(keys::CART).expect("Store read failed");

    let err = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &kids)
        .await
        .expect_err("Second haircut should be rejected");

    assert!(matches!(err, AddServiceError::Rejected(ref reason) if reason == SAME_CATEGORY_MESSAGE));
    assert_eq!(f.state.cart().cached(&f.user, &f.salon), Some(before));
    assert_eq!(f.store.get(keys::CART).expect("Store read failed"), persisted);
}

#[tokio::test]
async fn test_configured_rejection_reason() {
    let f = setup().await;
    let facial = service(&f.state, FACIAL_SERVICE).await;
    f.mock.reject_adds_with(Some("Salon is closed today"));

    let err = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &facial)
        .await
        .expect_err("Add should be rejected");

    assert!(matches!(err, AddServiceError::Rejected(ref reason) if reason == "Salon is closed today"));
    assert_eq!(f.state.cart().cached(&f.user, &f.salon), None);
}

#[tokio::test]
async fn test_concurrent_add_is_refused_without_server_call() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let facial = service(&f.state, FACIAL_SERVICE).await;

    let (first, second) = tokio::join!(
        f.state.cart().add_service(&f.user, &f.salon, &haircut),
        f.state.cart().add_service(&f.user, &f.salon, &facial),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(AddServiceError::InFlight)));
    assert_eq!(f.mock.cart_add_calls(), 1);

    // The guard is released once the first request completes
    f.state
        .cart()
        .add_service(&f.user, &f.salon, &facial)
        .await
        .expect("Add after completion failed");
    assert_eq!(f.mock.cart_add_calls(), 2);
}

#[tokio::test]
async fn test_add_network_failure() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;

    let err = offline_state(Arc::new(MemoryStore::new()))
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect_err("Add should fail");
    assert!(matches!(err, AddServiceError::NetworkFailed(_)));
}

#[tokio::test]
async fn test_network_failed_add_keeps_persisted_bytes() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let facial = service(&f.state, FACIAL_SERVICE).await;
    let added = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");
    let persisted = f.store.get(keys::CART).expect("Store read failed");
    let offline = offline_state(f.store.clone());

    let err = offline
        .cart()
        .add_service(&f.user, &f.salon, &facial)
        .await
        .expect_err("Add should fail without a server");

    assert!(matches!(err, AddServiceError::NetworkFailed(_)));
    assert_eq!(f.store.get(keys::CART).expect("Store read failed"), persisted);

    // An unreachable server on fetch serves the same mirror
    let fetched = offline.cart().fetch_cart(&f.user, &f.salon).await;
    assert_eq!(fetched, added);
    assert_eq!(f.store.get(keys::CART).expect("Store read failed"), persisted);
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_replaces_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let facial = service(&f.state, FACIAL_SERVICE).await;
    f.state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");
    f.state
        .cart()
        .add_service(&f.user, &f.salon, &facial)
        .await
        .expect("Add failed");

    let cart = f.state.cart().fetch_cart(&f.user, &f.salon).await;

    assert_eq!(cart.len(), 2);
    assert_eq!(cart.total_minutes(), 90);
    assert_eq!(cart.total_price().to_string(), "₹1500");
    assert_eq!(f.state.cart().cached(&f.user, &f.salon), Some(cart));
}

#[tokio::test]
async fn test_fetch_failure_falls_back_to_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let added = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");

    f.mock.fail_cart_reads(true);
    let cart = f.state.cart().fetch_cart(&f.user, &f.salon).await;

    assert_eq!(cart, added);
    assert_eq!(f.mock.cart_read_calls(), 1);
}

#[tokio::test]
async fn test_unparseable_cart_body_falls_back_to_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let added = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");

    f.mock.garble_cart_reads(true);
    let cart = f.state.cart().fetch_cart(&f.user, &f.salon).await;

    assert_eq!(cart, added);
    assert_eq!(f.mock.cart_read_calls(), 1);
}

#[tokio::test]
async fn test_fetch_failure_for_other_salon_is_empty() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    f.state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");

    f.mock.fail_cart_reads(true);
    let cart = f
        .state
        .cart()
        .fetch_cart(&f.user, &SalonId::new(STYLE_SALON))
        .await;

    assert!(cart.is_empty());
}

// ============================================================================
// Clear
// ============================================================================

#[tokio::test]
async fn test_clear_empties_server_and_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    f.state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");

    f.state
        .cart()
        .clear_cart(&f.user, &f.salon)
        .await
        .expect("Clear failed");

    assert!(f.mock.cart_service_ids(f.user.as_str(), GLAM_SALON).is_empty());
    assert_eq!(
        f.state.cart().cached(&f.user, &f.salon).map(|c| c.len()),
        Some(0)
    );
    assert_eq!(f.mock.cart_clear_calls(), 1);
}

#[tokio::test]
async fn test_clear_network_failure_keeps_mirror() {
    let f = setup().await;
    let haircut = service(&f.state, HAIRCUT_SERVICE).await;
    let added = f
        .state
        .cart()
        .add_service(&f.user, &f.salon, &haircut)
        .await
        .expect("Add failed");
    let offline = offline_state(f.store.clone());

    let err = offline
        .cart()
        .clear_cart(&f.user, &f.salon)
        .await
        .expect_err("Clear should fail without a server");

    assert!(matches!(err, ClearCartError::NetworkFailed(_)));
    assert_eq!(offline.cart().cached(&f.user, &f.salon), Some(added));
    assert_eq!(f.mock.cart_clear_calls(), 0);
}
