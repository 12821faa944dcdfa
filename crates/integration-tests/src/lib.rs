//! Integration test support for the Glow & Shine client.
//!
//! Starts an in-process mock of the remote salon API on `127.0.0.1` with an
//! OS-assigned port. Tests point a real [`glow_client::AppState`] at it, so
//! requests go through the actual HTTP client, cache, and stores.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p glow-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Salon list, detail, services, and filtering
//! - `cart` - Cart synchronizer against the server
//! - `session` - Session and cart persistence on disk
//! - `auth` - Registration, login, and password reset flows
//! - `profile` - Profile edits and avatar upload

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use glow_client::config::{ApiConfig, ClientConfig};
use glow_core::ServiceCategory;

/// Salon with a two-service menu.
pub const GLAM_SALON: &str = "694ce6be84ba8f65cd267400";
/// Salon with an empty menu.
pub const STYLE_SALON: &str = "694ce6be84ba8f65cd267401";
/// Male haircut at [`GLAM_SALON`].
pub const HAIRCUT_SERVICE: &str = "694ce6be84ba8f65cd267411";
/// Second haircut at [`GLAM_SALON`], same category as [`HAIRCUT_SERVICE`].
pub const KIDS_HAIRCUT_SERVICE: &str = "694ce6be84ba8f65cd267412";
/// Female facial at [`GLAM_SALON`].
pub const FACIAL_SERVICE: &str = "694ce6be84ba8f65cd267413";
/// The only OTP the mock accepts.
pub const MOCK_OTP: &str = "481516";
/// Base URL nothing listens on.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9/api";

/// Reason the mock gives when a second service from one category is added.
pub const SAME_CATEGORY_MESSAGE: &str = "Service from this category already added";

/// A profile image upload the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub user_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
struct MockUser {
    user_id: String,
    name: String,
    password: String,
    verified: bool,
    reset_verified: bool,
}

#[derive(Default)]
struct Counters {
    salon_list: AtomicUsize,
    salon_detail: AtomicUsize,
    cart_reads: AtomicUsize,
    cart_adds: AtomicUsize,
    cart_clears: AtomicUsize,
}

#[derive(Default)]
struct MockState {
    salons: Vec<Value>,
    details: HashMap<String, Value>,
    carts: Mutex<HashMap<(String, String), Vec<Value>>>,
    users: Mutex<HashMap<String, MockUser>>,
    images: Mutex<HashMap<String, String>>,
    uploads: Mutex<Vec<Upload>>,
    add_rejection: Mutex<Option<String>>,
    upload_rejection: Mutex<Option<String>>,
    fail_cart_reads: AtomicBool,
    garble_cart_reads: AtomicBool,
    counters: Counters,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn text<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn category_id(name: &str) -> &'static str {
    ServiceCategory::by_name(name).map_or("", |c| c.id)
}

/// In-process mock of the remote salon API.
///
/// The server task is aborted when this is dropped.
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(seed());

        let app = Router::new()
            .route("/api/salon/get-all-salon", get(all_salons))
            .route("/api/salon/get-salon/{salon_id}", get(salon_detail))
            .route("/api/service/get-services", get(services))
            .route("/api/cart/get", get(cart_get))
            .route("/api/cart/add", post(cart_add))
            .route("/api/cart/clear", delete(cart_clear))
            .route("/api/register", post(register))
            .route("/api/verify-otp", post(verify_otp))
            .route("/api/login", post(login))
            .route("/api/forgot-password", post(forgot_password))
            .route("/api/verify-reset-otp", post(verify_reset_otp))
            .route("/api/new-password", post(new_password))
            .route("/api/v1.0/get-profile-image/{user_id}", get(profile_image))
            .route("/api/v1.0/add-profile-image", post(upload_profile_image))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock API server stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the mock API, ending in `/api`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// API configuration pointing at the mock.
    ///
    /// # Panics
    ///
    /// Panics if the mock URL is rejected by the config parser.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::with_base_url(&self.base_url()).expect("mock base URL is a valid http URL")
    }

    /// Client configuration pointing at the mock, persisting under `state_dir`.
    #[must_use]
    pub fn client_config(&self, state_dir: &Path) -> ClientConfig {
        ClientConfig {
            api: self.api_config(),
            state_dir: state_dir.to_path_buf(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Reject every add-to-cart request with `reason`, or stop rejecting.
    pub fn reject_adds_with(&self, reason: Option<&str>) {
        *lock(&self.state.add_rejection) = reason.map(ToOwned::to_owned);
    }

    /// Reject every profile image upload with `reason`, or stop rejecting.
    pub fn reject_uploads_with(&self, reason: Option<&str>) {
        *lock(&self.state.upload_rejection) = reason.map(ToOwned::to_owned);
    }

    /// Make cart reads fail with a 500.
    pub fn fail_cart_reads(&self, fail: bool) {
        self.state.fail_cart_reads.store(fail, Ordering::SeqCst);
    }

    /// Make cart reads answer 200 with a body that is not JSON.
    pub fn garble_cart_reads(&self, garble: bool) {
        self.state.garble_cart_reads.store(garble, Ordering::SeqCst);
    }

    /// Create a verified account directly. Returns its user id.
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> String {
        let user_id = format!("user-{}", lock(&self.state.users).len() + 1);
        lock(&self.state.users).insert(
            email.to_owned(),
            MockUser {
                user_id: user_id.clone(),
                name: name.to_owned(),
                password: password.to_owned(),
                verified: true,
                reset_verified: false,
            },
        );
        user_id
    }

    /// Whether an account exists and has been verified.
    #[must_use]
    pub fn is_verified(&self, email: &str) -> Option<bool> {
        lock(&self.state.users).get(email).map(|u| u.verified)
    }

    /// Set the stored profile image URL for a user.
    pub fn set_profile_image(&self, user_id: &str, url: &str) {
        lock(&self.state.images).insert(user_id.to_owned(), url.to_owned());
    }

    /// Service ids in a cart on the server, oldest first.
    #[must_use]
    pub fn cart_service_ids(&self, user_id: &str, salon_id: &str) -> Vec<String> {
        lock(&self.state.carts)
            .get(&(user_id.to_owned(), salon_id.to_owned()))
            .map(|items| {
                items
                    .iter()
                    .map(|item| text(item, "serviceId").to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Profile image uploads received so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<Upload> {
        lock(&self.state.uploads).clone()
    }

    /// Number of salon list requests served.
    #[must_use]
    pub fn salon_list_calls(&self) -> usize {
        self.state.counters.salon_list.load(Ordering::SeqCst)
    }

    /// Number of salon detail requests served.
    #[must_use]
    pub fn salon_detail_calls(&self) -> usize {
        self.state.counters.salon_detail.load(Ordering::SeqCst)
    }

    /// Number of cart reads served.
    #[must_use]
    pub fn cart_read_calls(&self) -> usize {
        self.state.counters.cart_reads.load(Ordering::SeqCst)
    }

    /// Number of add-to-cart requests received.
    #[must_use]
    pub fn cart_add_calls(&self) -> usize {
        self.state.counters.cart_adds.load(Ordering::SeqCst)
    }

    /// Number of clear-cart requests received.
    #[must_use]
    pub fn cart_clear_calls(&self) -> usize {
        self.state.counters.cart_clears.load(Ordering::SeqCst)
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn service(id: &str, name: &str, category: &str, price: u32, time: u32, gender: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "description": format!("{name} by senior stylists"),
        "price": price,
        "time": time,
        "imageUrl": format!("https://cdn.example.com/services/{id}.jpg"),
        "genderCategory": gender,
        "categoryId": category_id(category),
    })
}

fn seed() -> MockState {
    let salons = vec![
        json!({
            "_id": GLAM_SALON,
            "name": "Glam Studio",
            "city": "Surat",
            "address": "Ring Road",
            "contact": "9876543210",
            "imageUrl": "https://cdn.example.com/salons/glam.jpg",
            "services": ["Haircut", "Facial"],
        }),
        json!({
            "_id": STYLE_SALON,
            "name": "Style Lounge",
            "city": "Rajkot",
            "imageUrl": "https://cdn.example.com/salons/style.jpg",
            "services": ["Massage"],
        }),
    ];

    let mut details = HashMap::new();
    let mut glam = salons.first().cloned().unwrap_or_default();
    glam["services"] = json!([
        service(HAIRCUT_SERVICE, "Classic Haircut", "Haircut", 300, 30, "Male"),
        service(KIDS_HAIRCUT_SERVICE, "Kids Haircut", "Haircut", 200, 20, "Kid"),
        service(FACIAL_SERVICE, "Gold Facial", "Facial", 1200, 60, "female"),
    ]);
    details.insert(GLAM_SALON.to_owned(), glam);
    let mut style = salons.get(1).cloned().unwrap_or_default();
    // This deployment sends the menu as `null` for salons without services
    style["services"] = Value::Null;
    details.insert(STYLE_SALON.to_owned(), style);

    MockState {
        salons,
        details,
        ..MockState::default()
    }
}

// =============================================================================
// Catalog Handlers
// =============================================================================

async fn all_salons(State(state): State<Arc<MockState>>) -> Json<Vec<Value>> {
    state.counters.salon_list.fetch_add(1, Ordering::SeqCst);
    Json(state.salons.clone())
}

async fn salon_detail(
    State(state): State<Arc<MockState>>,
    UrlPath(salon_id): UrlPath<String>,
) -> Response {
    state.counters.salon_detail.fetch_add(1, Ordering::SeqCst);
    match state.details.get(&salon_id) {
        Some(salon) => Json(salon.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, "Salon not found"),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicesQuery {
    salon_id: String,
    category_id: String,
}

async fn services(
    State(state): State<Arc<MockState>>,
    Query(query): Query<ServicesQuery>,
) -> Json<Value> {
    let menu = state
        .details
        .get(&query.salon_id)
        .and_then(|salon| salon.get("services"))
        .and_then(Value::as_array);

    match menu {
        Some(menu) => Json(Value::Array(
            menu.iter()
                .filter(|s| text(s, "categoryId") == query.category_id)
                .cloned()
                .collect(),
        )),
        // The live API answers an unknown salon with a message object
        None => Json(json!({ "message": "No services found" })),
    }
}

// =============================================================================
// Cart Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartQuery {
    user_id: String,
    salon_id: String,
}

async fn cart_get(State(state): State<Arc<MockState>>, Query(query): Query<CartQuery>) -> Response {
    state.counters.cart_reads.fetch_add(1, Ordering::SeqCst);
    if state.fail_cart_reads.load(Ordering::SeqCst) {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }
    if state.garble_cart_reads.load(Ordering::SeqCst) {
        return (StatusCode::OK, "<html>Service temporarily unavailable</html>").into_response();
    }

    let items = lock(&state.carts)
        .get(&(query.user_id, query.salon_id))
        .cloned()
        .unwrap_or_default();
    Json(json!({ "items": items })).into_response()
}

async fn cart_add(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.counters.cart_adds.fetch_add(1, Ordering::SeqCst);
    if let Some(reason) = lock(&state.add_rejection).clone() {
        return message(StatusCode::BAD_REQUEST, &reason);
    }

    let (user_id, salon_id, service_id) = (
        text(&body, "userId"),
        text(&body, "salonId"),
        text(&body, "serviceId"),
    );
    let service = state
        .details
        .get(salon_id)
        .and_then(|salon| salon.get("services"))
        .and_then(Value::as_array)
        .and_then(|menu| menu.iter().find(|s| text(s, "_id") == service_id));
    let Some(service) = service else {
        return message(StatusCode::NOT_FOUND, "Service not found");
    };

    let mut carts = lock(&state.carts);
    let items = carts
        .entry((user_id.to_owned(), salon_id.to_owned()))
        .or_default();
    let category = text(service, "categoryId");
    if items.iter().any(|item| text(item, "categoryId") == category) {
        return message(StatusCode::BAD_REQUEST, SAME_CATEGORY_MESSAGE);
    }

    items.push(json!({
        "serviceId": service_id,
        "salonId": salon_id,
        "userId": user_id,
        "serviceName": service["name"],
        "price": service["price"],
        "time": service["time"],
        "imageUrl": service["imageUrl"],
        "categoryId": category,
    }));
    message(StatusCode::OK, "Service added to cart")
}

async fn cart_clear(State(state): State<Arc<MockState>>, Query(query): Query<CartQuery>) -> Response {
    state.counters.cart_clears.fetch_add(1, Ordering::SeqCst);
    lock(&state.carts).remove(&(query.user_id, query.salon_id));
    message(StatusCode::OK, "Cart cleared")
}

// =============================================================================
// Auth Handlers
// =============================================================================

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = text(&body, "email");
    let mut users = lock(&state.users);
    if users.contains_key(email) {
        return message(StatusCode::BAD_REQUEST, "User already exists");
    }

    users.insert(
        email.to_owned(),
        MockUser {
            user_id: text(&body, "id").to_owned(),
            name: text(&body, "name").to_owned(),
            password: text(&body, "password").to_owned(),
            verified: false,
            reset_verified: false,
        },
    );
    message(StatusCode::CREATED, "OTP sent to your email")
}

async fn verify_otp(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let mut users = lock(&state.users);
    let Some(user) = users.get_mut(text(&body, "email")) else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    if text(&body, "otp") != MOCK_OTP {
        return message(StatusCode::BAD_REQUEST, "Invalid OTP");
    }
    user.verified = true;
    message(StatusCode::OK, "Account verified")
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = text(&body, "email");
    let users = lock(&state.users);
    match users.get(email) {
        Some(user) if user.password == text(&body, "password") => Json(json!({
            "userId": user.user_id,
            "name": user.name,
            "email": email,
            "isAccountVerified": user.verified,
        }))
        .into_response(),
        _ => message(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn forgot_password(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if lock(&state.users).contains_key(text(&body, "email")) {
        message(StatusCode::OK, "OTP sent to your email")
    } else {
        message(StatusCode::NOT_FOUND, "User not found")
    }
}

async fn verify_reset_otp(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let mut users = lock(&state.users);
    let Some(user) = users.get_mut(text(&body, "email")) else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    if text(&body, "otp") != MOCK_OTP {
        return message(StatusCode::BAD_REQUEST, "Invalid OTP");
    }
    user.reset_verified = true;
    message(StatusCode::OK, "OTP verified")
}

async fn new_password(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let mut users = lock(&state.users);
    let Some(user) = users.get_mut(text(&body, "email")) else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    if !user.reset_verified {
        // Bare string body, as some deployments send
        return (StatusCode::FORBIDDEN, Json(json!("OTP not verified"))).into_response();
    }
    text(&body, "password").clone_into(&mut user.password);
    user.reset_verified = false;
    message(StatusCode::OK, "Password updated")
}

// =============================================================================
// Profile Image Handlers
// =============================================================================

async fn profile_image(
    State(state): State<Arc<MockState>>,
    UrlPath(user_id): UrlPath<String>,
) -> Response {
    match lock(&state.images).get(&user_id) {
        Some(url) => Json(json!({ "imageUrl": url })).into_response(),
        None => message(StatusCode::NOT_FOUND, "No profile image"),
    }
}

async fn upload_profile_image(
    State(state): State<Arc<MockState>>,
    mut multipart: Multipart,
) -> Response {
    let mut user_id = String::new();
    let mut upload = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("userId") => user_id = field.text().await.unwrap_or_default(),
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let size = field.bytes().await.map_or(0, |b| b.len());
                upload = Some((file_name, content_type, size));
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, size)) = upload else {
        return message(StatusCode::BAD_REQUEST, "No image uploaded");
    };
    if user_id.is_empty() {
        return message(StatusCode::BAD_REQUEST, "userId is required");
    }
    if let Some(reason) = lock(&state.upload_rejection).clone() {
        return message(StatusCode::UNPROCESSABLE_ENTITY, &reason);
    }

    let url = format!("https://cdn.example.com/avatars/{user_id}/{file_name}");
    lock(&state.images).insert(user_id.clone(), url.clone());
    lock(&state.uploads).push(Upload {
        user_id,
        file_name,
        content_type,
        size,
    });
    Json(json!({ "imageUrl": url })).into_response()
}
