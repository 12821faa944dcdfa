//! Remote salon API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The remote API is source of truth for salons, services, carts, and
//!   profile images
//! - In-memory caching via `moka` for the salon catalogue only (list and
//!   detail); carts, services, and profile images are always fetched live
//!
//! # Error model
//!
//! Every call distinguishes a transport failure ([`ApiError::Http`]) from a
//! server-side business rejection ([`ApiError::Rejected`]), which carries the
//! server's human-readable reason.
//!
//! # Example
//!
//! ```rust,ignore
//! use glow_client::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let salons = client.get_all_salons().await?;
//! let detail = client.get_salon(&salons[0].salon_id).await?;
//! ```

mod auth;
mod cache;
pub mod types;

pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use glow_core::{CategoryId, SalonId, UserId};

use crate::config::ApiConfig;
use cache::CacheValue;

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Rejected ({status}): {}", .message.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Human-readable reason authored by the server, if the body had one.
        message: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ApiError {
    /// Whether this is a transport-level failure (no usable response).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Split off a server-side refusal: the server's reason (or a generic
    /// line naming the status) for rejections, the error itself otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the server did not refuse the request.
    pub fn into_rejection_reason(self) -> Result<String, Self> {
        match self {
            Self::Rejected { status, message } => {
                Ok(message.unwrap_or_else(|| format!("Request failed with status {status}")))
            }
            Self::NotFound(message) => Ok(message),
            other => Err(other),
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the remote salon API.
///
/// Cheap to clone; clones share the HTTP connection pool and the catalogue
/// cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Option<Cache<String, CacheValue>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let cache = (!config.catalog_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(500)
                .time_to_live(config.catalog_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// The base URL endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Drop every cached salon list/detail response.
    pub fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
        }
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Resolve a relative endpoint path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Url(e.to_string()))
    }

    /// Resolve an endpoint path and append one percent-encoded path segment.
    fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(format!("cannot append segment to {path}")))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    ///
    /// Non-success statuses become [`ApiError::Rejected`] with the server's
    /// reason extracted from the body.
    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Remote API returned non-success status"
            );
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }

        Ok(body)
    }

    /// GET a URL and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let body = self.send(self.inner.client.get(url)).await?;
        parse_body(&body)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    async fn cached(&self, key: &str) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: String, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    // =========================================================================
    // Salon Methods
    // =========================================================================

    /// List every salon.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a salon list.
    #[instrument(skip(self))]
    pub async fn get_all_salons(&self) -> Result<Vec<SalonSummary>, ApiError> {
        if let Some(CacheValue::Salons(salons)) = self.cached(cache::SALONS_KEY).await {
            debug!("Cache hit for salon list");
            return Ok(salons);
        }

        let salons: Vec<SalonSummary> = self.get_json(self.endpoint("salon/get-all-salon")?).await?;

        self.store(cache::SALONS_KEY.to_string(), CacheValue::Salons(salons.clone()))
            .await;

        Ok(salons)
    }

    /// Get one salon with its full service menu.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id, or another error if
    /// the request fails.
    #[instrument(skip(self), fields(salon_id = %salon_id))]
    pub async fn get_salon(&self, salon_id: &SalonId) -> Result<SalonDetail, ApiError> {
        let cache_key = cache::salon_key(salon_id.as_str());

        if let Some(CacheValue::Salon(salon)) = self.cached(&cache_key).await {
            debug!("Cache hit for salon");
            return Ok(*salon);
        }

        let url = self.endpoint_with_segment("salon/get-salon", salon_id.as_str())?;
        let body = match self.send(self.inner.client.get(url)).await {
            Ok(body) => body,
            Err(ApiError::Rejected { status: 404, .. }) => {
                return Err(ApiError::NotFound(format!("Salon not found: {salon_id}")));
            }
            Err(e) => return Err(e),
        };

        // Some deployments answer an unknown id with 200 and a `null` body
        let salon: Option<SalonDetail> = parse_body(&body)?;
        let salon = salon.ok_or_else(|| ApiError::NotFound(format!("Salon not found: {salon_id}")))?;

        self.store(cache_key, CacheValue::Salon(Box::new(salon.clone())))
            .await;

        Ok(salon)
    }

    /// List a salon's services in one category.
    ///
    /// A response body that is not a JSON array is treated as an empty menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the array is malformed.
    #[instrument(skip(self), fields(salon_id = %salon_id, category_id = %category_id))]
    pub async fn get_services(
        &self,
        salon_id: &SalonId,
        category_id: &CategoryId,
    ) -> Result<Vec<ServiceDetail>, ApiError> {
        let mut url = self.endpoint("service/get-services")?;
        url.query_pairs_mut()
            .append_pair("salonId", salon_id.as_str())
            .append_pair("categoryId", category_id.as_str());

        let value: serde_json::Value = self.get_json(url).await?;
        if !value.is_array() {
            debug!("Service list response is not an array, treating as empty");
            return Ok(Vec::new());
        }

        Ok(serde_json::from_value(value)?)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get a user's cart for one salon.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a cart.
    #[instrument(skip(self), fields(user_id = %user_id, salon_id = %salon_id))]
    pub async fn get_cart(
        &self,
        user_id: &UserId,
        salon_id: &SalonId,
    ) -> Result<CartSnapshot, ApiError> {
        let mut url = self.endpoint("cart/get")?;
        url.query_pairs_mut()
            .append_pair("userId", user_id.as_str())
            .append_pair("salonId", salon_id.as_str());

        self.get_json(url).await
    }

    /// Add a service to a user's cart for one salon.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the server's reason when the
    /// service cannot be added (e.g. a service from the same category is
    /// already in the cart).
    #[instrument(skip(self), fields(user_id = %request.user_id, salon_id = %request.salon_id, service_id = %request.service_id))]
    pub async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<(), ApiError> {
        let url = self.endpoint("cart/add")?;
        self.send(self.inner.client.post(url).json(request)).await?;
        Ok(())
    }

    /// Empty a user's cart for one salon.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self), fields(user_id = %user_id, salon_id = %salon_id))]
    pub async fn clear_cart(&self, user_id: &UserId, salon_id: &SalonId) -> Result<(), ApiError> {
        let mut url = self.endpoint("cart/clear")?;
        url.query_pairs_mut()
            .append_pair("userId", user_id.as_str())
            .append_pair("salonId", salon_id.as_str());

        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    // =========================================================================
    // Profile Image Methods
    // =========================================================================

    /// Get the URL of a user's profile image.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user has no image.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_profile_image(&self, user_id: &UserId) -> Result<ProfileImage, ApiError> {
        let url = self.endpoint_with_segment("v1.0/get-profile-image", user_id.as_str())?;
        self.get_json(url).await
    }

    /// Upload a new profile image.
    ///
    /// # Errors
    ///
    /// Returns an error if the multipart body cannot be built, the request
    /// fails, or the server rejects the image.
    #[instrument(skip(self, bytes), fields(user_id = %user_id, size = bytes.len()))]
    pub async fn upload_profile_image(
        &self,
        user_id: &UserId,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ProfileImage, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("userId", user_id.to_string())
            .part("image", part);

        let url = self.endpoint("v1.0/add-profile-image")?;
        let body = self.send(self.inner.client.post(url).multipart(form)).await?;
        parse_body(&body)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Decode a JSON body, logging a prefix of it on failure.
///
/// Logged at `warn`: callers such as the cart fetch recover from a bad body.
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse remote API response"
        );
        ApiError::Parse(e)
    })
}

/// Extract a human-readable reason from an error body.
///
/// A JSON object yields its `message` field (or nothing), a JSON string
/// yields itself, and any other body is used as plain text.
fn rejection_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(_)) => {
            serde_json::from_str::<types::MessageBody>(trimmed)
                .ok()
                .and_then(|body| body.message)
                .filter(|message| !message.trim().is_empty())
        }
        Ok(serde_json::Value::String(message)) => Some(message),
        _ => Some(trimmed.chars().take(500).collect()),
    }
}
