//! Domain types for the remote salon API.
//!
//! The salon list and salon detail endpoints return different shapes for the
//! same entity (`services` is a list of tag strings in one, a list of full
//! service records in the other), so they are modelled as two distinct types.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use glow_core::{GenderCategory, Price, SalonId, ServiceId, UserId};

/// Deserialize a list that the server may omit, send as `null`, or send as a
/// non-array value. Anything but an array becomes an empty list; the elements
/// of a real array must still be well formed.
fn vec_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(items @ serde_json::Value::Array(_)) => {
            serde_json::from_value(items).map_err(D::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

// =============================================================================
// Salons
// =============================================================================

/// A salon as returned by `GET /salon/get-all-salon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonSummary {
    /// Salon id.
    #[serde(alias = "_id", alias = "id")]
    pub salon_id: SalonId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// City the salon is in.
    #[serde(default)]
    pub city: String,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub image_url: String,
    /// Service tags offered (e.g. "Haircut", "Facial").
    #[serde(default, deserialize_with = "vec_or_empty")]
    pub services: Vec<String>,
}

impl SalonSummary {
    /// Whether the salon advertises the given service tag (exact match).
    #[must_use]
    pub fn offers(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }
}

/// A salon as returned by `GET /salon/get-salon/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonDetail {
    /// Salon id.
    #[serde(alias = "_id", alias = "id")]
    pub salon_id: SalonId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// City the salon is in.
    #[serde(default)]
    pub city: String,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub image_url: String,
    /// Full service menu. Missing or malformed on the wire means empty.
    #[serde(default, deserialize_with = "vec_or_empty")]
    pub services: Vec<ServiceDetail>,
}

// =============================================================================
// Services
// =============================================================================

/// A bookable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetail {
    /// Service id.
    #[serde(alias = "_id")]
    pub id: ServiceId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Price in rupees.
    #[serde(default)]
    pub price: Price,
    /// Duration in minutes.
    #[serde(default)]
    pub time: u32,
    /// Image URL.
    #[serde(default)]
    pub image_url: String,
    /// Raw gender targeting as sent by the server.
    #[serde(default)]
    pub gender_category: Option<String>,
}

impl ServiceDetail {
    /// Parsed gender targeting, if the server sent a known value.
    #[must_use]
    pub fn gender(&self) -> Option<GenderCategory> {
        self.gender_category
            .as_deref()
            .and_then(GenderCategory::parse_lenient)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One service in a user's cart for a salon.
///
/// Denormalized: carries enough of the service to render the cart without
/// another fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Service id.
    pub service_id: ServiceId,
    /// Salon the service belongs to.
    pub salon_id: SalonId,
    /// Owner of the cart.
    pub user_id: UserId,
    /// Service display name.
    #[serde(default)]
    pub service_name: String,
    /// Price in rupees.
    #[serde(default)]
    pub price: Price,
    /// Duration in minutes.
    #[serde(default)]
    pub time: u32,
    /// Image URL.
    #[serde(default)]
    pub image_url: String,
}

impl CartItem {
    /// Build a cart line from service metadata the caller already holds.
    #[must_use]
    pub fn from_service(user_id: &UserId, salon_id: &SalonId, service: &ServiceDetail) -> Self {
        Self {
            service_id: service.id.clone(),
            salon_id: salon_id.clone(),
            user_id: user_id.clone(),
            service_name: service.name.clone(),
            price: service.price,
            time: service.time,
            image_url: service.image_url.clone(),
        }
    }
}

/// A user's in-progress service selection for one salon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Selected services, oldest first.
    #[serde(default, deserialize_with = "vec_or_empty")]
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The most recently added item.
    #[must_use]
    pub fn last_added(&self) -> Option<&CartItem> {
        self.items.last()
    }

    /// Sum of item prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Sum of item durations in minutes.
    #[must_use]
    pub fn total_minutes(&self) -> u32 {
        self.items.iter().map(|item| item.time).sum()
    }
}

/// Body of `POST /cart/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: UserId,
    pub salon_id: SalonId,
    pub service_id: ServiceId,
}

// =============================================================================
// Profile & Auth
// =============================================================================

/// Response of the profile image endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImage {
    pub image_url: String,
}

/// User record returned by `POST /login`.
///
/// Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthUser {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub is_account_verified: bool,
}

/// Error body shape shared by the auth endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_salon_summary_accepts_mongo_id() {
        let json = r#"{"_id":"s1","name":"Glam","city":"Surat","imageUrl":"x.png","services":["Haircut"]}"#;
        let salon: SalonSummary = serde_json::from_str(json).unwrap();
        assert_eq!(salon.salon_id.as_str(), "s1");
        assert!(salon.offers("Haircut"));
        assert!(!salon.offers("haircut"));
    }

    #[test]
    fn test_salon_detail_missing_services_defaults_to_empty() {
        let json = r#"{"salonId":"s1","name":"Glam","city":"Surat"}"#;
        let salon: SalonDetail = serde_json::from_str(json).unwrap();
        assert!(salon.services.is_empty());
    }

    #[test]
    fn test_salon_detail_non_array_services_defaults_to_empty() {
        let json = r#"{"salonId":"s1","name":"Glam","services":"n/a"}"#;
        let salon: SalonDetail = serde_json::from_str(json).unwrap();
        assert!(salon.services.is_empty());

        let json = r#"{"salonId":"s1","name":"Glam","services":null}"#;
        let salon: SalonDetail = serde_json::from_str(json).unwrap();
        assert!(salon.services.is_empty());
    }

    #[test]
    fn test_salon_detail_with_services() {
        let json = r#"{
            "_id": "s1",
            "name": "Glam",
            "services": [
                {"_id": "v1", "name": "Fade", "price": 250, "time": 30, "genderCategory": "Male"}
            ]
        }"#;
        let salon: SalonDetail = serde_json::from_str(json).unwrap();
        let service = salon.services.first().unwrap();
        assert_eq!(service.id.as_str(), "v1");
        assert_eq!(service.price, Price::from_rupees(250));
        assert_eq!(service.gender(), Some(GenderCategory::Male));
    }

    #[test]
    fn test_cart_item_from_service() {
        let service = ServiceDetail {
            id: ServiceId::new("v1"),
            name: "Fade".to_string(),
            description: String::new(),
            price: Price::from_rupees(250),
            time: 30,
            image_url: "fade.png".to_string(),
            gender_category: None,
        };
        let item = CartItem::from_service(&UserId::new("u1"), &SalonId::new("s1"), &service);
        assert_eq!(item.service_name, "Fade");
        assert_eq!(item.user_id.as_str(), "u1");
        assert_eq!(item.salon_id.as_str(), "s1");
        assert_eq!(item.time, 30);
    }

    #[test]
    fn test_cart_snapshot_totals() {
        let json = r#"{"items":[
            {"serviceId":"a","salonId":"s","userId":"u","serviceName":"A","price":100,"time":20,"imageUrl":""},
            {"serviceId":"b","salonId":"s","userId":"u","serviceName":"B","price":150,"time":40,"imageUrl":""}
        ]}"#;
        let cart: CartSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_price(), Price::from_rupees(250));
        assert_eq!(cart.total_minutes(), 60);
        assert_eq!(cart.last_added().unwrap().service_name, "B");
    }

    #[test]
    fn test_cart_snapshot_ignores_extra_server_fields() {
        let json = r#"{"_id":"c1","userId":"u","salonId":"s","items":[]}"#;
        let cart: CartSnapshot = serde_json::from_str(json).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_auth_user_defaults_missing_fields() {
        let user: AuthUser = serde_json::from_str(r#"{"name":"Riya"}"#).unwrap();
        assert!(user.user_id.is_empty());
        assert_eq!(user.name, "Riya");
        assert!(!user.is_account_verified);
    }

    #[test]
    fn test_add_to_cart_request_wire_names() {
        let request = AddToCartRequest {
            user_id: UserId::new("u"),
            salon_id: SalonId::new("s"),
            service_id: ServiceId::new("v"),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"userId":"u","salonId":"s","serviceId":"v"}"#
        );
    }
}
