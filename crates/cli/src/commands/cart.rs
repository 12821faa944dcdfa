//! Cart commands.

use glow_client::api::{CartSnapshot, ServiceDetail};
use glow_client::{AppState, ClientError};
use glow_core::{SalonId, ServiceCategory, ServiceId};

fn report(cart: &CartSnapshot) {
    if cart.is_empty() {
        tracing::info!("Your cart is empty");
        return;
    }

    for item in &cart.items {
        tracing::info!(
            "{}  {}  {}  {} min",
            item.service_id,
            item.service_name,
            item.price,
            item.time
        );
    }
    tracing::info!(
        "{} item(s), total {} ({} min)",
        cart.len(),
        cart.total_price(),
        cart.total_minutes()
    );
}

/// Show the cart at a salon.
pub async fn show(state: &AppState, salon_id: &str, offline: bool) -> Result<(), ClientError> {
    let session = state.sessions().require()?;
    let salon_id = SalonId::new(salon_id);

    let cart = if offline {
        state
            .cart()
            .cached(&session.user_id, &salon_id)
            .unwrap_or_default()
    } else {
        state.cart().fetch_cart(&session.user_id, &salon_id).await
    };

    report(&cart);
    Ok(())
}

/// Find a service on a salon's menu, then in a category listing.
async fn find_service(
    state: &AppState,
    salon_id: &SalonId,
    service_id: &ServiceId,
    category: Option<&str>,
) -> Result<Option<ServiceDetail>, ClientError> {
    let salon = state.api().get_salon(salon_id).await?;
    if let Some(service) = salon.services.into_iter().find(|s| &s.id == service_id) {
        return Ok(Some(service));
    }

    let Some(category) = category else {
        return Ok(None);
    };
    let category = ServiceCategory::by_name(category)?;
    let services = state
        .api()
        .get_services(salon_id, &category.category_id())
        .await?;
    Ok(services.into_iter().find(|s| &s.id == service_id))
}

/// Add a service to the cart at a salon.
pub async fn add(
    state: &AppState,
    salon_id: &str,
    service_id: &str,
    category: Option<&str>,
) -> Result<(), ClientError> {
    let session = state.sessions().require()?;
    let salon_id = SalonId::new(salon_id);
    let service_id = ServiceId::new(service_id);

    let Some(service) = find_service(state, &salon_id, &service_id, category).await? else {
        return Err(ClientError::Api(glow_client::api::ApiError::NotFound(format!(
            "Service not found: {service_id}"
        ))));
    };

    let cart = state
        .cart()
        .add_service(&session.user_id, &salon_id, &service)
        .await?;

    tracing::info!("Added {} to your cart", service.name);
    report(&cart);
    Ok(())
}

/// Empty the cart at a salon.
pub async fn clear(state: &AppState, salon_id: &str) -> Result<(), ClientError> {
    let session = state.sessions().require()?;
    state
        .cart()
        .clear_cart(&session.user_id, &SalonId::new(salon_id))
        .await?;
    tracing::info!("Cart cleared");
    Ok(())
}
