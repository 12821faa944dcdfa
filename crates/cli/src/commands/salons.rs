//! Salon listing, detail, and service menu commands.

use glow_client::search::{SalonFilter, filter_services};
use glow_client::{AppState, ClientError};
use glow_core::{GenderFilter, SalonId, ServiceCategory};

/// List salons matching the given filters.
pub async fn list(
    state: &AppState,
    query: String,
    city: String,
    service: String,
) -> Result<(), ClientError> {
    let salons = state.api().get_all_salons().await?;
    let filter = SalonFilter {
        query,
        city,
        service,
    };
    let matches = filter.apply(&salons);

    if matches.is_empty() {
        tracing::info!("No salons match your filters");
        return Ok(());
    }

    tracing::info!("{} of {} salons", matches.len(), salons.len());
    for salon in matches {
        tracing::info!(
            "{}  {} ({})  [{}]",
            salon.salon_id,
            salon.name,
            salon.city,
            salon.services.join(", ")
        );
    }
    Ok(())
}

/// Show one salon and its full service menu.
pub async fn show(state: &AppState, salon_id: &str) -> Result<(), ClientError> {
    let salon = state.api().get_salon(&SalonId::new(salon_id)).await?;

    tracing::info!("{} ({})", salon.name, salon.city);
    if let Some(address) = &salon.address {
        tracing::info!("Address: {address}");
    }
    if let Some(contact) = &salon.contact {
        tracing::info!("Contact: {contact}");
    }
    if let Some(email) = &salon.email {
        tracing::info!("Email: {email}");
    }

    if salon.services.is_empty() {
        tracing::info!("No services listed");
    }
    for service in &salon.services {
        tracing::info!(
            "{}  {}  {}  {} min",
            service.id,
            service.name,
            service.price,
            service.time
        );
    }
    Ok(())
}

/// Show a salon's services in one category, filtered by gender.
pub async fn services(
    state: &AppState,
    salon_id: &str,
    category: &str,
    gender: GenderFilter,
) -> Result<(), ClientError> {
    let category = ServiceCategory::by_name(category)?;
    let services = state
        .api()
        .get_services(&SalonId::new(salon_id), &category.category_id())
        .await?;
    let shown = filter_services(&services, gender);

    if shown.is_empty() {
        tracing::info!("No {category} services found");
        return Ok(());
    }

    for service in shown {
        tracing::info!(
            "{}  {}  {}  {} min  {}",
            service.id,
            service.name,
            service.price,
            service.time,
            service.gender_category.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
