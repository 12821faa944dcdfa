//! Salon and service filtering for the listing and menu screens.
//!
//! Filters are recomputed in full over the base list on every change; the
//! lists are small enough that no index is kept.

use glow_core::GenderFilter;

use crate::api::{SalonSummary, ServiceDetail};

/// Cities offered by the listing sidebar.
pub const CITIES: [&str; 4] = ["Surat", "Ahmedabad", "Rajkot", "Vadodara"];

/// Service tags offered by the listing sidebar.
pub const SERVICE_TAGS: [&str; 5] = ["Haircut", "Hair Coloring", "Pedicure", "Facial", "Massage"];

/// Filters over the salon list. An empty field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalonFilter {
    /// Free-text search over name and city (case-insensitive substring).
    pub query: String,
    /// Exact city match.
    pub city: String,
    /// Exact service tag the salon must offer.
    pub service: String,
}

impl SalonFilter {
    /// Create an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the city.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Set the service tag.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Select a city, or clear it if it is already selected.
    pub fn toggle_city(&mut self, city: &str) {
        toggle(&mut self.city, city);
    }

    /// Select a service tag, or clear it if it is already selected.
    pub fn toggle_service(&mut self, service: &str) {
        toggle(&mut self.service, service);
    }

    /// Whether no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.city.is_empty() && self.service.is_empty()
    }

    /// Whether one salon passes every set constraint.
    #[must_use]
    pub fn matches(&self, salon: &SalonSummary) -> bool {
        let query_ok = self.query.is_empty() || {
            let needle = self.query.to_lowercase();
            salon.name.to_lowercase().contains(&needle)
                || salon.city.to_lowercase().contains(&needle)
        };
        let city_ok = self.city.is_empty() || salon.city == self.city;
        let service_ok = self.service.is_empty() || salon.offers(&self.service);

        query_ok && city_ok && service_ok
    }

    /// The salons passing the filter, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, salons: &'a [SalonSummary]) -> Vec<&'a SalonSummary> {
        salons.iter().filter(|salon| self.matches(salon)).collect()
    }
}

fn toggle(slot: &mut String, value: &str) {
    if slot == value {
        slot.clear();
    } else {
        value.clone_into(slot);
    }
}

/// The services passing a gender filter, in their original order.
#[must_use]
pub fn filter_services(services: &[ServiceDetail], gender: GenderFilter) -> Vec<&ServiceDetail> {
    services
        .iter()
        .filter(|service| gender.matches(service.gender_category.as_deref()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glow_core::{GenderCategory, Price, SalonId, ServiceId};

    use super::*;

    fn salon(id: &str, name: &str, city: &str, services: &[&str]) -> SalonSummary {
        SalonSummary {
            salon_id: SalonId::new(id),
            name: name.to_string(),
            city: city.to_string(),
            address: None,
            contact: None,
            email: None,
            image_url: String::new(),
            services: services.iter().map(ToString::to_string).collect(),
        }
    }

    fn base() -> Vec<SalonSummary> {
        vec![
            salon("1", "Glam", "Surat", &["Haircut"]),
            salon("2", "Style", "Rajkot", &["Facial"]),
            salon("3", "Surat Spa", "Vadodara", &["Massage", "Facial"]),
        ]
    }

    fn names(salons: &[&SalonSummary]) -> Vec<String> {
        salons.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything_in_order() {
        let salons = base();
        assert!(SalonFilter::new().is_empty());
        assert_eq!(
            names(&SalonFilter::new().apply(&salons)),
            ["Glam", "Style", "Surat Spa"]
        );
    }

    #[test]
    fn test_city_then_service() {
        let salons = vec![
            salon("1", "Glam", "Surat", &["Haircut"]),
            salon("2", "Style", "Rajkot", &["Facial"]),
        ];
        let filter = SalonFilter::new().with_city("Surat");
        assert_eq!(names(&filter.apply(&salons)), ["Glam"]);

        let filter = filter.with_service("Facial");
        assert!(filter.apply(&salons).is_empty());
    }

    #[test]
    fn test_query_matches_name_or_city_case_insensitively() {
        let salons = base();
        let filter = SalonFilter::new().with_query("surat");
        assert_eq!(names(&filter.apply(&salons)), ["Glam", "Surat Spa"]);

        let filter = SalonFilter::new().with_query("STY");
        assert_eq!(names(&filter.apply(&salons)), ["Style"]);
    }

    #[test]
    fn test_city_is_exact() {
        let salons = base();
        let filter = SalonFilter::new().with_city("surat");
        assert!(filter.apply(&salons).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent_subset() {
        let salons = base();
        let filter = SalonFilter::new().with_query("a").with_service("Facial");

        let once: Vec<SalonSummary> = filter.apply(&salons).into_iter().cloned().collect();
        let twice: Vec<SalonSummary> = filter.apply(&once).into_iter().cloned().collect();

        assert_eq!(once, twice);
        assert!(once.iter().all(|s| salons.contains(s)));
    }

    #[test]
    fn test_toggle_clears_selected_value() {
        let mut filter = SalonFilter::new();
        filter.toggle_city("Surat");
        assert_eq!(filter.city, "Surat");
        filter.toggle_city("Rajkot");
        assert_eq!(filter.city, "Rajkot");
        filter.toggle_city("Rajkot");
        assert!(filter.city.is_empty());

        filter.toggle_service("Facial");
        filter.toggle_service("Facial");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_sidebar_values_match_salon_tags() {
        let salon = salon("1", "Glam", "Surat", &SERVICE_TAGS);
        for tag in SERVICE_TAGS {
            assert!(SalonFilter::new().with_service(tag).matches(&salon));
        }
        assert!(CITIES.contains(&salon.city.as_str()));
    }

    #[test]
    fn test_filter_services_by_gender() {
        let service = |id: &str, gender: Option<&str>| ServiceDetail {
            id: ServiceId::new(id),
            name: id.to_string(),
            description: String::new(),
            price: Price::ZERO,
            time: 0,
            image_url: String::new(),
            gender_category: gender.map(ToString::to_string),
        };
        let services = vec![
            service("a", Some("Male")),
            service("b", Some("female")),
            service("c", None),
        ];

        assert_eq!(filter_services(&services, GenderFilter::All).len(), 3);
        let male = filter_services(&services, GenderFilter::Only(GenderCategory::Male));
        assert_eq!(male.len(), 1);
        assert_eq!(male.first().unwrap().id.as_str(), "a");
    }
}
