//! Service categories and gender targeting.

use serde::{Deserialize, Serialize};

use crate::CategoryId;

/// Error returned when a category name is not in the catalog.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown service category: {0}")]
pub struct UnknownCategory(pub String);

/// Who a service is aimed at.
///
/// The remote API sends this as a free-form `genderCategory` string; it is
/// compared case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderCategory {
    Male,
    Female,
    Kid,
    Unisex,
}

impl GenderCategory {
    /// Parse a `genderCategory` value, ignoring case and surrounding spaces.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "men" => Some(Self::Male),
            "female" | "women" => Some(Self::Female),
            "kid" | "kids" => Some(Self::Kid),
            "unisex" => Some(Self::Unisex),
            _ => None,
        }
    }
}

impl std::fmt::Display for GenderCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Kid => write!(f, "kid"),
            Self::Unisex => write!(f, "unisex"),
        }
    }
}

/// Gender filter applied to a service list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenderFilter {
    /// No constraint.
    #[default]
    All,
    /// Only services tagged with this category.
    Only(GenderCategory),
}

impl GenderFilter {
    /// Whether a service's raw `genderCategory` passes this filter.
    #[must_use]
    pub fn matches(self, gender_category: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => {
                gender_category.and_then(GenderCategory::parse_lenient) == Some(wanted)
            }
        }
    }
}

impl std::str::FromStr for GenderFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        GenderCategory::parse_lenient(s)
            .map(Self::Only)
            .ok_or_else(|| format!("invalid gender filter: {s}"))
    }
}

/// A service category known to the remote API.
///
/// Services are listed per `(salon, category)` pair, so a category's server
/// id is needed to browse a salon's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceCategory {
    /// Display name.
    pub name: &'static str,
    /// Server-side category id.
    pub id: &'static str,
}

impl ServiceCategory {
    /// Every category the booking flow offers, in menu order.
    pub const ALL: [Self; 10] = [
        Self::new("Haircut", "694ce6be84ba8f65cd26743b"),
        Self::new("Hair Styling", "694ce6be84ba8f65cd26743c"),
        Self::new("Hair Coloring", "694ce6be84ba8f65cd26743d"),
        Self::new("Facial", "694ce6be84ba8f65cd267440"),
        Self::new("Cleanup", "694ce6be84ba8f65cd267441"),
        Self::new("Manicure", "694ce6be84ba8f65cd267443"),
        Self::new("Pedicure", "694ce6be84ba8f65cd267444"),
        Self::new("Waxing", "694ce6be84ba8f65cd267446"),
        Self::new("Makeup", "694ce6be84ba8f65cd267449"),
        Self::new("Massage", "694ce6be84ba8f65cd26744b"),
    ];

    const fn new(name: &'static str, id: &'static str) -> Self {
        Self { name, id }
    }

    /// The category selected when the menu first opens.
    #[must_use]
    pub const fn default_category() -> Self {
        Self::ALL[0]
    }

    /// Look up a category by display name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownCategory`] if no category has that name.
    pub fn by_name(name: &str) -> Result<Self, UnknownCategory> {
        Self::ALL
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| UnknownCategory(name.to_owned()))
    }

    /// The category id as a typed id.
    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        CategoryId::new(self.id)
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}
