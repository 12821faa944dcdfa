//! Cache types for salon catalogue responses.

use crate::api::types::{SalonDetail, SalonSummary};

/// Cache key for the salon list.
pub const SALONS_KEY: &str = "salons";

/// Cache key for one salon's detail record.
pub fn salon_key(salon_id: &str) -> String {
    format!("salon:{salon_id}")
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Salons(Vec<SalonSummary>),
    Salon(Box<SalonDetail>),
}
