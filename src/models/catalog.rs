use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::booking::ServiceType;

/// A purchasable catalog item (tour, ticket, visa, package or transfer).
/// Read-only reference data for the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub service_type: ServiceType,
    pub title: String,
    pub description: Option<String>,
    pub price_adult: f64,
    pub price_child: f64,
    pub price_infant: f64,
    pub currency: String,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
    pub featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
