use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::booking::{self, BookingRequest};
use crate::services::{pricing, promo};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingView {
    pub id: String,
    pub reference: String,
    pub service_type: String,
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub adults: i64,
    pub children: i64,
    pub infants: i64,
    pub travel_date: Option<String>,
    pub time_slot: Option<String>,
    pub pickup_location: Option<String>,
    pub special_requests: Option<String>,
    pub base_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
    pub currency: String,
    pub promo_code: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        BookingView {
            id: b.id,
            reference: b.reference,
            service_type: b.service_type.as_str().to_string(),
            service_id: b.service_id,
            customer_name: b.customer_name,
            customer_email: b.customer_email,
            customer_phone: b.customer_phone,
            adults: b.adults,
            children: b.children,
            infants: b.infants,
            travel_date: b.travel_date.map(|d| d.format("%Y-%m-%d").to_string()),
            time_slot: b.time_slot,
            pickup_location: b.pickup_location,
            special_requests: b.special_requests,
            base_amount: b.base_amount,
            discount_amount: b.discount_amount,
            final_amount: b.final_amount,
            currency: b.currency,
            promo_code: b.promo_code,
            status: b.status.as_str().to_string(),
            payment_status: b.payment_status.as_str().to_string(),
            payment_method: b.payment_method.map(|m| m.as_str().to_string()),
            payment_reference: b.payment_reference,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<Json<BookingView>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        booking::submit_booking(&db, &body)?
    };

    Ok(Json(BookingView::from(booking)))
}

// GET /api/bookings/:reference
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_reference(&db, &reference)?
    };

    booking
        .map(|b| Json(BookingView::from(b)))
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

// POST /api/promo/validate
#[derive(Deserialize)]
pub struct ValidatePromoRequest {
    pub code: String,
    #[serde(default)]
    pub base_amount: Option<f64>,
}

#[derive(Serialize)]
pub struct ValidatePromoResponse {
    pub valid: bool,
    pub code: String,
    pub discount_type: String,
    pub discount_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
}

/// Pre-check only: reports whether the code would apply right now and what
/// it would take off the given base. Never consumes a use.
pub async fn validate_promo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidatePromoRequest>,
) -> Result<Json<ValidatePromoResponse>, AppError> {
    let now = Utc::now().naive_utc();
    let promo = {
        let db = state.db.lock().unwrap();
        promo::validate(&db, body.code.trim(), &now)?
    };

    let discount_amount = body
        .base_amount
        .map(|base| pricing::discount_for(base, &promo));

    Ok(Json(ValidatePromoResponse {
        valid: true,
        code: promo.code,
        discount_type: promo.discount_type.as_str().to_string(),
        discount_value: promo.discount_value,
        discount_amount,
    }))
}
