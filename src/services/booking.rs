use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::{pricing, promo};

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub service_id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    #[serde(default)]
    pub infants: i64,
    #[serde(default)]
    pub travel_date: Option<NaiveDate>,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<String>,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Validates the request, prices it from catalog unit prices, redeems the
/// promo if one is supplied and persists the booking as pending/pending.
///
/// With an idempotency key, a resubmission returns the booking the first
/// submission created; without one, every submission creates a new booking.
pub fn submit_booking(conn: &Connection, request: &BookingRequest) -> Result<Booking, AppError> {
    let customer_name = request.customer_name.trim();
    if customer_name.is_empty() {
        return Err(AppError::Validation("customer name is required".to_string()));
    }

    let customer_email = clean(&request.customer_email);
    let customer_phone = clean(&request.customer_phone);
    if customer_email.is_none() && customer_phone.is_none() {
        return Err(AppError::Validation(
            "an email address or phone number is required".to_string(),
        ));
    }

    if request.adults < 1 {
        return Err(AppError::Validation("at least one adult is required".to_string()));
    }
    if request.children < 0 || request.infants < 0 {
        return Err(AppError::Validation(
            "traveler counts cannot be negative".to_string(),
        ));
    }

    let idempotency_key = clean(&request.idempotency_key);
    if let Some(key) = &idempotency_key {
        if let Some(existing) = queries::get_booking_by_idempotency_key(conn, key)? {
            tracing::info!(reference = %existing.reference, "returning existing booking for idempotency key");
            return Ok(existing);
        }
    }

    let service = queries::get_service(conn, &request.service_id)?
        .ok_or_else(|| AppError::Validation("unknown service".to_string()))?;
    if !service.active {
        return Err(AppError::Validation("service is not available".to_string()));
    }

    let now = Utc::now().naive_utc();

    let promo = match clean(&request.promo_code) {
        Some(code) => Some(promo::redeem(conn, &code, &now)?),
        None => None,
    };

    let quote = pricing::quote(
        &service,
        request.adults,
        request.children,
        request.infants,
        promo.as_ref(),
    );

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        reference: generate_reference(),
        service_type: service.service_type,
        service_id: service.id.clone(),
        customer_name: customer_name.to_string(),
        customer_email,
        customer_phone,
        adults: request.adults,
        children: request.children,
        infants: request.infants,
        travel_date: request.travel_date,
        time_slot: clean(&request.time_slot),
        pickup_location: clean(&request.pickup_location),
        special_requests: clean(&request.special_requests),
        base_amount: quote.base_amount,
        discount_amount: quote.discount_amount,
        final_amount: quote.final_amount,
        currency: service.currency.clone(),
        promo_code: promo.map(|p| p.code),
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: None,
        payment_reference: None,
        idempotency_key: idempotency_key.clone(),
        created_at: now,
        updated_at: now,
    };

    let inserted = queries::create_booking(conn, &booking)?;
    if inserted == 0 {
        // The key was claimed between our pre-check and the insert.
        let key = idempotency_key
            .ok_or_else(|| anyhow::anyhow!("booking insert affected no rows"))?;
        return queries::get_booking_by_idempotency_key(conn, &key)?
            .ok_or_else(|| anyhow::anyhow!("idempotency key {key} vanished after conflict").into());
    }

    tracing::info!(
        reference = %booking.reference,
        service_id = %booking.service_id,
        final_amount = booking.final_amount,
        "booking created"
    );

    Ok(booking)
}

fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("SFR-{}", id[..8].to_uppercase())
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
