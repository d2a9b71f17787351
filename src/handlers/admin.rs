use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::bookings::BookingView;
use crate::models::{BookingStatus, DiscountType, EmailKind, PromoCode, Service, ServiceType};
use crate::services::email;
use crate::services::email::EmailOutcome;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

// GET /api/admin/stats
#[derive(Serialize)]
pub struct StatsResponse {
    pub total_bookings: i64,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    pub completed_payments: i64,
    pub total_revenue: f64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_booking_stats(&db)?
    };

    Ok(Json(StatsResponse {
        total_bookings: stats.total_bookings,
        pending_bookings: stats.pending_bookings,
        confirmed_bookings: stats.confirmed_bookings,
        completed_payments: stats.completed_payments,
        total_revenue: stats.total_revenue,
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status_filter = query.status.as_deref();

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, status_filter, limit)?
    };

    Ok(Json(bookings.into_iter().map(BookingView::from).collect()))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    set_booking_status(&state, &id, BookingStatus::Cancelled)
}

// POST /api/admin/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    set_booking_status(&state, &id, BookingStatus::Completed)
}

fn set_booking_status(
    state: &AppState,
    id: &str,
    status: BookingStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(&db, id, &status)?
    };

    if updated {
        tracing::info!(booking_id = %id, status = status.as_str(), "booking status updated");
        Ok(Json(serde_json::json!({"ok": true, "status": status.as_str()})))
    } else {
        Err(AppError::NotFound("booking not found".to_string()))
    }
}

// POST /api/admin/bookings/:id/email
#[derive(Deserialize)]
pub struct SendEmailRequest {
    pub kind: Option<EmailKind>,
}

pub async fn send_booking_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<SendEmailRequest>>,
) -> Result<Json<EmailOutcome>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let kind = body
        .and_then(|Json(b)| b.kind)
        .unwrap_or(EmailKind::Confirmation);

    let outcome = email::send_booking_email(&state, &id, kind).await?;
    Ok(Json(outcome))
}

// ── Promo codes ──

#[derive(Deserialize)]
pub struct PromoPayload {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    #[serde(default)]
    pub valid_from: Option<NaiveDateTime>,
    #[serde(default)]
    pub valid_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn validate_promo_payload(payload: &PromoPayload) -> Result<(), AppError> {
    if payload.code.trim().is_empty() {
        return Err(AppError::Validation("promo code is required".to_string()));
    }
    if payload.discount_value <= 0.0 {
        return Err(AppError::Validation(
            "discount value must be positive".to_string(),
        ));
    }
    if payload.discount_type == DiscountType::Percentage && payload.discount_value > 100.0 {
        return Err(AppError::Validation(
            "percentage discount cannot exceed 100".to_string(),
        ));
    }
    if let Some(max) = payload.max_uses {
        if max < 1 {
            return Err(AppError::Validation(
                "max uses must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

// GET /api/admin/promos
pub async fn list_promos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PromoCode>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let promos = {
        let db = state.db.lock().unwrap();
        queries::list_promos(&db)?
    };

    Ok(Json(promos))
}

// POST /api/admin/promos
pub async fn create_promo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PromoPayload>,
) -> Result<Json<PromoCode>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_promo_payload(&body)?;

    let code = body.code.trim().to_string();
    let now = Utc::now().naive_utc();

    let promo = {
        let db = state.db.lock().unwrap();
        if queries::promo_code_taken(&db, &code)? {
            return Err(AppError::Conflict("promo code already exists".to_string()));
        }

        let promo = PromoCode {
            id: Uuid::new_v4().to_string(),
            code,
            discount_type: body.discount_type,
            discount_value: body.discount_value,
            valid_from: body.valid_from.unwrap_or(now),
            valid_until: body.valid_until,
            max_uses: body.max_uses,
            current_uses: 0,
            active: body.active,
            created_at: now,
            updated_at: now,
        };
        queries::create_promo(&db, &promo)?;
        promo
    };

    tracing::info!(code = %promo.code, "promo code created");
    Ok(Json(promo))
}

// PUT /api/admin/promos/:id
pub async fn update_promo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<PromoPayload>,
) -> Result<Json<PromoCode>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_promo_payload(&body)?;

    let promo = {
        let db = state.db.lock().unwrap();
        let existing = queries::get_promo_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound("promo code not found".to_string()))?;

        let updated = PromoCode {
            code: body.code.trim().to_string(),
            discount_type: body.discount_type,
            discount_value: body.discount_value,
            valid_from: body.valid_from.unwrap_or(existing.valid_from),
            valid_until: body.valid_until,
            max_uses: body.max_uses,
            active: body.active,
            updated_at: Utc::now().naive_utc(),
            ..existing
        };
        queries::update_promo(&db, &updated)?;
        updated
    };

    Ok(Json(promo))
}

// DELETE /api/admin/promos/:id
pub async fn delete_promo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        queries::delete_promo(&db, &id)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Service catalog ──

#[derive(Deserialize)]
pub struct ServicePayload {
    pub service_type: ServiceType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_adult: f64,
    #[serde(default)]
    pub price_child: f64,
    #[serde(default)]
    pub price_infant: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub featured: bool,
}

fn validate_service_payload(payload: &ServicePayload) -> Result<(), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if payload.price_adult < 0.0 || payload.price_child < 0.0 || payload.price_infant < 0.0 {
        return Err(AppError::Validation("prices cannot be negative".to_string()));
    }
    Ok(())
}

// GET /api/admin/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let services = {
        let db = state.db.lock().unwrap();
        queries::list_services(&db, None, false, true)?
    };

    Ok(Json(services))
}

// POST /api/admin/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ServicePayload>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service_payload(&body)?;

    let now = Utc::now().naive_utc();
    let service = Service {
        id: Uuid::new_v4().to_string(),
        service_type: body.service_type,
        title: body.title.trim().to_string(),
        description: body.description,
        price_adult: body.price_adult,
        price_child: body.price_child,
        price_infant: body.price_infant,
        currency: body.currency.unwrap_or_else(|| state.config.currency.clone()),
        duration: body.duration,
        image_url: body.image_url,
        active: body.active,
        featured: body.featured,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::upsert_service(&db, &service)?;
    }

    tracing::info!(service_id = %service.id, title = %service.title, "service created");
    Ok(Json(service))
}

// PUT /api/admin/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ServicePayload>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    validate_service_payload(&body)?;

    let service = {
        let db = state.db.lock().unwrap();
        let existing = queries::get_service(&db, &id)?
            .ok_or_else(|| AppError::NotFound("service not found".to_string()))?;

        let currency = body.currency.unwrap_or_else(|| existing.currency.clone());
        let updated = Service {
            service_type: body.service_type,
            title: body.title.trim().to_string(),
            description: body.description,
            price_adult: body.price_adult,
            price_child: body.price_child,
            price_infant: body.price_infant,
            currency,
            duration: body.duration,
            image_url: body.image_url,
            active: body.active,
            featured: body.featured,
            updated_at: Utc::now().naive_utc(),
            ..existing
        };
        queries::upsert_service(&db, &updated)?;
        updated
    };

    Ok(Json(service))
}

// DELETE /api/admin/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        queries::delete_service(&db, &id)?;
    }

    Ok(Json(serde_json::json!({"ok": true})))
}
