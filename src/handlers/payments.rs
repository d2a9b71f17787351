use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{GatewayKind, GatewayName};
use crate::services::payment::{
    self, ConfirmPaymentRequest, CreatePaymentRequest, FailPaymentRequest, PaymentConfirmation,
    PaymentDispatch, PaymentFailure,
};
use crate::state::AppState;

// GET /api/payments/gateways
#[derive(Serialize)]
pub struct GatewayView {
    pub name: GatewayName,
    pub display_name: String,
    pub kind: GatewayKind,
    pub test_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<serde_json::Value>,
}

/// The payment methods customers can pick from: enabled only, in priority
/// order, with bank details exposed for manual methods.
pub async fn list_gateways(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GatewayView>>, AppError> {
    let gateways = {
        let db = state.db.lock().unwrap();
        queries::list_gateways(&db, true)?
    };

    let response: Vec<GatewayView> = gateways
        .into_iter()
        .map(|g| {
            let bank_details = match g.name.kind() {
                GatewayKind::Manual => g.config.get("bank_details").cloned(),
                _ => None,
            };
            GatewayView {
                name: g.name,
                display_name: g.display_name,
                kind: g.name.kind(),
                test_mode: g.test_mode,
                bank_details,
            }
        })
        .collect();

    Ok(Json(response))
}

// POST /api/payments/create
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentDispatch>, AppError> {
    let dispatch = {
        let db = state.db.lock().unwrap();
        payment::create_payment(&db, &state.config, &body)?
    };

    Ok(Json(dispatch))
}

// POST /api/payments/confirm
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    let confirmation = payment::confirm_payment(&state, &body).await?;
    Ok(Json(confirmation))
}

// POST /api/payments/fail
pub async fn fail_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FailPaymentRequest>,
) -> Result<Json<PaymentFailure>, AppError> {
    let failure = {
        let db = state.db.lock().unwrap();
        payment::fail_payment(&db, &body)?
    };

    Ok(Json(failure))
}
