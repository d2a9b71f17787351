use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingStatus, EmailKind, GatewayConfig, GatewayKind, GatewayName, PaymentStatus,
};
use crate::services::{email, pricing};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: String,
    pub gateway: GatewayName,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub booking_id: String,
    pub payment_id: String,
    pub payment_method: GatewayName,
}

#[derive(Debug, Deserialize)]
pub struct FailPaymentRequest {
    pub booking_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentAction {
    Widget,
    Redirect,
}

/// Parameters the hosted checkout widget needs to open client-side.
#[derive(Debug, Serialize)]
pub struct WidgetCheckout {
    pub key_id: String,
    /// Amount in minor units (paise, cents).
    pub amount: i64,
    pub currency: String,
    pub order_reference: String,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub test_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentDispatch {
    pub success: bool,
    pub requires_action: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<PaymentAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<WidgetCheckout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<serde_json::Value>,
    pub booking_reference: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmation {
    pub success: bool,
    pub booking_reference: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct PaymentFailure {
    pub success: bool,
    pub booking_reference: String,
    pub payment_status: PaymentStatus,
}

/// Starts a payment attempt: checks the booking can still be paid, checks
/// the method is enabled, then hands back whatever the method's kind needs
/// (widget parameters, a redirect URL, or manual instructions). Records the
/// chosen method on the booking; a previously failed attempt goes back to
/// pending.
pub fn create_payment(
    conn: &Connection,
    config: &AppConfig,
    request: &CreatePaymentRequest,
) -> Result<PaymentDispatch, AppError> {
    let booking = queries::get_booking_by_id(conn, &request.booking_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Conflict("booking is cancelled".to_string()));
    }
    if booking.payment_status == PaymentStatus::Completed {
        return Err(AppError::Conflict("booking is already paid".to_string()));
    }

    let gateway = queries::get_gateway(conn, request.gateway)?
        .filter(|g| g.enabled)
        .ok_or_else(|| AppError::NotFound("payment method is not available".to_string()))?;

    let dispatch = match gateway.name.kind() {
        GatewayKind::HostedWidget => PaymentDispatch {
            success: true,
            requires_action: true,
            action: Some(PaymentAction::Widget),
            checkout: Some(WidgetCheckout {
                key_id: gateway.api_key.clone(),
                amount: pricing::to_minor_units(booking.final_amount),
                currency: booking.currency.clone(),
                order_reference: booking.reference.clone(),
                customer_name: booking.customer_name.clone(),
                customer_email: booking.customer_email.clone(),
                customer_phone: booking.customer_phone.clone(),
                test_mode: gateway.test_mode,
            }),
            checkout_url: None,
            message: None,
            bank_details: None,
            booking_reference: booking.reference.clone(),
        },
        GatewayKind::Redirect => PaymentDispatch {
            success: true,
            requires_action: true,
            action: Some(PaymentAction::Redirect),
            checkout: None,
            checkout_url: Some(build_redirect_url(&gateway, &booking, config)?),
            message: None,
            bank_details: None,
            booking_reference: booking.reference.clone(),
        },
        GatewayKind::Manual => PaymentDispatch {
            success: true,
            requires_action: false,
            action: None,
            checkout: None,
            checkout_url: None,
            message: Some(manual_instructions(&gateway)),
            bank_details: gateway.config.get("bank_details").cloned(),
            booking_reference: booking.reference.clone(),
        },
    };

    queries::set_payment_dispatched(conn, &booking.id, gateway.name)?;
    tracing::info!(
        reference = %booking.reference,
        gateway = gateway.name.as_str(),
        "payment dispatched"
    );

    Ok(dispatch)
}

fn build_redirect_url(
    gateway: &GatewayConfig,
    booking: &Booking,
    config: &AppConfig,
) -> Result<String, AppError> {
    let template = gateway
        .config
        .get("checkout_url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            anyhow::anyhow!("gateway {} has no checkout_url configured", gateway.name.as_str())
        })?;

    let return_url = format!(
        "{}/payment/return?reference={}",
        config.base_url, booking.reference
    );

    Ok(template
        .replace("{reference}", &booking.reference)
        .replace("{amount}", &format!("{:.2}", booking.final_amount))
        .replace("{currency}", &booking.currency)
        .replace("{return_url}", &return_url))
}

fn manual_instructions(gateway: &GatewayConfig) -> String {
    gateway
        .config
        .get("instructions")
        .and_then(|v| v.as_str())
        .unwrap_or("Your booking is reserved. Complete the payment as instructed to confirm it.")
        .to_string()
}

/// Records a gateway-reported success: payment completed, booking
/// confirmed, external payment id stored. Re-confirming an already paid
/// booking is a no-op that reports success again. The confirmation email
/// is best-effort; a mail failure never rolls back the confirmation.
pub async fn confirm_payment(
    state: &AppState,
    request: &ConfirmPaymentRequest,
) -> Result<PaymentConfirmation, AppError> {
    let (booking, newly_confirmed) = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking_by_id(&db, &request.booking_id)?
            .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::Conflict("booking is cancelled".to_string()));
        }
        if booking.payment_status == PaymentStatus::Completed {
            (booking, false)
        } else {
            queries::mark_booking_paid(&db, &booking.id, &request.payment_id, request.payment_method)?;
            let updated = queries::get_booking_by_id(&db, &booking.id)?
                .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;
            (updated, true)
        }
    };

    if newly_confirmed {
        tracing::info!(
            reference = %booking.reference,
            payment_id = %request.payment_id,
            "payment confirmed"
        );
        if booking.customer_email.is_some() {
            if let Err(e) = email::send_booking_email(state, &booking.id, EmailKind::Confirmation).await
            {
                tracing::warn!(reference = %booking.reference, error = %e, "confirmation email failed");
            }
        }
    }

    Ok(PaymentConfirmation {
        success: true,
        booking_reference: booking.reference,
        status: booking.status,
        payment_status: booking.payment_status,
    })
}

/// Records a declined or abandoned attempt. The booking itself stays
/// pending so the customer can pick another method; a completed payment
/// can no longer fail.
pub fn fail_payment(
    conn: &Connection,
    request: &FailPaymentRequest,
) -> Result<PaymentFailure, AppError> {
    let booking = queries::get_booking_by_id(conn, &request.booking_id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if booking.payment_status == PaymentStatus::Completed {
        return Err(AppError::Conflict("payment is already completed".to_string()));
    }

    queries::mark_payment_failed(conn, &booking.id)?;
    tracing::info!(
        reference = %booking.reference,
        reason = request.reason.as_deref().unwrap_or("unspecified"),
        "payment failed"
    );

    Ok(PaymentFailure {
        success: true,
        booking_reference: booking.reference,
        payment_status: PaymentStatus::Failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use crate::db;
    use crate::models::ServiceType;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn test_config() -> AppConfig {
        AppConfig {
            port: 0,
            database_url: ":memory:".to_string(),
            admin_token: "secret".to_string(),
            currency: "INR".to_string(),
            base_url: "http://localhost:3000".to_string(),
            mail_relay_url: String::new(),
            mail_api_key: String::new(),
            mail_from: "bookings@safar.example".to_string(),
        }
    }

    fn seed_booking(conn: &Connection, id: &str) -> Booking {
        let now = Utc::now().naive_utc();
        let booking = Booking {
            id: id.to_string(),
            reference: format!("SFR-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase()),
            service_type: ServiceType::Tour,
            service_id: "svc-1".to_string(),
            customer_name: "Asha Verma".to_string(),
            customer_email: Some("asha@example.com".to_string()),
            customer_phone: None,
            adults: 2,
            children: 1,
            infants: 0,
            travel_date: None,
            time_slot: None,
            pickup_location: None,
            special_requests: None,
            base_amount: 2500.0,
            discount_amount: 0.0,
            final_amount: 2500.0,
            currency: "INR".to_string(),
            promo_code: None,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            payment_reference: None,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
        };
        queries::create_booking(conn, &booking).unwrap();
        booking
    }

    fn enable_gateway(conn: &Connection, name: &str) {
        conn.execute(
            "UPDATE payment_gateways SET enabled = 1 WHERE name = ?1",
            [name],
        )
        .unwrap();
    }

    fn set_gateway_config(conn: &Connection, name: &str, config: &str) {
        conn.execute(
            "UPDATE payment_gateways SET config = ?1 WHERE name = ?2",
            [config, name],
        )
        .unwrap();
    }

    #[test]
    fn test_manual_gateway_needs_no_action() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "cash_on_arrival");

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::CashOnArrival,
        };
        let dispatch = create_payment(&conn, &config, &request).unwrap();

        assert!(dispatch.success);
        assert!(!dispatch.requires_action);
        assert!(dispatch.message.is_some());
        assert!(dispatch.checkout.is_none());
        assert!(dispatch.checkout_url.is_none());

        // Manual methods never auto-complete payment.
        let booking = queries::get_booking_by_id(&conn, "bk-1").unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.payment_method, Some(GatewayName::CashOnArrival));
    }

    #[test]
    fn test_bank_transfer_includes_bank_details() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "bank_transfer");
        set_gateway_config(
            &conn,
            "bank_transfer",
            r#"{"bank_details":{"account":"00112233","ifsc":"HDFC0001234"}}"#,
        );

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::BankTransfer,
        };
        let dispatch = create_payment(&conn, &config, &request).unwrap();

        assert!(!dispatch.requires_action);
        let details = dispatch.bank_details.unwrap();
        assert_eq!(details["account"], "00112233");
    }

    #[test]
    fn test_widget_gateway_returns_checkout_in_minor_units() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "razorpay");
        conn.execute(
            "UPDATE payment_gateways SET api_key = 'rzp_test_key' WHERE name = 'razorpay'",
            [],
        )
        .unwrap();

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::Razorpay,
        };
        let dispatch = create_payment(&conn, &config, &request).unwrap();

        assert!(dispatch.requires_action);
        assert!(matches!(dispatch.action, Some(PaymentAction::Widget)));
        let checkout = dispatch.checkout.unwrap();
        assert_eq!(checkout.amount, 250000);
        assert_eq!(checkout.key_id, "rzp_test_key");
        assert_eq!(checkout.currency, "INR");
    }

    #[test]
    fn test_redirect_gateway_builds_url_from_template() {
        let conn = setup_db();
        let config = test_config();
        let booking = seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "stripe");
        set_gateway_config(
            &conn,
            "stripe",
            r#"{"checkout_url":"https://pay.example.com/checkout?ref={reference}&amt={amount}&cur={currency}&back={return_url}"}"#,
        );

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::Stripe,
        };
        let dispatch = create_payment(&conn, &config, &request).unwrap();

        assert!(matches!(dispatch.action, Some(PaymentAction::Redirect)));
        let url = dispatch.checkout_url.unwrap();
        assert!(url.contains(&format!("ref={}", booking.reference)));
        assert!(url.contains("amt=2500.00"));
        assert!(url.contains("cur=INR"));
        assert!(url.contains("back=http://localhost:3000/payment/return"));
    }

    #[test]
    fn test_unknown_booking_is_not_found() {
        let conn = setup_db();
        let config = test_config();
        enable_gateway(&conn, "razorpay");

        let request = CreatePaymentRequest {
            booking_id: "missing".to_string(),
            gateway: GatewayName::Razorpay,
        };
        let err = create_payment(&conn, &config, &request).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_disabled_gateway_is_not_available() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::Razorpay,
        };
        let err = create_payment(&conn, &config, &request).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_cancelled_booking_cannot_start_payment() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "razorpay");
        queries::update_booking_status(&conn, "bk-1", &BookingStatus::Cancelled).unwrap();

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::Razorpay,
        };
        let err = create_payment(&conn, &config, &request).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_paid_booking_cannot_start_payment() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "razorpay");
        queries::mark_booking_paid(&conn, "bk-1", "pay_123", GatewayName::Razorpay).unwrap();

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::Razorpay,
        };
        let err = create_payment(&conn, &config, &request).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_new_attempt_resets_failed_payment() {
        let conn = setup_db();
        let config = test_config();
        seed_booking(&conn, "bk-1");
        enable_gateway(&conn, "razorpay");

        let fail = FailPaymentRequest {
            booking_id: "bk-1".to_string(),
            reason: Some("card declined".to_string()),
        };
        fail_payment(&conn, &fail).unwrap();
        let booking = queries::get_booking_by_id(&conn, "bk-1").unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Failed);
        assert_eq!(booking.status, BookingStatus::Pending);

        let request = CreatePaymentRequest {
            booking_id: "bk-1".to_string(),
            gateway: GatewayName::Razorpay,
        };
        create_payment(&conn, &config, &request).unwrap();
        let booking = queries::get_booking_by_id(&conn, "bk-1").unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_completed_payment_cannot_fail() {
        let conn = setup_db();
        seed_booking(&conn, "bk-1");
        queries::mark_booking_paid(&conn, "bk-1", "pay_123", GatewayName::Razorpay).unwrap();

        let request = FailPaymentRequest {
            booking_id: "bk-1".to_string(),
            reason: None,
        };
        let err = fail_payment(&conn, &request).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let booking = queries::get_booking_by_id(&conn, "bk-1").unwrap().unwrap();
        assert_eq!(booking.payment_status, PaymentStatus::Completed);
    }
}
