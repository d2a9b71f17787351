use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, EmailKind};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub message: String,
    pub booking_reference: String,
}

/// Renders and sends one of the booking emails. The template row can be
/// edited (or switched off) from the admin panel; a missing row falls back
/// to the built-in default.
pub async fn send_booking_email(
    state: &AppState,
    booking_id: &str,
    kind: EmailKind,
) -> Result<EmailOutcome, AppError> {
    let (to, subject, body, reference) = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking_by_id(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;
        let to = booking.customer_email.clone().ok_or_else(|| {
            AppError::Validation("booking has no customer email on file".to_string())
        })?;

        let (subject, body) = match queries::get_email_template(&db, kind.template_name())? {
            Some(template) if template.enabled => (template.subject, template.body_html),
            Some(_) => {
                return Ok(EmailOutcome {
                    success: false,
                    message: "email template is disabled".to_string(),
                    booking_reference: booking.reference,
                });
            }
            None => {
                let (subject, body) = default_template(kind);
                (subject.to_string(), body.to_string())
            }
        };

        (
            to,
            render(&subject, &booking),
            render(&body, &booking),
            booking.reference,
        )
    };

    state
        .mailer
        .send(&to, &subject, &body)
        .await
        .map_err(|e| AppError::Mail(e.to_string()))?;

    tracing::info!(reference = %reference, kind = kind.as_str(), "booking email sent");

    Ok(EmailOutcome {
        success: true,
        message: "email sent".to_string(),
        booking_reference: reference,
    })
}

fn render(template: &str, booking: &Booking) -> String {
    let travel_date = booking
        .travel_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "to be confirmed".to_string());

    template
        .replace("{{reference}}", &booking.reference)
        .replace("{{customer_name}}", &booking.customer_name)
        .replace("{{service_type}}", booking.service_type.as_str())
        .replace("{{travel_date}}", &travel_date)
        .replace("{{final_amount}}", &format!("{:.2}", booking.final_amount))
        .replace("{{currency}}", &booking.currency)
}

fn default_template(kind: EmailKind) -> (&'static str, &'static str) {
    match kind {
        EmailKind::Confirmation => (
            "Your booking {{reference}} is confirmed",
            "<p>Dear {{customer_name}},</p>\
             <p>Your {{service_type}} booking <strong>{{reference}}</strong> is confirmed \
             for {{travel_date}}.</p>\
             <p>Amount paid: {{currency}} {{final_amount}}.</p>",
        ),
        EmailKind::Reminder => (
            "Reminder: booking {{reference}} on {{travel_date}}",
            "<p>Dear {{customer_name}},</p>\
             <p>This is a reminder for your {{service_type}} booking \
             <strong>{{reference}}</strong> on {{travel_date}}.</p>",
        ),
        EmailKind::Cancellation => (
            "Your booking {{reference}} has been cancelled",
            "<p>Dear {{customer_name}},</p>\
             <p>Your {{service_type}} booking <strong>{{reference}}</strong> has been \
             cancelled. If this was unexpected, please contact us.</p>",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use crate::models::{BookingStatus, PaymentStatus, ServiceType};

    fn make_booking() -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: "bk-1".to_string(),
            reference: "SFR-AB12CD34".to_string(),
            service_type: ServiceType::Tour,
            service_id: "svc-1".to_string(),
            customer_name: "Asha Verma".to_string(),
            customer_email: Some("asha@example.com".to_string()),
            customer_phone: None,
            adults: 2,
            children: 0,
            infants: 0,
            travel_date: NaiveDate::from_ymd_opt(2026, 10, 2),
            time_slot: None,
            pickup_location: None,
            special_requests: None,
            base_amount: 2500.0,
            discount_amount: 250.0,
            final_amount: 2250.0,
            currency: "INR".to_string(),
            promo_code: Some("SAVE10".to_string()),
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Completed,
            payment_method: None,
            payment_reference: None,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let booking = make_booking();
        let out = render(
            "{{customer_name}} booked {{service_type}} {{reference}} for {{currency}} {{final_amount}} on {{travel_date}}",
            &booking,
        );
        assert_eq!(
            out,
            "Asha Verma booked tour SFR-AB12CD34 for INR 2250.00 on 2026-10-02"
        );
    }

    #[test]
    fn test_render_without_travel_date() {
        let mut booking = make_booking();
        booking.travel_date = None;
        let out = render("{{travel_date}}", &booking);
        assert_eq!(out, "to be confirmed");
    }

    #[test]
    fn test_default_templates_cover_every_kind() {
        for kind in [
            EmailKind::Confirmation,
            EmailKind::Reminder,
            EmailKind::Cancellation,
        ] {
            let (subject, body) = default_template(kind);
            assert!(subject.contains("{{reference}}"));
            assert!(body.contains("{{customer_name}}"));
        }
    }
}
