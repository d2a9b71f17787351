use serde::Serialize;

use crate::models::{DiscountType, PromoCode, Service};

/// Server-side price breakdown for a booking. Amounts are in major
/// currency units; use [`to_minor_units`] at the payment boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub base_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

pub fn base_total(service: &Service, adults: i64, children: i64, infants: i64) -> f64 {
    adults as f64 * service.price_adult
        + children as f64 * service.price_child
        + infants as f64 * service.price_infant
}

/// Discount a promo grants on the given base, clamped to `0 ≤ d ≤ base`.
pub fn discount_for(base: f64, promo: &PromoCode) -> f64 {
    if base <= 0.0 {
        return 0.0;
    }
    let raw = match promo.discount_type {
        DiscountType::Percentage => round2(base * promo.discount_value / 100.0),
        DiscountType::Fixed => promo.discount_value,
    };
    raw.clamp(0.0, base)
}

pub fn quote(
    service: &Service,
    adults: i64,
    children: i64,
    infants: i64,
    promo: Option<&PromoCode>,
) -> Quote {
    let base = base_total(service, adults, children, infants);
    let discount = promo.map(|p| discount_for(base, p)).unwrap_or(0.0);
    Quote {
        base_amount: base,
        discount_amount: discount,
        final_amount: round2(base - discount),
    }
}

/// Gateways bill in minor units (paise, cents).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::ServiceType;

    fn make_service(adult: f64, child: f64, infant: f64) -> Service {
        let now = Utc::now().naive_utc();
        Service {
            id: "svc-1".to_string(),
            service_type: ServiceType::Tour,
            title: "Desert Safari".to_string(),
            description: None,
            price_adult: adult,
            price_child: child,
            price_infant: infant,
            currency: "INR".to_string(),
            duration: None,
            image_url: None,
            active: true,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_promo(discount_type: DiscountType, value: f64) -> PromoCode {
        let now = Utc::now().naive_utc();
        PromoCode {
            id: "promo-1".to_string(),
            code: "SAVE10".to_string(),
            discount_type,
            discount_value: value,
            valid_from: now,
            valid_until: None,
            max_uses: None,
            current_uses: 0,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_base_total_weighted_sum() {
        let service = make_service(1000.0, 500.0, 0.0);
        assert_eq!(base_total(&service, 2, 1, 0), 2500.0);
        assert_eq!(base_total(&service, 2, 1, 3), 2500.0);
        assert_eq!(base_total(&service, 1, 0, 0), 1000.0);
    }

    #[test]
    fn test_percentage_discount() {
        let service = make_service(1000.0, 500.0, 0.0);
        let promo = make_promo(DiscountType::Percentage, 10.0);
        let quote = quote(&service, 2, 1, 0, Some(&promo));
        assert_eq!(quote.base_amount, 2500.0);
        assert_eq!(quote.discount_amount, 250.0);
        assert_eq!(quote.final_amount, 2250.0);
    }

    #[test]
    fn test_percentage_rounds_to_cents() {
        let promo = make_promo(DiscountType::Percentage, 12.5);
        // 999 * 12.5% = 124.875, rounds half away from zero
        let discount = discount_for(999.0, &promo);
        assert!((discount - 124.88).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_discount() {
        let service = make_service(1000.0, 500.0, 0.0);
        let promo = make_promo(DiscountType::Fixed, 300.0);
        let quote = quote(&service, 2, 1, 0, Some(&promo));
        assert_eq!(quote.discount_amount, 300.0);
        assert_eq!(quote.final_amount, 2200.0);
    }

    #[test]
    fn test_fixed_discount_clamps_at_base() {
        let service = make_service(1000.0, 500.0, 0.0);
        let promo = make_promo(DiscountType::Fixed, 5000.0);
        let quote = quote(&service, 2, 1, 0, Some(&promo));
        assert_eq!(quote.discount_amount, 2500.0);
        assert_eq!(quote.final_amount, 0.0);
    }

    #[test]
    fn test_negative_discount_value_clamps_to_zero() {
        let promo = make_promo(DiscountType::Fixed, -50.0);
        assert_eq!(discount_for(2500.0, &promo), 0.0);
    }

    #[test]
    fn test_no_promo_means_no_discount() {
        let service = make_service(750.0, 0.0, 0.0);
        let quote = quote(&service, 4, 0, 0, None);
        assert_eq!(quote.base_amount, 3000.0);
        assert_eq!(quote.discount_amount, 0.0);
        assert_eq!(quote.final_amount, 3000.0);
    }

    #[test]
    fn test_zero_base_stays_zero() {
        let service = make_service(0.0, 0.0, 0.0);
        let promo = make_promo(DiscountType::Percentage, 50.0);
        let quote = quote(&service, 1, 0, 0, Some(&promo));
        assert_eq!(quote.final_amount, 0.0);
        assert_eq!(quote.discount_amount, 0.0);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(2250.0), 225000);
        assert_eq!(to_minor_units(0.0), 0);
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(124.88), 12488);
    }
}
