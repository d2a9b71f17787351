use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::PromoCode;

/// Checks that a code is applicable right now, without consuming a use.
/// Lookup is case-insensitive; inactive codes read as absent.
pub fn validate(conn: &Connection, code: &str, now: &NaiveDateTime) -> Result<PromoCode, AppError> {
    let promo = queries::find_promo_by_code(conn, code)?
        .ok_or_else(|| AppError::NotFound("promo code not found".to_string()))?;

    if *now < promo.valid_from {
        return Err(AppError::PromoExpired);
    }
    if let Some(until) = promo.valid_until {
        if *now > until {
            return Err(AppError::PromoExpired);
        }
    }
    if let Some(max) = promo.max_uses {
        if promo.current_uses >= max {
            return Err(AppError::PromoLimitReached);
        }
    }

    Ok(promo)
}

/// Consumes one use of the code. The increment is a single conditional
/// UPDATE, so the usage cap holds even if two bookings race on the last
/// slot; when it affects no row we re-validate to report the exact reason.
pub fn redeem(conn: &Connection, code: &str, now: &NaiveDateTime) -> Result<PromoCode, AppError> {
    let promo = validate(conn, code, now)?;

    if queries::redeem_promo(conn, &promo.id, now)? {
        Ok(promo)
    } else {
        match validate(conn, code, now) {
            Ok(_) => Err(AppError::Conflict("promo code could not be applied".to_string())),
            Err(e) => Err(e),
        }
    }
}
