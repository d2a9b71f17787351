use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, DiscountType, EmailTemplate, GatewayConfig, GatewayName, MenuItem,
    PaymentStatus, PromoCode, Service, ServiceType, SiteContent,
};

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

fn fmt_timestamp(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FMT).to_string()
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Services ──

pub fn upsert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, service_type, title, description, price_adult, price_child, price_infant, currency, duration, image_url, active, featured, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(id) DO UPDATE SET
           service_type = excluded.service_type,
           title = excluded.title,
           description = excluded.description,
           price_adult = excluded.price_adult,
           price_child = excluded.price_child,
           price_infant = excluded.price_infant,
           currency = excluded.currency,
           duration = excluded.duration,
           image_url = excluded.image_url,
           active = excluded.active,
           featured = excluded.featured,
           updated_at = excluded.updated_at",
        params![
            service.id,
            service.service_type.as_str(),
            service.title,
            service.description,
            service.price_adult,
            service.price_child,
            service.price_infant,
            service.currency,
            service.duration,
            service.image_url,
            service.active as i32,
            service.featured as i32,
            fmt_timestamp(&service.created_at),
            fmt_timestamp(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, service_type, title, description, price_adult, price_child, price_infant, currency, duration, image_url, active, featured, created_at, updated_at
         FROM services WHERE id = ?1",
        params![id],
        |row| Ok(parse_service_row(row)),
    );

    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_services(
    conn: &Connection,
    type_filter: Option<ServiceType>,
    featured_only: bool,
    include_inactive: bool,
) -> anyhow::Result<Vec<Service>> {
    let mut sql = String::from(
        "SELECT id, service_type, title, description, price_adult, price_child, price_infant, currency, duration, image_url, active, featured, created_at, updated_at
         FROM services WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if !include_inactive {
        sql.push_str(" AND active = 1");
    }
    if let Some(service_type) = type_filter {
        params_vec.push(Box::new(service_type.as_str().to_string()));
        sql.push_str(&format!(" AND service_type = ?{}", params_vec.len()));
    }
    if featured_only {
        sql.push_str(" AND featured = 1");
    }
    sql.push_str(" ORDER BY title ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let type_str: String = row.get(1)?;
    let service_type = ServiceType::parse(&type_str)
        .ok_or_else(|| anyhow::anyhow!("unknown service type in database: {type_str}"))?;
    let created_at_str: String = row.get(12)?;
    let updated_at_str: String = row.get(13)?;

    Ok(Service {
        id: row.get(0)?,
        service_type,
        title: row.get(2)?,
        description: row.get(3)?,
        price_adult: row.get(4)?,
        price_child: row.get(5)?,
        price_infant: row.get(6)?,
        currency: row.get(7)?,
        duration: row.get(8)?,
        image_url: row.get(9)?,
        active: row.get::<_, i32>(10)? != 0,
        featured: row.get::<_, i32>(11)? != 0,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

// ── Bookings ──

/// Inserts a booking. When the booking carries an idempotency key that was
/// already used, no row is written and 0 is returned; callers re-read the
/// original row by key.
pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<usize> {
    let count = conn.execute(
        "INSERT INTO bookings (id, reference, service_type, service_id, customer_name, customer_email, customer_phone,
                               adults, children, infants, travel_date, time_slot, pickup_location, special_requests,
                               base_amount, discount_amount, final_amount, currency, promo_code,
                               status, payment_status, payment_method, payment_reference, idempotency_key,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)
         ON CONFLICT(idempotency_key) DO NOTHING",
        params![
            booking.id,
            booking.reference,
            booking.service_type.as_str(),
            booking.service_id,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.adults,
            booking.children,
            booking.infants,
            booking.travel_date.map(|d| d.format(DATE_FMT).to_string()),
            booking.time_slot,
            booking.pickup_location,
            booking.special_requests,
            booking.base_amount,
            booking.discount_amount,
            booking.final_amount,
            booking.currency,
            booking.promo_code,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.payment_method.map(|m| m.as_str()),
            booking.payment_reference,
            booking.idempotency_key,
            fmt_timestamp(&booking.created_at),
            fmt_timestamp(&booking.updated_at),
        ],
    )?;
    Ok(count)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    fetch_booking(conn, "id", id)
}

pub fn get_booking_by_reference(
    conn: &Connection,
    reference: &str,
) -> anyhow::Result<Option<Booking>> {
    fetch_booking(conn, "reference", reference)
}

pub fn get_booking_by_idempotency_key(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<Booking>> {
    fetch_booking(conn, "idempotency_key", key)
}

fn fetch_booking(conn: &Connection, column: &str, value: &str) -> anyhow::Result<Option<Booking>> {
    // column is a compile-time constant from the wrappers above, never user input
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE {column} = ?1");
    let result = conn.query_row(&sql, params![value], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const BOOKING_COLUMNS: &str = "id, reference, service_type, service_id, customer_name, customer_email, customer_phone, \
     adults, children, infants, travel_date, time_slot, pickup_location, special_requests, \
     base_amount, discount_amount, final_amount, currency, promo_code, \
     status, payment_status, payment_method, payment_reference, idempotency_key, created_at, updated_at";

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Records which gateway the customer dispatched to. A previous failed
/// attempt goes back to pending so the new attempt starts clean.
pub fn set_payment_dispatched(
    conn: &Connection,
    id: &str,
    method: GatewayName,
) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_method = ?1,
                payment_status = CASE WHEN payment_status = 'failed' THEN 'pending' ELSE payment_status END,
                updated_at = ?2
         WHERE id = ?3",
        params![method.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn mark_booking_paid(
    conn: &Connection,
    id: &str,
    payment_reference: &str,
    method: GatewayName,
) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_status = 'completed', status = 'confirmed',
                payment_reference = ?1, payment_method = ?2, updated_at = ?3
         WHERE id = ?4",
        params![payment_reference, method.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Completed payments never transition back to failed.
pub fn mark_payment_failed(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_status = 'failed', updated_at = ?1
         WHERE id = ?2 AND payment_status != 'completed'",
        params![now, id],
    )?;
    Ok(count > 0)
}

pub struct BookingStats {
    pub total_bookings: i64,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    pub completed_payments: i64,
    pub total_revenue: f64,
}

pub fn get_booking_stats(conn: &Connection) -> anyhow::Result<BookingStats> {
    let total_bookings: i64 =
        conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    let pending_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    let confirmed_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE status = 'confirmed'",
        [],
        |row| row.get(0),
    )?;
    let completed_payments: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE payment_status = 'completed'",
        [],
        |row| row.get(0),
    )?;
    let total_revenue: f64 = conn.query_row(
        "SELECT COALESCE(SUM(final_amount), 0) FROM bookings WHERE payment_status = 'completed'",
        [],
        |row| row.get(0),
    )?;

    Ok(BookingStats {
        total_bookings,
        pending_bookings,
        confirmed_bookings,
        completed_payments,
        total_revenue,
    })
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let type_str: String = row.get(2)?;
    let service_type = ServiceType::parse(&type_str)
        .ok_or_else(|| anyhow::anyhow!("unknown service type in database: {type_str}"))?;
    let travel_date_str: Option<String> = row.get(10)?;
    let status_str: String = row.get(19)?;
    let payment_status_str: String = row.get(20)?;
    let payment_method_str: Option<String> = row.get(21)?;
    let created_at_str: String = row.get(24)?;
    let updated_at_str: String = row.get(25)?;

    Ok(Booking {
        id: row.get(0)?,
        reference: row.get(1)?,
        service_type,
        service_id: row.get(3)?,
        customer_name: row.get(4)?,
        customer_email: row.get(5)?,
        customer_phone: row.get(6)?,
        adults: row.get(7)?,
        children: row.get(8)?,
        infants: row.get(9)?,
        travel_date: travel_date_str
            .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
        time_slot: row.get(11)?,
        pickup_location: row.get(12)?,
        special_requests: row.get(13)?,
        base_amount: row.get(14)?,
        discount_amount: row.get(15)?,
        final_amount: row.get(16)?,
        currency: row.get(17)?,
        promo_code: row.get(18)?,
        status: BookingStatus::parse(&status_str),
        payment_status: PaymentStatus::parse(&payment_status_str),
        payment_method: payment_method_str.as_deref().and_then(GatewayName::parse),
        payment_reference: row.get(22)?,
        idempotency_key: row.get(23)?,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

// ── Promo Codes ──

pub fn create_promo(conn: &Connection, promo: &PromoCode) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO promo_codes (id, code, discount_type, discount_value, valid_from, valid_until, max_uses, current_uses, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            promo.id,
            promo.code,
            promo.discount_type.as_str(),
            promo.discount_value,
            fmt_timestamp(&promo.valid_from),
            promo.valid_until.map(|dt| fmt_timestamp(&dt)),
            promo.max_uses,
            promo.current_uses,
            promo.active as i32,
            fmt_timestamp(&promo.created_at),
            fmt_timestamp(&promo.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_promo(conn: &Connection, promo: &PromoCode) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE promo_codes SET code = ?1, discount_type = ?2, discount_value = ?3,
                valid_from = ?4, valid_until = ?5, max_uses = ?6, active = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            promo.code,
            promo.discount_type.as_str(),
            promo.discount_value,
            fmt_timestamp(&promo.valid_from),
            promo.valid_until.map(|dt| fmt_timestamp(&dt)),
            promo.max_uses,
            promo.active as i32,
            now,
            promo.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_promo(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM promo_codes WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_promos(conn: &Connection) -> anyhow::Result<Vec<PromoCode>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, discount_type, discount_value, valid_from, valid_until, max_uses, current_uses, active, created_at, updated_at
         FROM promo_codes ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_promo_row(row)))?;

    let mut promos = vec![];
    for row in rows {
        promos.push(row??);
    }
    Ok(promos)
}

pub fn get_promo_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<PromoCode>> {
    let result = conn.query_row(
        "SELECT id, code, discount_type, discount_value, valid_from, valid_until, max_uses, current_uses, active, created_at, updated_at
         FROM promo_codes WHERE id = ?1",
        params![id],
        |row| Ok(parse_promo_row(row)),
    );

    match result {
        Ok(promo) => Ok(Some(promo?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// True when any promo row, active or not, already uses the code
/// (case-insensitive, the column collates NOCASE).
pub fn promo_code_taken(conn: &Connection, code: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM promo_codes WHERE code = ?1",
        params![code],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Case-insensitive lookup (the code column collates NOCASE). Inactive
/// codes are treated as absent.
pub fn find_promo_by_code(conn: &Connection, code: &str) -> anyhow::Result<Option<PromoCode>> {
    let result = conn.query_row(
        "SELECT id, code, discount_type, discount_value, valid_from, valid_until, max_uses, current_uses, active, created_at, updated_at
         FROM promo_codes WHERE code = ?1 AND active = 1",
        params![code],
        |row| Ok(parse_promo_row(row)),
    );

    match result {
        Ok(promo) => Ok(Some(promo?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Single conditional increment: the row changes only while the code is
/// still applicable, so the usage cap holds under concurrent redemption.
pub fn redeem_promo(conn: &Connection, id: &str, now: &NaiveDateTime) -> anyhow::Result<bool> {
    let now_str = fmt_timestamp(now);
    let count = conn.execute(
        "UPDATE promo_codes SET current_uses = current_uses + 1, updated_at = ?1
         WHERE id = ?2 AND active = 1
           AND valid_from <= ?1
           AND (valid_until IS NULL OR valid_until >= ?1)
           AND (max_uses IS NULL OR current_uses < max_uses)",
        params![now_str, id],
    )?;
    Ok(count > 0)
}

fn parse_promo_row(row: &rusqlite::Row) -> anyhow::Result<PromoCode> {
    let type_str: String = row.get(2)?;
    let discount_type = DiscountType::parse(&type_str)
        .ok_or_else(|| anyhow::anyhow!("unknown discount type in database: {type_str}"))?;
    let valid_from_str: String = row.get(4)?;
    let valid_until_str: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    Ok(PromoCode {
        id: row.get(0)?,
        code: row.get(1)?,
        discount_type,
        discount_value: row.get(3)?,
        valid_from: parse_timestamp(&valid_from_str),
        valid_until: valid_until_str.map(|s| parse_timestamp(&s)),
        max_uses: row.get(6)?,
        current_uses: row.get(7)?,
        active: row.get::<_, i32>(8)? != 0,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

// ── Payment Gateways ──

pub fn list_gateways(conn: &Connection, enabled_only: bool) -> anyhow::Result<Vec<GatewayConfig>> {
    let sql = if enabled_only {
        "SELECT name, display_name, enabled, test_mode, api_key, api_secret, config, priority
         FROM payment_gateways WHERE enabled = 1 ORDER BY priority ASC, name ASC"
    } else {
        "SELECT name, display_name, enabled, test_mode, api_key, api_secret, config, priority
         FROM payment_gateways ORDER BY priority ASC, name ASC"
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_gateway_row(row)))?;

    let mut gateways = vec![];
    for row in rows {
        gateways.push(row??);
    }
    Ok(gateways)
}

pub fn get_gateway(conn: &Connection, name: GatewayName) -> anyhow::Result<Option<GatewayConfig>> {
    let result = conn.query_row(
        "SELECT name, display_name, enabled, test_mode, api_key, api_secret, config, priority
         FROM payment_gateways WHERE name = ?1",
        params![name.as_str()],
        |row| Ok(parse_gateway_row(row)),
    );

    match result {
        Ok(gateway) => Ok(Some(gateway?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replaces the whole configured gateway set in one transaction: upsert
/// every supplied record by name, then drop names that were not supplied.
/// A failure anywhere rolls the previous set back untouched.
pub fn replace_gateway_set(
    conn: &mut Connection,
    gateways: &[GatewayConfig],
) -> anyhow::Result<()> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let tx = conn.transaction()?;

    for gateway in gateways {
        tx.execute(
            "INSERT INTO payment_gateways (name, display_name, enabled, test_mode, api_key, api_secret, config, priority, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(name) DO UPDATE SET
               display_name = excluded.display_name,
               enabled = excluded.enabled,
               test_mode = excluded.test_mode,
               api_key = excluded.api_key,
               api_secret = excluded.api_secret,
               config = excluded.config,
               priority = excluded.priority,
               updated_at = excluded.updated_at",
            params![
                gateway.name.as_str(),
                gateway.display_name,
                gateway.enabled as i32,
                gateway.test_mode as i32,
                gateway.api_key,
                gateway.api_secret,
                gateway.config.to_string(),
                gateway.priority,
                now,
            ],
        )?;
    }

    if gateways.is_empty() {
        tx.execute("DELETE FROM payment_gateways", [])?;
    } else {
        let placeholders: Vec<String> =
            (1..=gateways.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "DELETE FROM payment_gateways WHERE name NOT IN ({})",
            placeholders.join(", ")
        );
        let names: Vec<Box<dyn rusqlite::types::ToSql>> = gateways
            .iter()
            .map(|g| Box::new(g.name.as_str().to_string()) as Box<dyn rusqlite::types::ToSql>)
            .collect();
        let name_refs: Vec<&dyn rusqlite::types::ToSql> =
            names.iter().map(|p| p.as_ref()).collect();
        tx.execute(&sql, name_refs.as_slice())?;
    }

    tx.commit()?;
    Ok(())
}

fn parse_gateway_row(row: &rusqlite::Row) -> anyhow::Result<GatewayConfig> {
    let name_str: String = row.get(0)?;
    let name = GatewayName::parse(&name_str)
        .ok_or_else(|| anyhow::anyhow!("unknown gateway in database: {name_str}"))?;
    let config_str: String = row.get(6)?;

    Ok(GatewayConfig {
        name,
        display_name: row.get(1)?,
        enabled: row.get::<_, i32>(2)? != 0,
        test_mode: row.get::<_, i32>(3)? != 0,
        api_key: row.get(4)?,
        api_secret: row.get(5)?,
        config: serde_json::from_str(&config_str).unwrap_or(serde_json::json!({})),
        priority: row.get(7)?,
    })
}

// ── Site Content ──

pub fn list_site_content(conn: &Connection) -> anyhow::Result<Vec<SiteContent>> {
    let mut stmt = conn.prepare(
        "SELECT id, section, title, body, position, created_at, updated_at
         FROM site_content ORDER BY position ASC, created_at ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;
        Ok(SiteContent {
            id: row.get(0)?,
            section: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            position: row.get(4)?,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    })?;

    let mut content = vec![];
    for row in rows {
        content.push(row?);
    }
    Ok(content)
}

pub fn insert_site_content(conn: &Connection, record: &SiteContent) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO site_content (id, section, title, body, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id,
            record.section,
            record.title,
            record.body,
            record.position,
            fmt_timestamp(&record.created_at),
            fmt_timestamp(&record.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_site_content(conn: &Connection, record: &SiteContent) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE site_content SET section = ?1, title = ?2, body = ?3, position = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            record.section,
            record.title,
            record.body,
            record.position,
            now,
            record.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_site_content(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM site_content WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Menu Items ──

pub fn list_menu_items(conn: &Connection) -> anyhow::Result<Vec<MenuItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, url, position, visible, created_at, updated_at
         FROM menu_items ORDER BY position ASC, created_at ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;
        Ok(MenuItem {
            id: row.get(0)?,
            label: row.get(1)?,
            url: row.get(2)?,
            position: row.get(3)?,
            visible: row.get::<_, i32>(4)? != 0,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    })?;

    let mut items = vec![];
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

pub fn insert_menu_item(conn: &Connection, item: &MenuItem) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO menu_items (id, label, url, position, visible, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            item.id,
            item.label,
            item.url,
            item.position,
            item.visible as i32,
            fmt_timestamp(&item.created_at),
            fmt_timestamp(&item.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_menu_item(conn: &Connection, item: &MenuItem) -> anyhow::Result<bool> {
    let now = fmt_timestamp(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE menu_items SET label = ?1, url = ?2, position = ?3, visible = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            item.label,
            item.url,
            item.position,
            item.visible as i32,
            now,
            item.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_menu_item(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM menu_items WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Email Templates ──

pub fn list_email_templates(conn: &Connection) -> anyhow::Result<Vec<EmailTemplate>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, subject, body_html, enabled FROM email_templates ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(EmailTemplate {
            id: row.get(0)?,
            name: row.get(1)?,
            subject: row.get(2)?,
            body_html: row.get(3)?,
            enabled: row.get::<_, i32>(4)? != 0,
        })
    })?;

    let mut templates = vec![];
    for row in rows {
        templates.push(row?);
    }
    Ok(templates)
}

pub fn get_email_template(conn: &Connection, name: &str) -> anyhow::Result<Option<EmailTemplate>> {
    let result = conn.query_row(
        "SELECT id, name, subject, body_html, enabled FROM email_templates WHERE name = ?1",
        params![name],
        |row| {
            Ok(EmailTemplate {
                id: row.get(0)?,
                name: row.get(1)?,
                subject: row.get(2)?,
                body_html: row.get(3)?,
                enabled: row.get::<_, i32>(4)? != 0,
            })
        },
    );

    match result {
        Ok(template) => Ok(Some(template)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_email_template(conn: &Connection, template: &EmailTemplate) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO email_templates (id, name, subject, body_html, enabled)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            template.id,
            template.name,
            template.subject,
            template.body_html,
            template.enabled as i32,
        ],
    )?;
    Ok(())
}

pub fn update_email_template(conn: &Connection, template: &EmailTemplate) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE email_templates SET name = ?1, subject = ?2, body_html = ?3, enabled = ?4,
                updated_at = datetime('now')
         WHERE id = ?5",
        params![
            template.name,
            template.subject,
            template.body_html,
            template.enabled as i32,
            template.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_email_template(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM email_templates WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
