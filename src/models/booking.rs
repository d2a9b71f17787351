use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::gateway::GatewayName;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Tour,
    Ticket,
    Visa,
    Package,
    Transfer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Tour => "tour",
            ServiceType::Ticket => "ticket",
            ServiceType::Visa => "visa",
            ServiceType::Package => "package",
            ServiceType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tour" => Some(ServiceType::Tour),
            "ticket" => Some(ServiceType::Ticket),
            "visa" => Some(ServiceType::Visa),
            "package" => Some(ServiceType::Package),
            "transfer" => Some(ServiceType::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub reference: String,
    pub service_type: ServiceType,
    pub service_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub adults: i64,
    pub children: i64,
    pub infants: i64,
    pub travel_date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub pickup_location: Option<String>,
    pub special_requests: Option<String>,
    pub base_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
    pub currency: String,
    pub promo_code: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<GatewayName>,
    pub payment_reference: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
