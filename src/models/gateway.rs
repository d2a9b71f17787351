use serde::{Deserialize, Serialize};

/// The closed set of payment methods the platform knows how to dispatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GatewayName {
    Razorpay,
    Stripe,
    Paypal,
    Ccavenue,
    BankTransfer,
    CashOnArrival,
}

/// What selecting a gateway requires from the customer's browser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    HostedWidget,
    Redirect,
    Manual,
}

impl GatewayName {
    pub const ALL: [GatewayName; 6] = [
        GatewayName::Razorpay,
        GatewayName::Stripe,
        GatewayName::Paypal,
        GatewayName::Ccavenue,
        GatewayName::BankTransfer,
        GatewayName::CashOnArrival,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayName::Razorpay => "razorpay",
            GatewayName::Stripe => "stripe",
            GatewayName::Paypal => "paypal",
            GatewayName::Ccavenue => "ccavenue",
            GatewayName::BankTransfer => "bank_transfer",
            GatewayName::CashOnArrival => "cash_on_arrival",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "razorpay" => Some(GatewayName::Razorpay),
            "stripe" => Some(GatewayName::Stripe),
            "paypal" => Some(GatewayName::Paypal),
            "ccavenue" => Some(GatewayName::Ccavenue),
            "bank_transfer" => Some(GatewayName::BankTransfer),
            "cash_on_arrival" => Some(GatewayName::CashOnArrival),
            _ => None,
        }
    }

    /// Capability lookup: the single place the dispatch behavior per
    /// gateway is decided.
    pub fn kind(&self) -> GatewayKind {
        match self {
            GatewayName::Razorpay => GatewayKind::HostedWidget,
            GatewayName::Stripe | GatewayName::Paypal | GatewayName::Ccavenue => {
                GatewayKind::Redirect
            }
            GatewayName::BankTransfer | GatewayName::CashOnArrival => GatewayKind::Manual,
        }
    }
}

/// One configured payment method as stored by the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub name: GatewayName,
    pub display_name: String,
    pub enabled: bool,
    pub test_mode: bool,
    pub api_key: String,
    pub api_secret: String,
    pub config: serde_json::Value,
    pub priority: i64,
}
