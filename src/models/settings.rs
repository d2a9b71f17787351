use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContent {
    pub id: String,
    pub section: String,
    pub title: String,
    pub body: String,
    pub position: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub url: String,
    pub position: i64,
    pub visible: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body_html: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    Confirmation,
    Reminder,
    Cancellation,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Confirmation => "confirmation",
            EmailKind::Reminder => "reminder",
            EmailKind::Cancellation => "cancellation",
        }
    }

    /// Name of the template row backing this email kind.
    pub fn template_name(&self) -> &'static str {
        match self {
            EmailKind::Confirmation => "booking_confirmation",
            EmailKind::Reminder => "booking_reminder",
            EmailKind::Cancellation => "booking_cancellation",
        }
    }
}
