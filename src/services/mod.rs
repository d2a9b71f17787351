pub mod booking;
pub mod email;
pub mod mailer;
pub mod payment;
pub mod pricing;
pub mod promo;
