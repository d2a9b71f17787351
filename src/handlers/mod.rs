pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod health;
pub mod payments;
pub mod settings;
