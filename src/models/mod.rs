pub mod booking;
pub mod catalog;
pub mod gateway;
pub mod promo;
pub mod settings;

pub use booking::{Booking, BookingStatus, PaymentStatus, ServiceType};
pub use catalog::Service;
pub use gateway::{GatewayConfig, GatewayKind, GatewayName};
pub use promo::{DiscountType, PromoCode};
pub use settings::{EmailKind, EmailTemplate, MenuItem, SiteContent};
