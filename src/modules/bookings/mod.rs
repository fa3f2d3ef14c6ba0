pub mod models;
pub mod repositories;

pub use models::{is_offline_transfer_method, Booking, BookingPaymentStatus, BookingStatus};
pub use repositories::{BookingRepository, MySqlBookingRepository};
