pub mod booking;

pub use booking::{is_offline_transfer_method, Booking, BookingPaymentStatus, BookingStatus};
