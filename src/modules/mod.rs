pub mod bookings;
pub mod gateways;
pub mod notifications;
pub mod payments;
pub mod receipts;
pub mod refunds;
