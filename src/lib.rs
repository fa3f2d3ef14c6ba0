//! RainbowPay Payment and Refund Orchestration Service
//!
//! Payment intents, gateway integration, webhook-driven confirmation,
//! receipt review, and refund orchestration for the RainbowBridge
//! pet-cremation marketplace.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::bookings;
pub use modules::gateways;
pub use modules::payments;
pub use modules::receipts;
pub use modules::refunds;
