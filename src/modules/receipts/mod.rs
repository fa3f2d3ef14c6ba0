pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{PaymentReceipt, ReceiptStatus};
pub use services::ReceiptConfirmationWorkflow;
