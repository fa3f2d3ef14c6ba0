pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{InitiatorType, Refund, RefundStatus, RefundType};
pub use services::{Initiator, RefundOrchestrator, RefundOutcome};
