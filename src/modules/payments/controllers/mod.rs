pub mod payment_controller;
pub mod webhook_controller;

pub use payment_controller::PaymentController;
pub use webhook_controller::{WebhookContext, WebhookController};
