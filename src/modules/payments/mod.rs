pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{PaymentMethod, PaymentTransaction, Provider, TransactionStatus};
pub use services::{
    CreatePaymentRequest, PaymentIntent, PaymentIntentService, WebhookProcessor,
};
