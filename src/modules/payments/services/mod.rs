pub mod method_strategy;
pub mod payment_intent_service;
pub mod redirect;
pub mod webhook_processor;

pub use method_strategy::{
    CashStrategy, CreatePaymentRequest, CustomerInfo, GcashStrategy, PaymentMethodRegistry,
    PaymentMethodStrategy, QrManualStrategy, RefundExecution,
};
pub use payment_intent_service::{PaymentIntent, PaymentIntentService};
pub use redirect::{RedirectPolicy, RedirectUrls};
pub use webhook_processor::{map_provider_status, WebhookProcessor};
