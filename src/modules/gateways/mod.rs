pub mod services;

pub use services::{
    CreateRefundRequest, CreateSourceRequest, GatewayRefund, PaymongoGateway, ProviderGateway,
    RefundReason, Source,
};
