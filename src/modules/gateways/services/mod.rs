pub mod gateway_trait;
pub mod paymongo;

pub use gateway_trait::{
    CreateRefundRequest, CreateSourceRequest, GatewayRefund, ProviderGateway, RefundReason, Source,
};
pub use paymongo::PaymongoGateway;
