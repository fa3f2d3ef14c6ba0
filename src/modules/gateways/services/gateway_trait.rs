use crate::core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Thin boundary over the external payment processor.
///
/// No business rules live here: callers decide when to create sources and
/// refunds and how to react to failures. Implementations raise
/// `AppError::Gateway` on any non-2xx response.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Create a payment source and return its checkout URL
    async fn create_source(&self, request: CreateSourceRequest) -> Result<Source>;

    /// Create a refund against a previously settled payment
    async fn create_refund(&self, request: CreateRefundRequest) -> Result<GatewayRefund>;

    /// Gateway name for logging and provider tagging
    fn name(&self) -> &str;
}

/// Source creation request (amount already converted to integer minor units)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSourceRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub source_type: String,
    pub success_url: String,
    pub failure_url: String,
    pub billing_name: Option<String>,
    pub billing_email: Option<String>,
    pub billing_phone: Option<String>,
    pub description: String,
}

/// Provider-side payment intent precursor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub checkout_url: String,
}

/// Refund reasons the provider accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    Duplicate,
    Fraudulent,
    RequestedByCustomer,
    Others,
}

impl RefundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundReason::Duplicate => "duplicate",
            RefundReason::Fraudulent => "fraudulent",
            RefundReason::RequestedByCustomer => "requested_by_customer",
            RefundReason::Others => "others",
        }
    }
}

/// Refund creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRefundRequest {
    pub payment_id: String,
    pub amount_minor: i64,
    pub reason: RefundReason,
    pub notes: Option<String>,
}

/// Provider refund reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
}
