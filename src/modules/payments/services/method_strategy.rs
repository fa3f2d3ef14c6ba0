use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::redirect::RedirectPolicy;
use crate::core::{AppError, Currency, Result};
use crate::modules::bookings::Booking;
use crate::modules::gateways::{
    CreateRefundRequest, CreateSourceRequest, ProviderGateway, RefundReason,
};
use crate::modules::payments::models::{
    PaymentMethod, PaymentTransaction, Provider,
};

/// Customer details forwarded to the gateway as billing information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Payment intent creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: i64,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Result of executing a refund through a method's strategy
#[derive(Debug, Clone)]
pub struct RefundExecution {
    pub provider: Provider,
    pub provider_reference: String,
}

/// Per-method payment behavior: how an intent is opened and how a settled
/// payment is reversed.
///
/// Adding a payment method means registering one more strategy; the
/// creator and the refund orchestrator dispatch through the registry and
/// never branch on the method themselves.
#[async_trait]
pub trait PaymentMethodStrategy: Send + Sync {
    fn method(&self) -> PaymentMethod;

    /// Build the (unsaved) transaction opening a payment intent
    async fn open_intent(
        &self,
        booking: &Booking,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentTransaction>;

    /// Reverse a settled payment, returning the provider reference to ledger
    async fn execute_refund(
        &self,
        booking: &Booking,
        transaction: &PaymentTransaction,
        reason: RefundReason,
        notes: Option<&str>,
    ) -> Result<RefundExecution>;
}

/// Lookup table of strategies keyed by payment method
pub struct PaymentMethodRegistry {
    strategies: HashMap<PaymentMethod, Arc<dyn PaymentMethodStrategy>>,
}

impl PaymentMethodRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn register(&mut self, strategy: Arc<dyn PaymentMethodStrategy>) {
        self.strategies.insert(strategy.method(), strategy);
    }

    pub fn get(&self, method: PaymentMethod) -> Result<Arc<dyn PaymentMethodStrategy>> {
        self.strategies
            .get(&method)
            .cloned()
            .ok_or_else(|| AppError::unsupported(method.to_string()))
    }
}

impl Default for PaymentMethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Cash is settled in person; the transaction stays pending until staff
/// confirm it outside this subsystem, and reversing it is a drawer matter,
/// not a ledger operation this service performs.
pub struct CashStrategy;

#[async_trait]
impl PaymentMethodStrategy for CashStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }

    async fn open_intent(
        &self,
        _booking: &Booking,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentTransaction> {
        PaymentTransaction::new(
            request.booking_id,
            request.amount,
            request.currency,
            PaymentMethod::Cash,
            Provider::Manual,
        )
    }

    async fn execute_refund(
        &self,
        _booking: &Booking,
        _transaction: &PaymentTransaction,
        _reason: RefundReason,
        _notes: Option<&str>,
    ) -> Result<RefundExecution> {
        Err(AppError::unsupported(
            "cash payments are refunded at the counter, not through this service",
        ))
    }
}

/// GCash runs through the gateway: intent creation opens a source and
/// returns its checkout URL; refunds go back through the gateway.
pub struct GcashStrategy {
    gateway: Arc<dyn ProviderGateway>,
    redirects: RedirectPolicy,
}

impl GcashStrategy {
    pub fn new(gateway: Arc<dyn ProviderGateway>, redirects: RedirectPolicy) -> Self {
        Self { gateway, redirects }
    }
}

#[async_trait]
impl PaymentMethodStrategy for GcashStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Gcash
    }

    async fn open_intent(
        &self,
        booking: &Booking,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentTransaction> {
        let amount_minor = request
            .currency
            .to_minor_units(request.amount)
            .map_err(AppError::validation)?;

        let urls = self
            .redirects
            .resolve(request.return_url.as_deref(), request.cancel_url.as_deref());

        let source = self
            .gateway
            .create_source(CreateSourceRequest {
                amount_minor,
                currency: request.currency.to_string(),
                source_type: "gcash".to_string(),
                success_url: urls.success_url.clone(),
                failure_url: urls.failure_url,
                billing_name: request.customer.name.clone(),
                billing_email: request.customer.email.clone(),
                billing_phone: request.customer.phone.clone(),
                description: format!("Booking #{} cremation service payment", booking.id),
            })
            .await?;

        let mut transaction = PaymentTransaction::new(
            request.booking_id,
            request.amount,
            request.currency,
            PaymentMethod::Gcash,
            Provider::Paymongo,
        )?;
        transaction.source_id = Some(source.id);
        transaction.checkout_url = Some(source.checkout_url);
        transaction.return_url = Some(urls.success_url);

        Ok(transaction)
    }

    async fn execute_refund(
        &self,
        _booking: &Booking,
        transaction: &PaymentTransaction,
        reason: RefundReason,
        notes: Option<&str>,
    ) -> Result<RefundExecution> {
        let payment_id = transaction.gateway_reference().ok_or_else(|| {
            AppError::data_integrity(format!(
                "Transaction '{}' has no gateway reference to refund against",
                transaction.id
            ))
        })?;

        let amount_minor = transaction
            .currency
            .to_minor_units(transaction.amount)
            .map_err(AppError::data_integrity)?;

        let refund = self
            .gateway
            .create_refund(CreateRefundRequest {
                payment_id: payment_id.to_string(),
                amount_minor,
                reason,
                notes: notes.map(str::to_string),
            })
            .await?;

        Ok(RefundExecution {
            provider: Provider::Paymongo,
            provider_reference: refund.id,
        })
    }
}

/// QR/manual transfers never pass through this creator: the intent opens
/// when the customer uploads a receipt. Refunds are ledger-only because the
/// gateway never custodied the money.
pub struct QrManualStrategy;

#[async_trait]
impl PaymentMethodStrategy for QrManualStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::QrManual
    }

    async fn open_intent(
        &self,
        _booking: &Booking,
        _request: &CreatePaymentRequest,
    ) -> Result<PaymentTransaction> {
        Err(AppError::validation(
            "qr_manual payments are opened by uploading a receipt, not by creating an intent",
        ))
    }

    async fn execute_refund(
        &self,
        _booking: &Booking,
        _transaction: &PaymentTransaction,
        _reason: RefundReason,
        _notes: Option<&str>,
    ) -> Result<RefundExecution> {
        Ok(RefundExecution {
            provider: Provider::Manual,
            provider_reference: format!("manual-refund-{}", uuid::Uuid::new_v4()),
        })
    }
}
