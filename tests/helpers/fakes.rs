//! In-memory doubles for the repository and gateway boundaries.
//!
//! The fakes mirror the SQL guards of the real implementations: terminal
//! transactions refuse further transitions and mark_refunded only moves a
//! succeeded row, so the scenario tests exercise the same idempotence the
//! database enforces.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use rainbowpay::core::{AppError, Currency, Result};
use rainbowpay::modules::bookings::{
    Booking, BookingPaymentStatus, BookingRepository, BookingStatus,
};
use rainbowpay::modules::gateways::{
    CreateRefundRequest, CreateSourceRequest, GatewayRefund, ProviderGateway, Source,
};
use rainbowpay::modules::notifications::{NotificationDispatcher, NotificationKind};
use rainbowpay::modules::payments::models::{PaymentTransaction, TransactionStatus};
use rainbowpay::modules::payments::repositories::TransactionRepository;
use rainbowpay::modules::receipts::models::{PaymentReceipt, ReceiptStatus};
use rainbowpay::modules::receipts::repositories::ReceiptRepository;
use rainbowpay::modules::refunds::models::{Refund, RefundStatus, RefundType};
use rainbowpay::modules::refunds::repositories::RefundRepository;

pub fn booking(id: i64, payment_method: &str, payment_status: BookingPaymentStatus) -> Booking {
    let now = Utc::now();
    Booking {
        id,
        user_id: 100 + id,
        amount: Decimal::new(350000, 2),
        currency: Currency::PHP,
        payment_method: payment_method.to_string(),
        payment_status,
        status: BookingStatus::Confirmed,
        cancellation_reason: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<HashMap<i64, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn with(bookings: Vec<Booking>) -> Self {
        Self {
            bookings: Mutex::new(bookings.into_iter().map(|b| (b.id, b)).collect()),
        }
    }

    pub fn get(&self, id: i64) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn set_payment_status(&self, id: i64, status: BookingPaymentStatus) -> Result<()> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", id)))?;
        booking.payment_status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn claim_refund(&self, id: i64) -> Result<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.payment_status == BookingPaymentStatus::Paid => {
                b.payment_status = BookingPaymentStatus::Refunded;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel(
        &self,
        id: i64,
        reason: &str,
        payment_status: BookingPaymentStatus,
    ) -> Result<()> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", id)))?;
        booking.status = BookingStatus::Cancelled;
        booking.payment_status = payment_status;
        booking.cancellation_reason = Some(reason.to_string());
        booking.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    transactions: Mutex<Vec<PaymentTransaction>>,
}

impl InMemoryTransactionRepository {
    pub fn with(transactions: Vec<PaymentTransaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
        }
    }

    pub fn all(&self) -> Vec<PaymentTransaction> {
        self.transactions.lock().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<PaymentTransaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: &PaymentTransaction) -> Result<()> {
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentTransaction>> {
        Ok(self.get(id))
    }

    async fn find_by_source_id(&self, source_id: &str) -> Result<Option<PaymentTransaction>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.source_id.as_deref() == Some(source_id))
            .cloned())
    }

    async fn find_succeeded_by_booking(
        &self,
        booking_id: i64,
    ) -> Result<Option<PaymentTransaction>> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.booking_id == booking_id && t.status == TransactionStatus::Succeeded)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn transition_status(
        &self,
        id: &str,
        status: TransactionStatus,
        failure_reason: Option<&str>,
    ) -> Result<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        match transactions.iter_mut().find(|t| t.id == id) {
            Some(t) if !t.status.is_terminal() => {
                t.status = status;
                t.failure_reason = failure_reason.map(str::to_string);
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_refunded(&self, id: &str) -> Result<bool> {
        let mut transactions = self.transactions.lock().unwrap();
        match transactions.iter_mut().find(|t| t.id == id) {
            Some(t) if t.status == TransactionStatus::Succeeded => {
                t.status = TransactionStatus::Refunded;
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_provider_transaction_id(&self, id: &str, provider_id: &str) -> Result<()> {
        let mut transactions = self.transactions.lock().unwrap();
        let t = transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::not_found(format!("Transaction '{}' not found", id)))?;
        t.provider_transaction_id = Some(provider_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRefundRepository {
    refunds: Mutex<Vec<Refund>>,
}

impl InMemoryRefundRepository {
    pub fn with(refunds: Vec<Refund>) -> Self {
        Self {
            refunds: Mutex::new(refunds),
        }
    }

    pub fn all(&self) -> Vec<Refund> {
        self.refunds.lock().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<Refund> {
        self.refunds
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

#[async_trait]
impl RefundRepository for InMemoryRefundRepository {
    async fn insert(&self, refund: &Refund) -> Result<()> {
        self.refunds.lock().unwrap().push(refund.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Refund>> {
        Ok(self.get(id))
    }

    async fn find_completed_by_booking(&self, booking_id: i64) -> Result<Option<Refund>> {
        Ok(self
            .refunds
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.booking_id == booking_id && r.status == RefundStatus::Completed)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn complete(
        &self,
        id: &str,
        refund_type: RefundType,
        provider_reference: &str,
        notes: Option<&str>,
    ) -> Result<bool> {
        let mut refunds = self.refunds.lock().unwrap();
        match refunds.iter_mut().find(|r| r.id == id) {
            Some(refund) if refund.status != RefundStatus::Completed => {
                refund.status = RefundStatus::Completed;
                refund.refund_type = refund_type;
                refund.provider_reference = Some(provider_reference.to_string());
                if let Some(notes) = notes {
                    refund.notes = Some(notes.to_string());
                }
                refund.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryReceiptRepository {
    receipts: Mutex<Vec<PaymentReceipt>>,
}

impl InMemoryReceiptRepository {
    pub fn with(receipts: Vec<PaymentReceipt>) -> Self {
        Self {
            receipts: Mutex::new(receipts),
        }
    }

    pub fn get(&self, id: &str) -> Option<PaymentReceipt> {
        self.receipts
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

#[async_trait]
impl ReceiptRepository for InMemoryReceiptRepository {
    async fn insert(&self, receipt: &PaymentReceipt) -> Result<()> {
        self.receipts.lock().unwrap().push(receipt.clone());
        Ok(())
    }

    async fn find_latest_by_booking(&self, booking_id: i64) -> Result<Option<PaymentReceipt>> {
        Ok(self
            .receipts
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.booking_id == booking_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn mark_confirmed(&self, id: &str, confirmed_by: i64) -> Result<()> {
        let mut receipts = self.receipts.lock().unwrap();
        let receipt = receipts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("Receipt '{}' not found", id)))?;
        receipt.status = ReceiptStatus::Confirmed;
        receipt.confirmed_by = Some(confirmed_by);
        receipt.confirmed_at = Some(Utc::now());
        receipt.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_rejected(&self, id: &str, rejected_by: i64, reason: &str) -> Result<()> {
        let mut receipts = self.receipts.lock().unwrap();
        let receipt = receipts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("Receipt '{}' not found", id)))?;
        receipt.status = ReceiptStatus::Rejected;
        receipt.confirmed_by = Some(rejected_by);
        receipt.rejection_reason = Some(reason.to_string());
        receipt.updated_at = Utc::now();
        Ok(())
    }
}

/// Notifier that records every dispatch, optionally failing all of them
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(i64, NotificationKind)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn sent(&self) -> Vec<(i64, NotificationKind)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn create_payment_notification(
        &self,
        booking_id: i64,
        kind: NotificationKind,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("notification service down"));
        }
        self.sent.lock().unwrap().push((booking_id, kind));
        Ok(())
    }
}

/// Scripted gateway recording source and refund calls
#[derive(Default)]
pub struct FakeGateway {
    pub sources: Mutex<Vec<CreateSourceRequest>>,
    pub refunds: Mutex<Vec<CreateRefundRequest>>,
    pub fail_refunds: AtomicBool,
    pub fail_sources: AtomicBool,
}

impl FakeGateway {
    pub fn with_failing_refunds() -> Self {
        Self {
            fail_refunds: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn refund_calls(&self) -> Vec<CreateRefundRequest> {
        self.refunds.lock().unwrap().clone()
    }

    pub fn source_calls(&self) -> Vec<CreateSourceRequest> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderGateway for FakeGateway {
    async fn create_source(&self, request: CreateSourceRequest) -> Result<Source> {
        if self.fail_sources.load(Ordering::SeqCst) {
            return Err(AppError::gateway("source creation rejected"));
        }
        let n = {
            let mut sources = self.sources.lock().unwrap();
            sources.push(request);
            sources.len()
        };
        Ok(Source {
            id: format!("src_test_{}", n),
            checkout_url: format!("https://checkout.test/{}", n),
        })
    }

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<GatewayRefund> {
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(AppError::gateway("refund rejected by provider"));
        }
        let n = {
            let mut refunds = self.refunds.lock().unwrap();
            refunds.push(request);
            refunds.len()
        };
        Ok(GatewayRefund {
            id: format!("ref_test_{}", n),
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}
