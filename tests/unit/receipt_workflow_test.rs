// Scenario tests for staff receipt review: confirmation, rejection with
// its compensating refund, and the degraded mode without a receipt store.

#[path = "../helpers/fakes.rs"]
mod fakes;

use std::sync::Arc;

use rust_decimal::Decimal;

use fakes::{
    booking, FakeGateway, InMemoryBookingRepository, InMemoryReceiptRepository,
    InMemoryRefundRepository, InMemoryTransactionRepository, RecordingNotifier,
};
use rainbowpay::core::{AppError, Currency};
use rainbowpay::modules::bookings::{BookingPaymentStatus, BookingStatus};
use rainbowpay::modules::notifications::NotificationKind;
use rainbowpay::modules::payments::models::{
    PaymentMethod, PaymentTransaction, Provider, TransactionStatus,
};
use rainbowpay::modules::payments::repositories::TransactionRepository;
use rainbowpay::modules::payments::services::{
    CashStrategy, GcashStrategy, PaymentMethodRegistry, QrManualStrategy, RedirectPolicy,
};
use rainbowpay::modules::receipts::models::{PaymentReceipt, ReceiptStatus};
use rainbowpay::modules::receipts::repositories::ReceiptRepository;
use rainbowpay::modules::receipts::services::{
    ReceiptConfirmationWorkflow, RECEIPT_REJECTED_REFUND_REASON,
};
use rainbowpay::modules::refunds::models::{InitiatorType, RefundStatus, RefundType};
use rainbowpay::modules::refunds::services::RefundOrchestrator;

struct Harness {
    bookings: Arc<InMemoryBookingRepository>,
    transactions: Arc<InMemoryTransactionRepository>,
    refunds: Arc<InMemoryRefundRepository>,
    receipts: Option<Arc<InMemoryReceiptRepository>>,
    notifier: Arc<RecordingNotifier>,
    workflow: ReceiptConfirmationWorkflow,
}

fn harness(
    bookings: Vec<rainbowpay::modules::bookings::Booking>,
    with_receipt_store: bool,
    notifier: RecordingNotifier,
) -> Harness {
    let bookings = Arc::new(InMemoryBookingRepository::with(bookings));
    let transactions = Arc::new(InMemoryTransactionRepository::default());
    let refunds = Arc::new(InMemoryRefundRepository::default());
    let notifier = Arc::new(notifier);
    let receipts = with_receipt_store.then(|| Arc::new(InMemoryReceiptRepository::default()));

    let redirects = RedirectPolicy::new(
        "https://app.rainbowbridge.ph",
        "/payments/success",
        "/payments/failed",
    )
    .unwrap();
    let mut registry = PaymentMethodRegistry::new();
    registry.register(Arc::new(CashStrategy));
    registry.register(Arc::new(GcashStrategy::new(
        Arc::new(FakeGateway::default()),
        redirects,
    )));
    registry.register(Arc::new(QrManualStrategy));

    let orchestrator = Arc::new(RefundOrchestrator::new(
        bookings.clone(),
        transactions.clone(),
        refunds.clone(),
        Arc::new(registry),
        notifier.clone(),
    ));

    let workflow = ReceiptConfirmationWorkflow::new(
        bookings.clone(),
        receipts
            .clone()
            .map(|r| r as Arc<dyn rainbowpay::modules::receipts::repositories::ReceiptRepository>),
        orchestrator,
        notifier.clone(),
    );

    Harness {
        bookings,
        transactions,
        refunds,
        receipts,
        notifier,
        workflow,
    }
}

async fn seed_receipt(h: &Harness, booking_id: i64) -> String {
    let receipt = PaymentReceipt::new(booking_id, 100 + booking_id, "receipts/proof.jpg".to_string());
    h.receipts.as_ref().unwrap().insert(&receipt).await.unwrap();
    receipt.id
}

async fn seed_succeeded_qr_transaction(h: &Harness, booking_id: i64) -> String {
    let mut tx = PaymentTransaction::new(
        booking_id,
        Decimal::new(350000, 2),
        Currency::PHP,
        PaymentMethod::QrManual,
        Provider::Manual,
    )
    .unwrap();
    tx.status = TransactionStatus::Succeeded;
    h.transactions.insert(&tx).await.unwrap();
    tx.id
}

#[tokio::test]
async fn test_submit_stores_receipt_and_parks_booking() {
    let h = harness(
        vec![booking(11, "qr_manual", BookingPaymentStatus::NotPaid)],
        true,
        RecordingNotifier::default(),
    );

    let outcome = h
        .workflow
        .submit(11, 111, "receipts/gcash-transfer.jpg")
        .await
        .unwrap();

    let receipt_id = outcome.receipt_id.unwrap();
    let receipt = h.receipts.as_ref().unwrap().get(&receipt_id).unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Awaiting);
    assert_eq!(receipt.user_id, 111);
    assert_eq!(receipt.receipt_path, "receipts/gcash-transfer.jpg");
    assert_eq!(
        h.bookings.get(11).unwrap().payment_status,
        BookingPaymentStatus::AwaitingPaymentConfirmation
    );
}

#[tokio::test]
async fn test_submit_is_rejected_for_gateway_methods() {
    // gateway-held money is confirmed by the provider webhook, not a receipt
    let h = harness(
        vec![booking(12, "gcash", BookingPaymentStatus::NotPaid)],
        true,
        RecordingNotifier::default(),
    );

    let err = h.workflow.submit(12, 112, "receipts/proof.jpg").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(
        h.bookings.get(12).unwrap().payment_status,
        BookingPaymentStatus::NotPaid
    );
}

#[tokio::test]
async fn test_submit_on_paid_booking_is_already_paid() {
    let h = harness(
        vec![booking(13, "qr_manual", BookingPaymentStatus::Paid)],
        true,
        RecordingNotifier::default(),
    );

    let err = h.workflow.submit(13, 113, "receipts/proof.jpg").await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyPaid(_)));
}

#[tokio::test]
async fn test_submit_degraded_mode_still_parks_booking() {
    let h = harness(
        vec![booking(14, "qr_manual", BookingPaymentStatus::NotPaid)],
        false,
        RecordingNotifier::default(),
    );

    let outcome = h.workflow.submit(14, 114, "receipts/proof.jpg").await.unwrap();

    assert!(outcome.receipt_id.is_none());
    assert_eq!(
        h.bookings.get(14).unwrap().payment_status,
        BookingPaymentStatus::AwaitingPaymentConfirmation
    );
}

#[tokio::test]
async fn test_confirm_marks_receipt_and_booking_paid() {
    let h = harness(
        vec![booking(1, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        true,
        RecordingNotifier::default(),
    );
    let receipt_id = seed_receipt(&h, 1).await;

    let outcome = h.workflow.confirm(1, 50).await.unwrap();

    assert_eq!(outcome.receipt_id.as_deref(), Some(receipt_id.as_str()));
    let receipt = h.receipts.as_ref().unwrap().get(&receipt_id).unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Confirmed);
    assert_eq!(receipt.confirmed_by, Some(50));
    assert!(receipt.confirmed_at.is_some());

    assert_eq!(
        h.bookings.get(1).unwrap().payment_status,
        BookingPaymentStatus::Paid
    );
    assert_eq!(h.notifier.sent(), vec![(1, NotificationKind::PaymentConfirmed)]);
}

#[tokio::test]
async fn test_confirm_without_receipt_is_not_found() {
    let h = harness(
        vec![booking(2, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        true,
        RecordingNotifier::default(),
    );

    let err = h.workflow.confirm(2, 50).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(
        h.bookings.get(2).unwrap().payment_status,
        BookingPaymentStatus::AwaitingPaymentConfirmation
    );
}

#[tokio::test]
async fn test_confirm_degraded_mode_updates_booking_directly() {
    let h = harness(
        vec![booking(3, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        false,
        RecordingNotifier::default(),
    );

    let outcome = h.workflow.confirm(3, 50).await.unwrap();

    assert!(outcome.receipt_id.is_none());
    assert_eq!(
        h.bookings.get(3).unwrap().payment_status,
        BookingPaymentStatus::Paid
    );
}

#[tokio::test]
async fn test_repeated_confirm_is_a_no_op() {
    let h = harness(
        vec![booking(4, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        true,
        RecordingNotifier::default(),
    );
    seed_receipt(&h, 4).await;

    h.workflow.confirm(4, 50).await.unwrap();
    h.workflow.confirm(4, 51).await.unwrap();

    // the second confirm changed nothing and announced nothing new
    assert_eq!(h.notifier.sent().len(), 1);
    let receipt = h
        .receipts
        .as_ref()
        .unwrap()
        .find_latest_by_booking(4)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(receipt.confirmed_by, Some(50));
}

#[tokio::test]
async fn test_reject_cancels_booking_and_parks_payment_state() {
    let h = harness(
        vec![booking(5, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        true,
        RecordingNotifier::default(),
    );
    let receipt_id = seed_receipt(&h, 5).await;

    let outcome = h.workflow.reject(5, 50, "Blurry screenshot").await.unwrap();

    let receipt = h.receipts.as_ref().unwrap().get(&receipt_id).unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Rejected);
    assert_eq!(receipt.rejection_reason.as_deref(), Some("Blurry screenshot"));

    let b = h.bookings.get(5).unwrap();
    assert_eq!(b.status, BookingStatus::Cancelled);
    assert_eq!(b.payment_status, BookingPaymentStatus::AwaitingPaymentConfirmation);
    assert_eq!(b.cancellation_reason.as_deref(), Some("Blurry screenshot"));

    // unpaid snapshot: no compensating refund
    assert!(outcome.compensating_refund_id.is_none());
    assert!(h.refunds.all().is_empty());
    assert_eq!(h.notifier.sent(), vec![(5, NotificationKind::ReceiptRejected)]);
}

#[tokio::test]
async fn test_reject_of_paid_offline_booking_compensates_with_refund() {
    let h = harness(
        vec![booking(6, "qr_manual", BookingPaymentStatus::Paid)],
        true,
        RecordingNotifier::default(),
    );
    seed_receipt(&h, 6).await;
    let tx_id = seed_succeeded_qr_transaction(&h, 6).await;

    let outcome = h.workflow.reject(6, 50, "Amount does not match").await.unwrap();

    let refund_id = outcome.compensating_refund_id.unwrap();
    let refund = h.refunds.get(&refund_id).unwrap();
    assert_eq!(refund.status, RefundStatus::Completed);
    assert_eq!(refund.refund_type, RefundType::Manual);
    assert_eq!(refund.reason, RECEIPT_REJECTED_REFUND_REASON);
    assert_eq!(refund.initiated_by, 50);
    assert_eq!(refund.initiated_by_type, InitiatorType::Staff);

    // the settled transaction is reversed and ledgered
    assert_eq!(
        h.transactions.get(&tx_id).unwrap().status,
        TransactionStatus::Refunded
    );
    assert_eq!(h.transactions.all().len(), 2);
}

#[tokio::test]
async fn test_reject_of_paid_gcash_booking_does_not_compensate() {
    // gateway-held money is reversed through the refund flow, not by
    // receipt review
    let h = harness(
        vec![booking(7, "gcash", BookingPaymentStatus::Paid)],
        true,
        RecordingNotifier::default(),
    );
    seed_receipt(&h, 7).await;

    let outcome = h.workflow.reject(7, 50, "Wrong booking").await.unwrap();

    assert!(outcome.compensating_refund_id.is_none());
    assert!(h.refunds.all().is_empty());
    assert_eq!(
        h.bookings.get(7).unwrap().status,
        BookingStatus::Cancelled
    );
}

#[tokio::test]
async fn test_reject_survives_notification_failure() {
    let h = harness(
        vec![booking(8, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        true,
        RecordingNotifier::failing(),
    );
    seed_receipt(&h, 8).await;

    let outcome = h.workflow.reject(8, 50, "Unreadable").await;
    assert!(outcome.is_ok());
    assert_eq!(
        h.bookings.get(8).unwrap().status,
        BookingStatus::Cancelled
    );
}

#[tokio::test]
async fn test_reject_requires_a_reason() {
    let h = harness(
        vec![booking(9, "qr_manual", BookingPaymentStatus::AwaitingPaymentConfirmation)],
        true,
        RecordingNotifier::default(),
    );

    let err = h.workflow.reject(9, 50, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_reject_degraded_mode_still_cancels_booking() {
    let h = harness(
        vec![booking(10, "qr_manual", BookingPaymentStatus::Paid)],
        false,
        RecordingNotifier::default(),
    );
    seed_succeeded_qr_transaction(&h, 10).await;

    let outcome = h.workflow.reject(10, 50, "No receipt on file").await.unwrap();

    assert!(outcome.receipt_id.is_none());
    let b = h.bookings.get(10).unwrap();
    assert_eq!(b.status, BookingStatus::Cancelled);
    // paid offline snapshot still gets its compensating refund
    assert!(outcome.compensating_refund_id.is_some());
}
