use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::{AppError, Result};
use crate::modules::bookings::{
    is_offline_transfer_method, BookingPaymentStatus, BookingRepository,
};
use crate::modules::notifications::{NotificationDispatcher, NotificationKind};
use crate::modules::receipts::models::{PaymentReceipt, ReceiptStatus};
use crate::modules::receipts::repositories::ReceiptRepository;
use crate::modules::refunds::services::RefundOrchestrator;

pub const RECEIPT_REJECTED_REFUND_REASON: &str = "Receipt rejected - reversing payment";

/// Result of a staff receipt review
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptReviewOutcome {
    pub booking_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compensating_refund_id: Option<String>,
}

/// Staff review of uploaded payment receipts.
///
/// The receipt store is optional: when the schema could not be created at
/// startup the workflow degrades to operating on the booking alone, so
/// review keeps working against databases where DDL is not permitted.
pub struct ReceiptConfirmationWorkflow {
    bookings: Arc<dyn BookingRepository>,
    receipts: Option<Arc<dyn ReceiptRepository>>,
    refunds: Arc<RefundOrchestrator>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl ReceiptConfirmationWorkflow {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        receipts: Option<Arc<dyn ReceiptRepository>>,
        refunds: Arc<RefundOrchestrator>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            bookings,
            receipts,
            refunds,
            notifier,
        }
    }

    /// Record an uploaded proof of payment and park the booking for staff
    /// review. Only offline-transfer bookings take receipts; gateway-held
    /// money is confirmed by the provider's webhook instead.
    pub async fn submit(
        &self,
        booking_id: i64,
        user_id: i64,
        receipt_path: &str,
    ) -> Result<ReceiptReviewOutcome> {
        if receipt_path.trim().is_empty() {
            return Err(AppError::validation("Receipt path cannot be empty"));
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", booking_id)))?;

        if !is_offline_transfer_method(&booking.payment_method) {
            return Err(AppError::validation(format!(
                "Booking '{}' is paid via '{}', which takes no receipt",
                booking_id, booking.payment_method
            )));
        }
        if booking.payment_status == BookingPaymentStatus::Paid {
            return Err(AppError::already_paid(format!(
                "Booking '{}' is already paid",
                booking_id
            )));
        }

        let receipt_id = match &self.receipts {
            Some(store) => {
                let receipt =
                    PaymentReceipt::new(booking_id, user_id, receipt_path.to_string());
                store.insert(&receipt).await?;
                Some(receipt.id)
            }
            None => {
                warn!(
                    booking_id,
                    "Receipt store unavailable; parking booking without a stored receipt"
                );
                None
            }
        };

        self.bookings
            .set_payment_status(booking_id, BookingPaymentStatus::AwaitingPaymentConfirmation)
            .await?;

        info!(booking_id, user_id, "Receipt submitted for review");

        Ok(ReceiptReviewOutcome {
            booking_id,
            receipt_id,
            compensating_refund_id: None,
        })
    }

    /// Accept the uploaded proof of payment and mark the booking paid.
    pub async fn confirm(&self, booking_id: i64, actor_id: i64) -> Result<ReceiptReviewOutcome> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", booking_id)))?;

        let receipt_id = match &self.receipts {
            Some(store) => {
                let receipt = store
                    .find_latest_by_booking(booking_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!(
                            "No receipt uploaded for booking '{}'",
                            booking_id
                        ))
                    })?;

                match receipt.status {
                    ReceiptStatus::Confirmed => {
                        // Reviews are terminal; a repeated confirm is a no-op
                        return Ok(ReceiptReviewOutcome {
                            booking_id,
                            receipt_id: Some(receipt.id),
                            compensating_refund_id: None,
                        });
                    }
                    ReceiptStatus::Rejected => {
                        return Err(AppError::validation(format!(
                            "Receipt '{}' was already rejected",
                            receipt.id
                        )));
                    }
                    ReceiptStatus::Awaiting => {}
                }

                store.mark_confirmed(&receipt.id, actor_id).await?;
                Some(receipt.id)
            }
            None => {
                warn!(booking_id, "Receipt store unavailable; confirming booking directly");
                None
            }
        };

        self.bookings
            .set_payment_status(booking.id, BookingPaymentStatus::Paid)
            .await?;

        info!(booking_id, actor_id, "Receipt confirmed");

        self.notify(booking_id, NotificationKind::PaymentConfirmed)
            .await;

        Ok(ReceiptReviewOutcome {
            booking_id,
            receipt_id,
            compensating_refund_id: None,
        })
    }

    /// Reject the uploaded proof of payment.
    ///
    /// The authoritative effect is the booking write: cancelled with the
    /// payment sub-state parked at awaiting_payment_confirmation. When the
    /// booking was already flagged paid through an offline transfer, a
    /// compensating refund reverses that money; the refund and the customer
    /// notification are best-effort and never fail the rejection.
    pub async fn reject(
        &self,
        booking_id: i64,
        actor_id: i64,
        reason: &str,
    ) -> Result<ReceiptReviewOutcome> {
        if reason.trim().is_empty() {
            return Err(AppError::validation("Rejection reason cannot be empty"));
        }

        // Snapshot before the authoritative write; the compensation decision
        // reads the pre-rejection payment state.
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", booking_id)))?;

        let receipt_id = match &self.receipts {
            Some(store) => match store.find_latest_by_booking(booking_id).await? {
                Some(receipt) => {
                    if receipt.status == ReceiptStatus::Rejected {
                        return Ok(ReceiptReviewOutcome {
                            booking_id,
                            receipt_id: Some(receipt.id),
                            compensating_refund_id: None,
                        });
                    }
                    store.mark_rejected(&receipt.id, actor_id, reason).await?;
                    Some(receipt.id)
                }
                None => {
                    warn!(booking_id, "No receipt on record; rejecting booking anyway");
                    None
                }
            },
            None => None,
        };

        self.bookings
            .cancel(
                booking.id,
                reason,
                BookingPaymentStatus::AwaitingPaymentConfirmation,
            )
            .await?;

        info!(booking_id, actor_id, reason, "Receipt rejected");

        let compensating_refund_id = if booking.payment_status == BookingPaymentStatus::Paid
            && is_offline_transfer_method(&booking.payment_method)
        {
            match self
                .refunds
                .create_compensating_refund(&booking, RECEIPT_REJECTED_REFUND_REASON, actor_id)
                .await
            {
                Ok(refund) => Some(refund.id),
                Err(e) => {
                    error!(
                        booking_id,
                        error = %e,
                        "Compensating refund failed; booking rejection already committed"
                    );
                    None
                }
            }
        } else {
            None
        };

        self.notify(booking_id, NotificationKind::ReceiptRejected)
            .await;

        Ok(ReceiptReviewOutcome {
            booking_id,
            receipt_id,
            compensating_refund_id,
        })
    }

    async fn notify(&self, booking_id: i64, kind: NotificationKind) {
        if let Err(e) = self
            .notifier
            .create_payment_notification(booking_id, kind)
            .await
        {
            error!(
                booking_id,
                kind = kind.as_str(),
                error = %e,
                "Receipt review notification failed"
            );
        }
    }
}
