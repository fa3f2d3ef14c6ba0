use std::sync::Arc;

use tracing::{info, warn};

use crate::core::Result;
use crate::modules::bookings::{BookingPaymentStatus, BookingRepository};
use crate::modules::notifications::{NotificationDispatcher, NotificationKind};
use crate::modules::payments::models::TransactionStatus;
use crate::modules::payments::repositories::TransactionRepository;

/// Fixed mapping from provider source statuses to transaction statuses.
///
/// Unknown statuses park the transaction in `processing` without touching
/// the booking; the provider will deliver a terminal status later.
pub fn map_provider_status(provider_status: &str) -> TransactionStatus {
    match provider_status {
        "chargeable" | "paid" => TransactionStatus::Succeeded,
        "failed" | "expired" => TransactionStatus::Failed,
        "cancelled" => TransactionStatus::Cancelled,
        _ => TransactionStatus::Processing,
    }
}

/// Applies asynchronous provider callbacks to transaction and booking state.
///
/// Providers redeliver events, so every path here must be idempotent: the
/// repository's guarded transition is the single side-effect gate, and the
/// booking write plus the notification only fire when the transition
/// actually moved a row. Two more rules hold throughout: a booking settles
/// at most once, and the booking's payment flag is written only on success.
pub struct WebhookProcessor {
    transactions: Arc<dyn TransactionRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl WebhookProcessor {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            transactions,
            bookings,
            notifier,
        }
    }

    /// Process a payment status callback for a source.
    ///
    /// Returns false when the source is unknown (stale or test deliveries)
    /// or when the event was already applied; both are non-fatal and the
    /// caller should acknowledge the webhook either way.
    pub async fn process_payment_webhook(
        &self,
        source_id: &str,
        provider_status: &str,
    ) -> Result<bool> {
        let transaction = match self.transactions.find_by_source_id(source_id).await? {
            Some(transaction) => transaction,
            None => {
                warn!(
                    source_id,
                    provider_status, "Webhook for unknown source; ignoring"
                );
                return Ok(false);
            }
        };

        let mapped = map_provider_status(provider_status);

        // Replays against a settled or refunded transaction are no-ops and
        // must not clobber a refunded/awaiting booking state.
        if matches!(
            transaction.status,
            TransactionStatus::Succeeded | TransactionStatus::Refunded
        ) {
            info!(
                transaction_id = %transaction.id,
                provider_status,
                "Webhook replay against settled transaction; no-op"
            );
            return Ok(false);
        }

        // A booking holds at most one settled transaction. A second source
        // reaching a success status (the customer abandoned one intent and
        // an old one settled late) is an anomaly, not a payment.
        if mapped == TransactionStatus::Succeeded {
            if let Some(settled) = self
                .transactions
                .find_succeeded_by_booking(transaction.booking_id)
                .await?
            {
                warn!(
                    transaction_id = %transaction.id,
                    settled_transaction_id = %settled.id,
                    booking_id = transaction.booking_id,
                    provider_status,
                    "Booking already settled through another source; ignoring"
                );
                return Ok(false);
            }
        }

        let failure_reason = match mapped {
            TransactionStatus::Failed => Some(format!("Provider reported {}", provider_status)),
            TransactionStatus::Cancelled => Some("Cancelled at provider".to_string()),
            _ => None,
        };

        let applied = self
            .transactions
            .transition_status(&transaction.id, mapped, failure_reason.as_deref())
            .await?;

        if !applied {
            info!(
                transaction_id = %transaction.id,
                provider_status,
                "Webhook transition already applied; no-op"
            );
            return Ok(false);
        }

        info!(
            transaction_id = %transaction.id,
            booking_id = transaction.booking_id,
            provider_status,
            mapped_status = %mapped,
            "Webhook applied"
        );

        match mapped {
            TransactionStatus::Succeeded => {
                self.bookings
                    .set_payment_status(transaction.booking_id, BookingPaymentStatus::Paid)
                    .await?;
                self.notify(transaction.booking_id, NotificationKind::PaymentConfirmed)
                    .await;
            }
            TransactionStatus::Failed | TransactionStatus::Cancelled => {
                // The booking's payment flag is only written on success: a
                // failed source must not clobber a refunded or parked state
                // reached through another path.
                self.notify(transaction.booking_id, NotificationKind::PaymentFailed)
                    .await;
            }
            // Non-terminal: booking untouched, nothing to announce
            _ => {}
        }

        Ok(true)
    }

    async fn notify(&self, booking_id: i64, kind: NotificationKind) {
        if let Err(e) = self
            .notifier
            .create_payment_notification(booking_id, kind)
            .await
        {
            warn!(
                booking_id,
                kind = kind.as_str(),
                error = %e,
                "Notification dispatch failed; state change already committed"
            );
        }
    }
}
