use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::{AppError, Result};
use crate::modules::bookings::{Booking, BookingPaymentStatus, BookingRepository};
use crate::modules::gateways::RefundReason;
use crate::modules::notifications::{NotificationDispatcher, NotificationKind};
use crate::modules::payments::models::{PaymentTransaction, Provider};
use crate::modules::payments::repositories::TransactionRepository;
use crate::modules::payments::services::{PaymentMethodRegistry, RefundExecution};
use crate::modules::refunds::models::{InitiatorType, Refund, RefundType};
use crate::modules::refunds::repositories::RefundRepository;

/// Who asked for a refund
#[derive(Debug, Clone, Copy)]
pub struct Initiator {
    pub id: i64,
    pub kind: InitiatorType,
}

/// Outcome returned to callers of the automatic refund path
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub refunded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    pub message: String,
}

/// Decides and executes the refund path for a booking.
///
/// Two entry points:
/// - `process_automatic_refund` for direct cancellations/disputes, strict
///   about failures;
/// - `complete_refund_request` for admin-approved refund requests, which
///   falls back to ledger-only completion when the gateway fails so the
///   customer is never left unresolved.
pub struct RefundOrchestrator {
    bookings: Arc<dyn BookingRepository>,
    transactions: Arc<dyn TransactionRepository>,
    refunds: Arc<dyn RefundRepository>,
    strategies: Arc<PaymentMethodRegistry>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl RefundOrchestrator {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        transactions: Arc<dyn TransactionRepository>,
        refunds: Arc<dyn RefundRepository>,
        strategies: Arc<PaymentMethodRegistry>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            bookings,
            transactions,
            refunds,
            strategies,
            notifier,
        }
    }

    /// Refund a cancelled/disputed booking in full.
    pub async fn process_automatic_refund(
        &self,
        booking_id: i64,
        initiator: Initiator,
    ) -> Result<RefundOutcome> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", booking_id)))?;

        if booking.payment_status != BookingPaymentStatus::Paid {
            if let Some(prior) = self.refunds.find_completed_by_booking(booking_id).await? {
                return Ok(RefundOutcome {
                    refunded: true,
                    refund_id: Some(prior.id),
                    message: "refund already completed".to_string(),
                });
            }
            return Ok(RefundOutcome {
                refunded: false,
                refund_id: None,
                message: "no refund needed".to_string(),
            });
        }

        let transaction = self
            .transactions
            .find_succeeded_by_booking(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::data_integrity(format!(
                    "Booking '{}' is marked paid but has no succeeded transaction",
                    booking_id
                ))
            })?;

        let strategy = self.strategies.get(transaction.payment_method)?;

        // Claim the booking before touching the gateway. The guarded flip
        // from paid to refunded is the serialization point: a concurrent
        // request loses the claim and never reaches the provider.
        if !self.bookings.claim_refund(booking_id).await? {
            return Ok(RefundOutcome {
                refunded: false,
                refund_id: None,
                message: "refund already in progress".to_string(),
            });
        }

        let execution = match strategy
            .execute_refund(
                &booking,
                &transaction,
                RefundReason::RequestedByCustomer,
                None,
            )
            .await
        {
            Ok(execution) => execution,
            Err(e) => {
                // Release the claim: the money never moved, so the booking
                // must read as paid again.
                if let Err(restore) = self
                    .bookings
                    .set_payment_status(booking_id, BookingPaymentStatus::Paid)
                    .await
                {
                    error!(
                        booking_id,
                        error = %restore,
                        "Failed to restore paid flag after refund error"
                    );
                }
                return Err(e);
            }
        };

        let refund = self
            .settle(
                &booking,
                &transaction,
                execution,
                "Booking cancelled".to_string(),
                initiator,
            )
            .await?;

        self.notify(booking_id, NotificationKind::PaymentRefunded)
            .await;

        let message = format!("refund completed via {}", refund_type_label(&refund));

        Ok(RefundOutcome {
            refunded: true,
            refund_id: Some(refund.id),
            message,
        })
    }

    /// Complete an admin-approved refund request.
    ///
    /// The gateway path is attempted first when a verified gateway
    /// transaction exists; any gateway failure falls back to manual
    /// completion instead of surfacing, and the customer is notified in
    /// both cases.
    pub async fn complete_refund_request(
        &self,
        refund_id: &str,
        actor_id: i64,
    ) -> Result<RefundOutcome> {
        let refund = self
            .refunds
            .find_by_id(refund_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Refund '{}' not found", refund_id)))?;

        if refund.is_completed() {
            return Ok(RefundOutcome {
                refunded: true,
                refund_id: Some(refund.id),
                message: "refund already completed".to_string(),
            });
        }

        let booking = self
            .bookings
            .find_by_id(refund.booking_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Booking '{}' not found", refund.booking_id))
            })?;

        let transaction = self
            .transactions
            .find_succeeded_by_booking(refund.booking_id)
            .await?;

        // The claim gates the gateway call: only the caller that flips the
        // booking from paid gets to move money at the provider.
        let claimed = self.bookings.claim_refund(refund.booking_id).await?;

        let (refund_type, provider_reference, notes) = match &transaction {
            Some(tx)
                if claimed
                    && tx.provider == Provider::Paymongo
                    && tx.gateway_reference().is_some() =>
            {
                let strategy = self.strategies.get(tx.payment_method)?;
                match strategy
                    .execute_refund(
                        &booking,
                        tx,
                        RefundReason::RequestedByCustomer,
                        Some(&refund.reason),
                    )
                    .await
                {
                    Ok(execution) => (
                        RefundType::Automatic,
                        execution.provider_reference,
                        None::<String>,
                    ),
                    Err(e) if e.is_gateway_failure() => {
                        warn!(
                            refund_id,
                            booking_id = refund.booking_id,
                            error = %e,
                            "Gateway refund failed; completing manually"
                        );
                        (
                            RefundType::Manual,
                            format!("manual-refund-{}", uuid::Uuid::new_v4()),
                            Some(format!("Gateway refund failed ({}); completed manually", e)),
                        )
                    }
                    Err(e) => {
                        if let Err(restore) = self
                            .bookings
                            .set_payment_status(refund.booking_id, BookingPaymentStatus::Paid)
                            .await
                        {
                            error!(
                                booking_id = refund.booking_id,
                                error = %restore,
                                "Failed to restore paid flag after refund error"
                            );
                        }
                        return Err(e);
                    }
                }
            }
            // No verified gateway transaction, or the claim was lost:
            // ledger-only completion
            _ => (
                RefundType::Manual,
                format!("manual-refund-{}", uuid::Uuid::new_v4()),
                None,
            ),
        };

        let completed_now = self
            .refunds
            .complete(
                &refund.id,
                refund_type,
                &provider_reference,
                notes.as_deref(),
            )
            .await?;

        if !completed_now {
            info!(refund_id, "Refund request completed concurrently; no-op");
            return Ok(RefundOutcome {
                refunded: true,
                refund_id: Some(refund.id),
                message: "refund already completed".to_string(),
            });
        }

        if !claimed {
            self.bookings
                .set_payment_status(refund.booking_id, BookingPaymentStatus::Refunded)
                .await?;
        }

        if let Some(tx) = &transaction {
            if self.transactions.mark_refunded(&tx.id).await? {
                let ledger = PaymentTransaction::refund_ledger_entry(
                    tx,
                    match refund_type {
                        RefundType::Automatic => Provider::Paymongo,
                        RefundType::Manual => Provider::Manual,
                    },
                    provider_reference.clone(),
                );
                self.transactions.insert(&ledger).await?;
            }
        }

        info!(
            refund_id,
            booking_id = refund.booking_id,
            actor_id,
            refund_type = ?refund_type,
            "Refund request completed"
        );

        self.notify(refund.booking_id, NotificationKind::PaymentRefunded)
            .await;

        Ok(RefundOutcome {
            refunded: true,
            refund_id: Some(refund.id),
            message: match refund_type {
                RefundType::Automatic => "refund completed via gateway".to_string(),
                RefundType::Manual => "refund completed manually".to_string(),
            },
        })
    }

    /// Record a compensating refund after a receipt rejection reversed a
    /// paid booking. Ledger-only: the money never sat with the gateway.
    ///
    /// Callers treat failures as best-effort; this method itself is strict
    /// so the caller can log what went wrong.
    pub async fn create_compensating_refund(
        &self,
        booking: &Booking,
        reason: &str,
        actor_id: i64,
    ) -> Result<Refund> {
        let mut refund = Refund::new(
            booking.id,
            booking.amount,
            booking.currency,
            reason.to_string(),
            RefundType::Manual,
            booking.payment_method.clone(),
            actor_id,
            InitiatorType::Staff,
        )?;
        refund.status = crate::modules::refunds::models::RefundStatus::Completed;
        refund.provider_reference = Some(format!("manual-refund-{}", uuid::Uuid::new_v4()));

        self.refunds.insert(&refund).await?;

        if let Some(tx) = self
            .transactions
            .find_succeeded_by_booking(booking.id)
            .await?
        {
            if self.transactions.mark_refunded(&tx.id).await? {
                let ledger = PaymentTransaction::refund_ledger_entry(
                    &tx,
                    Provider::Manual,
                    refund
                        .provider_reference
                        .clone()
                        .unwrap_or_default(),
                );
                self.transactions.insert(&ledger).await?;
            }
        }

        info!(
            booking_id = booking.id,
            refund_id = %refund.id,
            actor_id,
            "Compensating refund recorded"
        );

        Ok(refund)
    }

    /// Settle a successful refund execution against an already-claimed
    /// booking: original transaction, ledger entry, refund record.
    async fn settle(
        &self,
        booking: &Booking,
        transaction: &PaymentTransaction,
        execution: RefundExecution,
        reason: String,
        initiator: Initiator,
    ) -> Result<Refund> {
        if self.transactions.mark_refunded(&transaction.id).await? {
            let ledger = PaymentTransaction::refund_ledger_entry(
                transaction,
                execution.provider,
                execution.provider_reference.clone(),
            );
            self.transactions.insert(&ledger).await?;
        } else {
            warn!(
                transaction_id = %transaction.id,
                "Transaction already reversed; skipping ledger entry"
            );
        }

        let mut refund = Refund::new(
            booking.id,
            transaction.amount,
            transaction.currency,
            reason,
            match execution.provider {
                Provider::Paymongo => RefundType::Automatic,
                Provider::Manual => RefundType::Manual,
            },
            transaction.payment_method.to_string(),
            initiator.id,
            initiator.kind,
        )?;
        refund.status = crate::modules::refunds::models::RefundStatus::Completed;
        refund.provider_reference = Some(execution.provider_reference);

        self.refunds.insert(&refund).await?;

        Ok(refund)
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
                "Refund notification failed; refund already committed"
            );
        }
    }
}

fn refund_type_label(refund: &Refund) -> &'static str {
    match refund.refund_type {
        RefundType::Automatic => "gateway",
        RefundType::Manual => "ledger",
    }
}
