use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::method_strategy::{CreatePaymentRequest, PaymentMethodRegistry};
use crate::core::{AppError, Result};
use crate::modules::bookings::{BookingPaymentStatus, BookingRepository};
use crate::modules::payments::models::TransactionStatus;
use crate::modules::payments::repositories::TransactionRepository;

/// Response returned to the caller opening a payment intent
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub status: TransactionStatus,
}

/// Opens payment transactions for bookings, dispatching per-method behavior
/// through the strategy registry.
pub struct PaymentIntentService {
    bookings: Arc<dyn BookingRepository>,
    transactions: Arc<dyn TransactionRepository>,
    strategies: Arc<PaymentMethodRegistry>,
}

impl PaymentIntentService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        transactions: Arc<dyn TransactionRepository>,
        strategies: Arc<PaymentMethodRegistry>,
    ) -> Self {
        Self {
            bookings,
            transactions,
            strategies,
        }
    }

    /// Open a payment intent for a booking.
    ///
    /// Guards:
    /// - missing booking → NotFound
    /// - paid booking with a succeeded transaction → AlreadyPaid
    /// - paid booking with no succeeded transaction → the paid flag is a
    ///   leftover from a partial write; reset it to not_paid and proceed so
    ///   the customer is never wedged.
    pub async fn create(&self, request: CreatePaymentRequest) -> Result<PaymentIntent> {
        let booking = self
            .bookings
            .find_by_id(request.booking_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Booking '{}' not found", request.booking_id))
            })?;

        if booking.payment_status == BookingPaymentStatus::Paid {
            let settled = self
                .transactions
                .find_succeeded_by_booking(booking.id)
                .await?;

            match settled {
                Some(transaction) => {
                    return Err(AppError::already_paid(format!(
                        "Booking '{}' is already paid by transaction '{}'",
                        booking.id, transaction.id
                    )));
                }
                None => {
                    warn!(
                        booking_id = booking.id,
                        "Booking marked paid without a succeeded transaction; resetting to not_paid"
                    );
                    self.bookings
                        .set_payment_status(booking.id, BookingPaymentStatus::NotPaid)
                        .await?;
                }
            }
        }

        let strategy = self.strategies.get(request.method)?;
        let transaction = strategy.open_intent(&booking, &request).await?;
        self.transactions.insert(&transaction).await?;

        info!(
            booking_id = booking.id,
            transaction_id = %transaction.id,
            method = %request.method,
            provider = %transaction.provider,
            "Payment intent opened"
        );

        Ok(PaymentIntent {
            transaction_id: transaction.id,
            checkout_url: transaction.checkout_url,
            status: transaction.status,
        })
    }

    /// Fetch a single transaction for status polling
    pub async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<crate::modules::payments::models::PaymentTransaction> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Transaction '{}' not found", id)))
    }
}
