use crate::core::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment sub-state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(40)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    NotPaid,
    Paid,
    Refunded,
    /// Terminal sub-state reached only through receipt rejection: the
    /// booking is cancelled but the money question is parked with staff.
    AwaitingPaymentConfirmation,
}

impl std::fmt::Display for BookingPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingPaymentStatus::NotPaid => "not_paid",
            BookingPaymentStatus::Paid => "paid",
            BookingPaymentStatus::Refunded => "refunded",
            BookingPaymentStatus::AwaitingPaymentConfirmation => "awaiting_payment_confirmation",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for BookingPaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "not_paid" => Ok(BookingPaymentStatus::NotPaid),
            "paid" => Ok(BookingPaymentStatus::Paid),
            "refunded" => Ok(BookingPaymentStatus::Refunded),
            "awaiting_payment_confirmation" => {
                Ok(BookingPaymentStatus::AwaitingPaymentConfirmation)
            }
            _ => Err(format!("Invalid booking payment status: {}", s)),
        }
    }
}

/// Booking lifecycle status (owned by the booking subsystem; this service
/// only ever writes `Cancelled`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// Booking record, consumed by the payment subsystem
///
/// `payment_method` stays a free-form string: the booking subsystem owns its
/// vocabulary and historical rows carry labels like "QR / bank transfer".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: String,
    pub payment_status: BookingPaymentStatus,
    pub status: BookingStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_paid(&self) -> bool {
        self.payment_status == BookingPaymentStatus::Paid
    }
}

/// Markers that identify an offline/QR transfer in the booking subsystem's
/// free-form payment-method labels. Receipt rejection only reverses a
/// payment when the method matches this predicate.
const OFFLINE_TRANSFER_MARKERS: [&str; 3] = ["qr", "scan", "manual"];

/// Named predicate for "was this paid by an offline/QR transfer".
///
/// Matches the typed `qr_manual` method as well as legacy labels the
/// booking subsystem stores verbatim.
pub fn is_offline_transfer_method(method: &str) -> bool {
    let method = method.to_lowercase();
    OFFLINE_TRANSFER_MARKERS
        .iter()
        .any(|marker| method.contains(marker))
}
