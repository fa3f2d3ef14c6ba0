use crate::core::{AppError, Currency, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment method accepted by the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Settled in person at the cremation center
    Cash,
    /// GCash via the PayMongo checkout redirect
    Gcash,
    /// Offline bank/e-wallet transfer confirmed by receipt review
    QrManual,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::QrManual => "qr_manual",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "gcash" => Ok(PaymentMethod::Gcash),
            "qr_manual" => Ok(PaymentMethod::QrManual),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

/// Payment transaction status
///
/// Transitions are monotonic: pending → processing → one of
/// succeeded/failed/cancelled. The only exit from succeeded is refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    /// Terminal statuses never advance again (except succeeded → refunded)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Succeeded
                | TransactionStatus::Failed
                | TransactionStatus::Cancelled
                | TransactionStatus::Refunded
        )
    }

    /// Whether the state machine admits `self → next`
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        match self {
            TransactionStatus::Pending => next != TransactionStatus::Pending,
            TransactionStatus::Processing => {
                !matches!(next, TransactionStatus::Pending | TransactionStatus::Processing)
            }
            TransactionStatus::Succeeded => next == TransactionStatus::Refunded,
            TransactionStatus::Failed | TransactionStatus::Cancelled | TransactionStatus::Refunded => {
                false
            }
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Succeeded => "succeeded",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "processing" => Ok(TransactionStatus::Processing),
            "succeeded" => Ok(TransactionStatus::Succeeded),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "refunded" => Ok(TransactionStatus::Refunded),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// Who custodies the money for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Cash, offline transfers, ledger-only refund entries
    Manual,
    /// PayMongo-mediated GCash charges and refunds
    Paymongo,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provider::Manual => "manual",
            Provider::Paymongo => "paymongo",
        };
        write!(f, "{}", s)
    }
}

/// Payment transaction record
///
/// One row per payment attempt; refunds additionally insert a ledger row
/// with status=refunded so "was this booking refunded" is answerable even
/// when no gateway was involved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTransaction {
    pub id: String,
    pub booking_id: i64,
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub provider: Provider,
    /// Gateway charge/refund id, once known
    pub provider_transaction_id: Option<String>,
    /// Gateway source id (set for gcash before the charge exists)
    pub source_id: Option<String>,
    pub checkout_url: Option<String>,
    pub return_url: Option<String>,
    pub failure_reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Open a new pending transaction for a booking
    pub fn new(
        booking_id: i64,
        amount: Decimal,
        currency: Currency,
        payment_method: PaymentMethod,
        provider: Provider,
    ) -> Result<Self> {
        currency
            .validate_amount(amount)
            .map_err(AppError::validation)?;

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id,
            amount,
            currency,
            payment_method,
            status: TransactionStatus::Pending,
            provider,
            provider_transaction_id: None,
            source_id: None,
            checkout_url: None,
            return_url: None,
            failure_reason: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Ledger entry recording a refund fact, linked to the original
    /// transaction via metadata
    pub fn refund_ledger_entry(
        original: &PaymentTransaction,
        provider: Provider,
        provider_reference: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: original.booking_id,
            amount: original.amount,
            currency: original.currency,
            payment_method: original.payment_method,
            status: TransactionStatus::Refunded,
            provider,
            provider_transaction_id: Some(provider_reference),
            source_id: None,
            checkout_url: None,
            return_url: None,
            failure_reason: None,
            metadata: Some(serde_json::json!({ "refunds_transaction_id": original.id })),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == TransactionStatus::Succeeded
    }

    /// Gateway reference usable for a refund call, preferring the charge id
    pub fn gateway_reference(&self) -> Option<&str> {
        self.provider_transaction_id
            .as_deref()
            .or(self.source_id.as_deref())
    }
}
