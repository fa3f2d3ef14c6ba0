use crate::core::{AppError, Currency, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Refund record lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Awaiting admin approval (approval-flow requests)
    Pending,
    Completed,
    Failed,
}

/// How the money moved back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundType {
    /// Reversed through the gateway
    Automatic,
    /// Ledger-only: staff settle the money outside the gateway
    Manual,
}

/// Who initiated the refund
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InitiatorType {
    Staff,
    Customer,
    System,
}

impl std::fmt::Display for InitiatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InitiatorType::Staff => "staff",
            InitiatorType::Customer => "customer",
            InitiatorType::System => "system",
        };
        write!(f, "{}", s)
    }
}

/// Refund record
///
/// Dedicated row answering "has this booking been refunded" and "what is
/// the refund's provider reference"; the companion ledger entry lives in
/// payment_transactions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Refund {
    pub id: String,
    pub booking_id: i64,
    pub amount: Decimal,
    pub currency: Currency,
    pub reason: String,
    pub status: RefundStatus,
    pub refund_type: RefundType,
    pub payment_method: String,
    pub provider_reference: Option<String>,
    pub initiated_by: i64,
    pub initiated_by_type: InitiatorType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    pub fn new(
        booking_id: i64,
        amount: Decimal,
        currency: Currency,
        reason: String,
        refund_type: RefundType,
        payment_method: String,
        initiated_by: i64,
        initiated_by_type: InitiatorType,
    ) -> Result<Self> {
        currency
            .validate_amount(amount)
            .map_err(AppError::validation)?;

        if reason.trim().is_empty() {
            return Err(AppError::validation("Refund reason cannot be empty"));
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id,
            amount,
            currency,
            reason,
            status: RefundStatus::Pending,
            refund_type,
            payment_method,
            provider_reference: None,
            initiated_by,
            initiated_by_type,
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status == RefundStatus::Completed
    }
}
