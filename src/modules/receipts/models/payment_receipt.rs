use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Review state of an uploaded receipt. Confirmed and rejected are
/// terminal; a reviewed receipt is never re-opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Awaiting,
    Confirmed,
    Rejected,
}

/// Proof-of-transfer image uploaded by a customer for an offline payment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentReceipt {
    pub id: String,
    pub booking_id: i64,
    pub user_id: i64,
    pub receipt_path: String,
    pub status: ReceiptStatus,
    pub notes: Option<String>,
    pub confirmed_by: Option<i64>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentReceipt {
    pub fn new(booking_id: i64, user_id: i64, receipt_path: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id,
            user_id,
            receipt_path,
            status: ReceiptStatus::Awaiting,
            notes: None,
            confirmed_by: None,
            confirmed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_reviewed(&self) -> bool {
        matches!(self.status, ReceiptStatus::Confirmed | ReceiptStatus::Rejected)
    }
}
