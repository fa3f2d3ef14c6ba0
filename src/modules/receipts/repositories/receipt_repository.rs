use super::super::models::{PaymentReceipt, ReceiptStatus};
use crate::core::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::info;

/// Persistence boundary for uploaded payment receipts
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn insert(&self, receipt: &PaymentReceipt) -> Result<()>;

    /// Latest receipt for a booking regardless of review state
    async fn find_latest_by_booking(&self, booking_id: i64) -> Result<Option<PaymentReceipt>>;

    async fn mark_confirmed(&self, id: &str, confirmed_by: i64) -> Result<()>;

    async fn mark_rejected(&self, id: &str, rejected_by: i64, reason: &str) -> Result<()>;
}

const SELECT_COLUMNS: &str = r#"
    id, booking_id, user_id, receipt_path, status, notes,
    confirmed_by, confirmed_at, rejection_reason, created_at, updated_at
"#;

/// MySQL-backed receipt repository.
///
/// The table is created lazily on startup; when the configured database
/// account is not allowed to run DDL, `ensure_schema` fails and the wiring
/// falls back to running the receipt workflow without a receipt store.
pub struct MySqlReceiptRepository {
    pool: MySqlPool,
}

impl MySqlReceiptRepository {
    pub async fn ensure_schema(pool: MySqlPool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payment_receipts (
                id VARCHAR(36) PRIMARY KEY,
                booking_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                receipt_path VARCHAR(512) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'awaiting',
                notes TEXT NULL,
                confirmed_by BIGINT NULL,
                confirmed_at TIMESTAMP NULL,
                rejection_reason TEXT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                    ON UPDATE CURRENT_TIMESTAMP,
                INDEX idx_payment_receipts_booking (booking_id)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("payment_receipts schema ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ReceiptRepository for MySqlReceiptRepository {
    async fn insert(&self, receipt: &PaymentReceipt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_receipts (
                id, booking_id, user_id, receipt_path, status, notes
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&receipt.id)
        .bind(receipt.booking_id)
        .bind(receipt.user_id)
        .bind(&receipt.receipt_path)
        .bind(receipt.status)
        .bind(&receipt.notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_latest_by_booking(&self, booking_id: i64) -> Result<Option<PaymentReceipt>> {
        let receipt = sqlx::query_as::<_, PaymentReceipt>(&format!(
            r#"
            SELECT {} FROM payment_receipts
            WHERE booking_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receipt)
    }

    async fn mark_confirmed(&self, id: &str, confirmed_by: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_receipts
            SET status = ?, confirmed_by = ?, confirmed_at = NOW(),
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(ReceiptStatus::Confirmed)
        .bind(confirmed_by)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_rejected(&self, id: &str, rejected_by: i64, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_receipts
            SET status = ?, confirmed_by = ?, rejection_reason = ?,
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(ReceiptStatus::Rejected)
        .bind(rejected_by)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
