use super::super::models::{Refund, RefundStatus, RefundType};
use crate::core::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Persistence boundary for refund records
#[async_trait]
pub trait RefundRepository: Send + Sync {
    async fn insert(&self, refund: &Refund) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Refund>>;

    /// Most recent completed refund for a booking, if any
    async fn find_completed_by_booking(&self, booking_id: i64) -> Result<Option<Refund>>;

    /// Settle a pending refund record with its final path and reference.
    /// Guarded: returns false when the record was already completed, so a
    /// concurrent completion cannot apply twice.
    async fn complete(
        &self,
        id: &str,
        refund_type: RefundType,
        provider_reference: &str,
        notes: Option<&str>,
    ) -> Result<bool>;
}

const SELECT_COLUMNS: &str = r#"
    id, booking_id, amount, currency, reason, status, refund_type,
    payment_method, provider_reference, initiated_by, initiated_by_type,
    notes, created_at, updated_at
"#;

/// MySQL-backed refund repository
pub struct MySqlRefundRepository {
    pool: MySqlPool,
}

impl MySqlRefundRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefundRepository for MySqlRefundRepository {
    async fn insert(&self, refund: &Refund) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refunds (
                id, booking_id, amount, currency, reason, status, refund_type,
                payment_method, provider_reference, initiated_by,
                initiated_by_type, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&refund.id)
        .bind(refund.booking_id)
        .bind(refund.amount)
        .bind(refund.currency)
        .bind(&refund.reason)
        .bind(refund.status)
        .bind(refund.refund_type)
        .bind(&refund.payment_method)
        .bind(&refund.provider_reference)
        .bind(refund.initiated_by)
        .bind(refund.initiated_by_type)
        .bind(&refund.notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Refund>> {
        let refund = sqlx::query_as::<_, Refund>(&format!(
            "SELECT {} FROM refunds WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(refund)
    }

    async fn find_completed_by_booking(&self, booking_id: i64) -> Result<Option<Refund>> {
        let refund = sqlx::query_as::<_, Refund>(&format!(
            r#"
            SELECT {} FROM refunds
            WHERE booking_id = ? AND status = 'completed'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(refund)
    }

    async fn complete(
        &self,
        id: &str,
        refund_type: RefundType,
        provider_reference: &str,
        notes: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refunds
            SET status = ?, refund_type = ?, provider_reference = ?,
                notes = COALESCE(?, notes), updated_at = NOW()
            WHERE id = ? AND status <> 'completed'
            "#,
        )
        .bind(RefundStatus::Completed)
        .bind(refund_type)
        .bind(provider_reference)
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
