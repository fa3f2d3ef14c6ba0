use super::super::models::{Booking, BookingPaymentStatus};
use crate::core::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Persistence boundary for the bookings this service mutates.
///
/// The booking row is the serialization point for concurrent webhook and
/// admin actions; every write here is a single guarded UPDATE so the store's
/// row lock is the only coordination needed.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>>;

    async fn set_payment_status(&self, id: i64, status: BookingPaymentStatus) -> Result<()>;

    /// Flip the payment flag from paid to refunded as a guarded claim.
    /// Returns false when the booking is not currently paid, which means a
    /// concurrent refund path already claimed it (or there was nothing to
    /// refund). Callers must win this claim before moving money.
    async fn claim_refund(&self, id: i64) -> Result<bool>;

    /// Cancel the booking and park its payment sub-state in one write.
    /// This is the authoritative effect of a receipt rejection.
    async fn cancel(
        &self,
        id: i64,
        reason: &str,
        payment_status: BookingPaymentStatus,
    ) -> Result<()>;
}

/// MySQL-backed booking repository
pub struct MySqlBookingRepository {
    pool: MySqlPool,
}

impl MySqlBookingRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for MySqlBookingRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, user_id, amount, currency, payment_method,
                payment_status, status, cancellation_reason,
                created_at, updated_at
            FROM bookings
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn set_payment_status(&self, id: i64, status: BookingPaymentStatus) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Booking '{}' not found", id)));
        }

        Ok(())
    }

    async fn claim_refund(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = 'refunded', updated_at = NOW()
            WHERE id = ? AND payment_status = 'paid'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel(
        &self,
        id: i64,
        reason: &str,
        payment_status: BookingPaymentStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled',
                payment_status = ?,
                cancellation_reason = ?,
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(payment_status)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Booking '{}' not found", id)));
        }

        Ok(())
    }
}
