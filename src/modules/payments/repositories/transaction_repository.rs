use super::super::models::{PaymentTransaction, TransactionStatus};
use crate::core::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Persistence boundary for payment transactions.
///
/// `transition_status` and `mark_refunded` return whether a row actually
/// moved; the MySQL implementation guards them at the SQL level so terminal
/// rows can never regress, which is what makes webhook redelivery a no-op.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, transaction: &PaymentTransaction) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentTransaction>>;

    async fn find_by_source_id(&self, source_id: &str) -> Result<Option<PaymentTransaction>>;

    /// The at-most-one succeeded transaction backing a paid booking
    async fn find_succeeded_by_booking(
        &self,
        booking_id: i64,
    ) -> Result<Option<PaymentTransaction>>;

    /// Move a non-terminal transaction to `status`. Returns false when the
    /// row is already terminal (idempotent replay) or missing.
    async fn transition_status(
        &self,
        id: &str,
        status: TransactionStatus,
        failure_reason: Option<&str>,
    ) -> Result<bool>;

    /// succeeded → refunded, the only exit from succeeded. Returns false
    /// when the row was not in succeeded.
    async fn mark_refunded(&self, id: &str) -> Result<bool>;

    /// Attach the gateway charge id once the provider reports it
    async fn set_provider_transaction_id(&self, id: &str, provider_id: &str) -> Result<()>;
}

const SELECT_COLUMNS: &str = r#"
    id, booking_id, amount, currency, payment_method, status, provider,
    provider_transaction_id, source_id, checkout_url, return_url,
    failure_reason, metadata, created_at, updated_at
"#;

/// MySQL-backed transaction repository
pub struct MySqlTransactionRepository {
    pool: MySqlPool,
}

impl MySqlTransactionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for MySqlTransactionRepository {
    async fn insert(&self, transaction: &PaymentTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, booking_id, amount, currency, payment_method, status,
                provider, provider_transaction_id, source_id, checkout_url,
                return_url, failure_reason, metadata
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(transaction.booking_id)
        .bind(transaction.amount)
        .bind(transaction.currency)
        .bind(transaction.payment_method)
        .bind(transaction.status)
        .bind(transaction.provider)
        .bind(&transaction.provider_transaction_id)
        .bind(&transaction.source_id)
        .bind(&transaction.checkout_url)
        .bind(&transaction.return_url)
        .bind(&transaction.failure_reason)
        .bind(&transaction.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentTransaction>> {
        let transaction = sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {} FROM payment_transactions WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_by_source_id(&self, source_id: &str) -> Result<Option<PaymentTransaction>> {
        let transaction = sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {} FROM payment_transactions WHERE source_id = ?",
            SELECT_COLUMNS
        ))
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_succeeded_by_booking(
        &self,
        booking_id: i64,
    ) -> Result<Option<PaymentTransaction>> {
        let transaction = sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            SELECT {} FROM payment_transactions
            WHERE booking_id = ? AND status = 'succeeded'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn transition_status(
        &self,
        id: &str,
        status: TransactionStatus,
        failure_reason: Option<&str>,
    ) -> Result<bool> {
        // Terminal rows are excluded in the WHERE clause; the row lock makes
        // concurrent webhook redeliveries race to a single winner.
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = ?, failure_reason = ?, updated_at = NOW()
            WHERE id = ?
              AND status NOT IN ('succeeded', 'failed', 'cancelled', 'refunded')
            "#,
        )
        .bind(status)
        .bind(failure_reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_refunded(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'refunded', updated_at = NOW()
            WHERE id = ? AND status = 'succeeded'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_provider_transaction_id(&self, id: &str, provider_id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET provider_transaction_id = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(provider_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Transaction '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
