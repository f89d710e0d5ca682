//! Transaction Database Layer
//!
//! PostgreSQL-backed repository. Status updates run inside a database
//! transaction that starts with `SELECT ... FOR UPDATE`, so concurrent
//! updaters of one reference serialize on the row lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};

use super::error::TransactionError;
use super::repository::{LockedTransaction, PendingCursor, TransactionRepository};
use super::state::TransactionStatus;
use super::types::{Transaction, TransactionType};

const SELECT_COLUMNS: &str = r#"
    SELECT reference, user_id, amount, transaction_type, transaction_status,
           description, additional_info, created_at, updated_at
    FROM transactions_tb
"#;

pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn create(&self, txn: &Transaction) -> Result<(), TransactionError> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions_tb
                (reference, user_id, amount, transaction_type, transaction_status,
                 description, additional_info, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&txn.reference)
        .bind(txn.user_id)
        .bind(txn.amount)
        .bind(txn.transaction_type.as_str())
        .bind(txn.status.as_str())
        .bind(&txn.description)
        .bind(&txn.additional_info)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                TransactionError::DuplicateReference(txn.reference.clone()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, TransactionError> {
        let row = sqlx::query(&format!("{} WHERE reference = $1", SELECT_COLUMNS))
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn find_by_reference_for_update(
        &self,
        reference: &str,
    ) -> Result<Box<dyn LockedTransaction>, TransactionError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "{} WHERE reference = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await?;

        // Early return drops `tx`, which rolls back
        let row = row.ok_or_else(|| TransactionError::NotFound(reference.to_string()))?;
        let current = row_to_transaction(&row)?;

        Ok(Box::new(PgLockedTransaction { tx, current }))
    }

    async fn find_pending(
        &self,
        after: Option<&PendingCursor>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let rows = match after {
            Some(cursor) => {
                sqlx::query(&format!(
                    "{} WHERE transaction_status = $1 AND (created_at, reference) > ($2, $3) \
                     ORDER BY created_at ASC, reference ASC LIMIT $4",
                    SELECT_COLUMNS
                ))
                .bind(TransactionStatus::Pending.as_str())
                .bind(cursor.created_at)
                .bind(&cursor.reference)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{} WHERE transaction_status = $1 ORDER BY created_at ASC, reference ASC LIMIT $2",
                    SELECT_COLUMNS
                ))
                .bind(TransactionStatus::Pending.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_transaction).collect()
    }
}

struct PgLockedTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
    current: Transaction,
}

#[async_trait]
impl LockedTransaction for PgLockedTransaction {
    fn current(&self) -> &Transaction {
        &self.current
    }

    async fn update_status(
        self: Box<Self>,
        status: TransactionStatus,
        reason: Option<String>,
    ) -> Result<(), TransactionError> {
        let PgLockedTransaction { mut tx, current } = *self;

        sqlx::query(
            r#"
            UPDATE transactions_tb
            SET transaction_status = $1, additional_info = $2, updated_at = NOW()
            WHERE reference = $3
            "#,
        )
        .bind(status.as_str())
        .bind(reason)
        .bind(&current.reference)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Convert database row to Transaction
fn row_to_transaction(row: &PgRow) -> Result<Transaction, TransactionError> {
    let type_str: String = row.try_get("transaction_type")?;
    let transaction_type = type_str
        .parse::<TransactionType>()
        .map_err(TransactionError::Persistence)?;

    let status_str: String = row.try_get("transaction_status")?;
    let status = status_str
        .parse::<TransactionStatus>()
        .map_err(TransactionError::Persistence)?;

    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Transaction {
        reference: row.try_get("reference")?,
        user_id: row.try_get("user_id")?,
        amount: row.try_get("amount")?,
        transaction_type,
        status,
        description: row.try_get("description")?,
        additional_info: row.try_get("additional_info")?,
        created_at,
        updated_at,
    })
}
