//! Transaction Repository Contract
//!
//! Storage backends implement [`TransactionRepository`]. Status mutations go
//! through a [`LockedTransaction`] so that read-validate-write happens while
//! the row lock is held.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::TransactionError;
use super::state::TransactionStatus;
use super::types::Transaction;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Persist a new record.
    ///
    /// Fails with `DuplicateReference` if the reference already exists; the
    /// existing record is left untouched.
    async fn create(&self, txn: &Transaction) -> Result<(), TransactionError>;

    /// Plain read
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, TransactionError>;

    /// Read with a write lock held until the returned handle is consumed or
    /// dropped. Fails with `NotFound` for unknown references.
    async fn find_by_reference_for_update(
        &self,
        reference: &str,
    ) -> Result<Box<dyn LockedTransaction>, TransactionError>;

    /// Oldest PENDING records first, ordered by `(created_at, reference)`
    ///
    /// Returns at most `limit` records strictly after `after`. Used to page
    /// through pending records when resuming sagas after a restart.
    async fn find_pending(
        &self,
        after: Option<&PendingCursor>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError>;
}

/// Keyset position in the pending scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCursor {
    pub created_at: DateTime<Utc>,
    pub reference: String,
}

impl PendingCursor {
    /// Cursor positioned at `txn`; the next page starts after it
    pub fn after(txn: &Transaction) -> Self {
        Self {
            created_at: txn.created_at,
            reference: txn.reference.clone(),
        }
    }

    /// Whether `txn` sorts after this position
    pub fn precedes(&self, txn: &Transaction) -> bool {
        (txn.created_at, txn.reference.as_str()) > (self.created_at, self.reference.as_str())
    }
}

/// A transaction row held under a write lock
///
/// Dropping the handle without calling `update_status` releases the lock and
/// changes nothing.
#[async_trait]
pub trait LockedTransaction: Send {
    /// Snapshot read under the lock
    fn current(&self) -> &Transaction;

    /// Write status and reason, bump `updated_at` and release the lock
    async fn update_status(
        self: Box<Self>,
        status: TransactionStatus,
        reason: Option<String>,
    ) -> Result<(), TransactionError>;
}
