//! In-memory transaction store
//!
//! Each record sits behind its own async mutex; holding the mutex is the
//! row lock. Used by tests and when no PostgreSQL URL is configured.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::TransactionError;
use super::repository::{LockedTransaction, PendingCursor, TransactionRepository};
use super::state::TransactionStatus;
use super::types::Transaction;

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    records: DashMap<String, Arc<Mutex<Transaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn slot(&self, reference: &str) -> Option<Arc<Mutex<Transaction>>> {
        self.records.get(reference).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn create(&self, txn: &Transaction) -> Result<(), TransactionError> {
        match self.records.entry(txn.reference.clone()) {
            Entry::Occupied(_) => Err(TransactionError::DuplicateReference(
                txn.reference.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(txn.clone())));
                Ok(())
            }
        }
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, TransactionError> {
        match self.slot(reference) {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn find_by_reference_for_update(
        &self,
        reference: &str,
    ) -> Result<Box<dyn LockedTransaction>, TransactionError> {
        let slot = self
            .slot(reference)
            .ok_or_else(|| TransactionError::NotFound(reference.to_string()))?;
        let guard = slot.lock_owned().await;
        Ok(Box::new(InMemoryLocked { guard }))
    }

    async fn find_pending(
        &self,
        after: Option<&PendingCursor>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError> {
        let slots: Vec<_> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut pending = Vec::new();
        for slot in slots {
            let txn = slot.lock().await;
            let past_cursor = after.is_none_or(|cursor| cursor.precedes(&txn));
            if txn.status == TransactionStatus::Pending && past_cursor {
                pending.push(txn.clone());
            }
        }
        pending.sort_by(|a, b| {
            (a.created_at, &a.reference).cmp(&(b.created_at, &b.reference))
        });
        pending.truncate(limit);
        Ok(pending)
    }
}

struct InMemoryLocked {
    guard: OwnedMutexGuard<Transaction>,
}

#[async_trait]
impl LockedTransaction for InMemoryLocked {
    fn current(&self) -> &Transaction {
        &self.guard
    }

    async fn update_status(
        self: Box<Self>,
        status: TransactionStatus,
        reason: Option<String>,
    ) -> Result<(), TransactionError> {
        let InMemoryLocked { mut guard } = *self;
        guard.status = status;
        guard.additional_info = reason;
        guard.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::types::{CreateTransactionRequest, TransactionType};
    use std::time::Duration;

    fn pending(reference: &str) -> Transaction {
        Transaction::pending(&CreateTransactionRequest::new(
            reference,
            1001,
            5_000,
            TransactionType::Purchase,
            "coffee",
        ))
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(&pending("R1")).await.unwrap();

        let found = repo.find_by_reference("R1").await.unwrap().unwrap();
        assert_eq!(found.reference, "R1");
        assert!(repo.find_by_reference("R2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_does_not_overwrite() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(&pending("R1")).await.unwrap();

        let mut second = pending("R1");
        second.amount = 99;
        let err = repo.create(&second).await.unwrap_err();
        assert_eq!(err, TransactionError::DuplicateReference("R1".into()));

        assert_eq!(repo.len(), 1);
        let stored = repo.find_by_reference("R1").await.unwrap().unwrap();
        assert_eq!(stored.amount, 5_000);
    }

    #[tokio::test]
    async fn test_locked_update_writes_status_and_reason() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(&pending("R1")).await.unwrap();

        let locked = repo.find_by_reference_for_update("R1").await.unwrap();
        assert_eq!(locked.current().status, TransactionStatus::Pending);
        locked
            .update_status(TransactionStatus::Failed, Some("user cancelled".into()))
            .await
            .unwrap();

        let stored = repo.find_by_reference("R1").await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Failed);
        assert_eq!(stored.additional_info.as_deref(), Some("user cancelled"));
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_lock_for_unknown_reference() {
        let repo = InMemoryTransactionRepository::new();
        let err = repo.find_by_reference_for_update("nope").await.err().unwrap();
        assert_eq!(err, TransactionError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_lock_blocks_second_locker_until_released() {
        let repo = Arc::new(InMemoryTransactionRepository::new());
        repo.create(&pending("R1")).await.unwrap();

        let first = repo.find_by_reference_for_update("R1").await.unwrap();

        let contender = {
            let repo = repo.clone();
            tokio::spawn(async move {
                let locked = repo.find_by_reference_for_update("R1").await.unwrap();
                locked.current().status
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        first
            .update_status(TransactionStatus::Success, None)
            .await
            .unwrap();

        // Second locker observes the committed write
        assert_eq!(contender.await.unwrap(), TransactionStatus::Success);
    }

    #[tokio::test]
    async fn test_find_pending_skips_settled() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(&pending("R1")).await.unwrap();
        repo.create(&pending("R2")).await.unwrap();
        repo.find_by_reference_for_update("R2")
            .await
            .unwrap()
            .update_status(TransactionStatus::Success, None)
            .await
            .unwrap();

        let pending = repo.find_pending(None, 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reference, "R1");
        assert!(repo.find_pending(None, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_pending_pages_by_cursor() {
        let repo = InMemoryTransactionRepository::new();
        for reference in ["P1", "P2", "P3"] {
            repo.create(&pending(reference)).await.unwrap();
        }

        let first = repo.find_pending(None, 2).await.unwrap();
        assert_eq!(first.len(), 2);

        let cursor = PendingCursor::after(first.last().unwrap());
        let second = repo.find_pending(Some(&cursor), 2).await.unwrap();
        assert_eq!(second.len(), 1);

        let mut seen: Vec<_> = first
            .iter()
            .chain(second.iter())
            .map(|txn| txn.reference.clone())
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["P1", "P2", "P3"]);

        let cursor = PendingCursor::after(&second[0]);
        assert!(repo.find_pending(Some(&cursor), 2).await.unwrap().is_empty());
    }
}
