//! Saga Steps
//!
//! Each side-effecting step the workflow runs, wrapped in the retry policy.
//! Steps are idempotent on the transaction reference.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

use super::retry::RetryPolicy;
use crate::transaction::adapters::BalanceResponse;
use crate::transaction::{
    CreateTransactionRequest, TokenData, Transaction, TransactionError, TransactionService,
    TransactionStatus,
};

pub struct SagaActivities {
    service: Arc<TransactionService>,
    retry: RetryPolicy,
}

impl SagaActivities {
    pub fn new(service: Arc<TransactionService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Insert the PENDING record
    ///
    /// A duplicate seen on a retry may be this step's own earlier write whose
    /// acknowledgement was lost. It is adopted when it matches the request.
    pub async fn create_pending_transaction(
        &self,
        req: &CreateTransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        let attempts = AtomicU32::new(0);
        let result = self
            .retry
            .run("create_pending_transaction", || {
                attempts.fetch_add(1, Ordering::Relaxed);
                self.service.create_pending(req)
            })
            .await;

        match result {
            Err(TransactionError::DuplicateReference(reference))
                if attempts.load(Ordering::Relaxed) > 1 =>
            {
                let stored = self.service.find(&reference).await?;
                if !written_from(&stored, req) {
                    return Err(TransactionError::DuplicateReference(reference));
                }
                info!(reference = %reference, "Adopted pending record written by an earlier attempt");
                Ok(stored)
            }
            other => other,
        }
    }

    pub async fn update_transaction_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        reason: Option<String>,
    ) -> Result<(), TransactionError> {
        self.retry
            .run("update_transaction_status", || {
                self.service.update_status(reference, status, reason.clone())
            })
            .await
    }

    pub async fn debit_wallet(
        &self,
        txn: &Transaction,
        caller: &TokenData,
    ) -> Result<BalanceResponse, TransactionError> {
        self.retry
            .run("debit_wallet", || self.service.debit_wallet(txn, &caller.token))
            .await
    }

    pub async fn credit_wallet(
        &self,
        txn: &Transaction,
        caller: &TokenData,
    ) -> Result<BalanceResponse, TransactionError> {
        self.retry
            .run("credit_wallet", || self.service.credit_wallet(txn, &caller.token))
            .await
    }

    /// Fire-and-forget; never retried, never fails the saga
    pub async fn send_notification(&self, txn: &Transaction, caller: &TokenData) {
        self.service.send_notification(txn, caller).await
    }
}

fn written_from(txn: &Transaction, req: &CreateTransactionRequest) -> bool {
    txn.status == TransactionStatus::Pending
        && txn.user_id == req.user_id
        && txn.amount == req.amount
        && txn.transaction_type == req.transaction_type
        && txn.description == req.description
}
