//! Transaction Service
//!
//! Business operations over the repository and the external services. Every
//! status mutation is validated against the transition table while the row
//! lock is held.

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use super::adapters::{BalanceRequest, BalanceResponse, BalanceService, NotificationService};
use super::error::TransactionError;
use super::repository::{PendingCursor, TransactionRepository};
use super::state::TransactionStatus;
use super::types::{CreateTransactionRequest, TokenData, Transaction, TransactionType};

pub struct TransactionService {
    repo: Arc<dyn TransactionRepository>,
    balance: Arc<dyn BalanceService>,
    notifier: Arc<dyn NotificationService>,
}

impl TransactionService {
    pub fn new(
        repo: Arc<dyn TransactionRepository>,
        balance: Arc<dyn BalanceService>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            repo,
            balance,
            notifier,
        }
    }

    /// Persist a new PENDING record built from the request
    pub async fn create_pending(
        &self,
        req: &CreateTransactionRequest,
    ) -> Result<Transaction, TransactionError> {
        req.validate()?;

        let txn = Transaction::pending(req);
        self.repo.create(&txn).await?;

        info!(
            reference = %txn.reference,
            user_id = txn.user_id,
            amount = txn.amount,
            transaction_type = %txn.transaction_type,
            "Pending transaction created"
        );
        Ok(txn)
    }

    /// Guarded status change
    ///
    /// Lock the row, check `current -> new` against the transition table,
    /// then write and release. An illegal transition releases the lock
    /// without writing.
    pub async fn update_status(
        &self,
        reference: &str,
        new_status: TransactionStatus,
        reason: Option<String>,
    ) -> Result<(), TransactionError> {
        let locked = self.repo.find_by_reference_for_update(reference).await?;
        let current = locked.current().status;

        if !current.can_transition_to(new_status) {
            warn!(
                reference = %reference,
                from = %current,
                to = %new_status,
                "Rejected status transition"
            );
            return Err(TransactionError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        locked.update_status(new_status, reason).await?;

        info!(
            reference = %reference,
            from = %current,
            to = %new_status,
            "Transaction status updated"
        );
        Ok(())
    }

    pub async fn find(&self, reference: &str) -> Result<Transaction, TransactionError> {
        self.repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| TransactionError::NotFound(reference.to_string()))
    }

    pub async fn find_pending(
        &self,
        after: Option<&PendingCursor>,
        limit: usize,
    ) -> Result<Vec<Transaction>, TransactionError> {
        self.repo.find_pending(after, limit).await
    }

    pub async fn debit_wallet(
        &self,
        txn: &Transaction,
        token: &str,
    ) -> Result<BalanceResponse, TransactionError> {
        debug!(reference = %txn.reference, amount = txn.amount, "Debit wallet");
        self.balance.debit(token, &balance_request(txn)).await
    }

    pub async fn credit_wallet(
        &self,
        txn: &Transaction,
        token: &str,
    ) -> Result<BalanceResponse, TransactionError> {
        debug!(reference = %txn.reference, amount = txn.amount, "Credit wallet");
        self.balance.credit(token, &balance_request(txn)).await
    }

    /// Notify the user about a completed purchase
    ///
    /// No-op for anything but a successful PURCHASE. Delivery failures are
    /// logged and swallowed.
    pub async fn send_notification(&self, txn: &Transaction, user: &TokenData) {
        if txn.transaction_type != TransactionType::Purchase
            || txn.status != TransactionStatus::Success
        {
            return;
        }

        if let Err(e) = self
            .notifier
            .notify_user_registered(user.user_id, &user.email, &user.full_name)
            .await
        {
            warn!(
                reference = %txn.reference,
                user_id = user.user_id,
                error = %e,
                "Notification failed"
            );
        }
    }
}

fn balance_request(txn: &Transaction) -> BalanceRequest {
    BalanceRequest {
        reference: txn.reference.clone(),
        amount: txn.amount,
        user_id: txn.user_id,
    }
}
