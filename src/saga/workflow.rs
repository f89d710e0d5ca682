//! Transaction Saga Workflow
//!
//! One run per reference:
//!
//! ```text
//! create PENDING ──► wait confirm|cancel ──► cancel: mark FAILED, stop
//!                                        └─► confirm: wallet call ──► mark SUCCESS ──► notify
//! ```
//!
//! Every step commits a `SagaState` snapshot before moving on. A wallet
//! failure stops the saga without touching the record, which stays PENDING.
//! A failed SUCCESS write after the wallet call also leaves the saga status
//! at PENDING, since funds have already moved.

use std::time::Duration;

use tracing::{error, info, warn};

use super::activities::SagaActivities;
use super::signal::{Disposition, SignalReceiver};
use super::state::{SagaStateCell, SagaStep};
use crate::transaction::{
    CreateTransactionRequest, TokenData, Transaction, TransactionError, TransactionStatus,
    TransactionType,
};

pub struct TransactionWorkflow {
    activities: SagaActivities,
    confirm_timeout: Option<Duration>,
}

impl TransactionWorkflow {
    pub fn new(activities: SagaActivities, confirm_timeout: Option<Duration>) -> Self {
        Self {
            activities,
            confirm_timeout,
        }
    }

    /// Full run from INIT
    pub async fn execute(
        &self,
        req: CreateTransactionRequest,
        caller: Option<TokenData>,
        signals: SignalReceiver,
        state: &SagaStateCell,
    ) -> Result<(), TransactionError> {
        let txn = match self.activities.create_pending_transaction(&req).await {
            Ok(txn) => txn,
            Err(e) => {
                error!(error = %e, "Create pending transaction failed");
                fail(state, SagaStep::CreatePendingFailed, &e);
                return Err(e);
            }
        };

        state.commit(|s| {
            s.step = SagaStep::PendingCreated;
            s.status = TransactionStatus::Pending;
        });
        info!("Pending transaction recorded, waiting for confirmation");

        self.resume(txn, caller, signals, state).await
    }

    /// Continue from the signal wait with an already persisted PENDING record
    pub async fn resume(
        &self,
        mut txn: Transaction,
        caller: Option<TokenData>,
        signals: SignalReceiver,
        state: &SagaStateCell,
    ) -> Result<(), TransactionError> {
        let signal = signals.wait(self.confirm_timeout).await;

        if signal.disposition == Disposition::Cancel {
            info!(reason = ?signal.reason, "Transaction cancelled");

            if let Err(e) = self
                .activities
                .update_transaction_status(
                    &txn.reference,
                    TransactionStatus::Failed,
                    signal.reason.clone(),
                )
                .await
            {
                warn!(error = %e, "Failed to mark cancelled transaction as FAILED");
            }

            state.commit(|s| {
                s.step = SagaStep::Cancelled;
                s.status = TransactionStatus::Failed;
                s.reason = signal.reason;
            });
            return Ok(());
        }

        state.commit(|s| s.step = SagaStep::Confirmed);
        info!("Transaction confirmed");

        let signal_caller = signal.caller.filter(|user| {
            let owns = user.user_id == txn.user_id;
            if !owns {
                warn!(
                    owner = txn.user_id,
                    caller = user.user_id,
                    "Ignoring signal identity of non-owner"
                );
            }
            owns
        });
        let caller = caller.or(signal_caller);

        if let Err((step, e)) = self.apply_wallet_effect(&txn, caller.as_ref()).await {
            error!(step = %step, error = %e, "Wallet operation failed");
            fail(state, step, &e);
            return Err(e);
        }

        if let Err(e) = self
            .activities
            .update_transaction_status(&txn.reference, TransactionStatus::Success, None)
            .await
        {
            error!(error = %e, "Failed to mark transaction SUCCESS");
            state.commit(|s| {
                s.step = SagaStep::UpdateStatusFailed;
                s.reason = Some(e.to_string());
            });
            return Err(e);
        }

        txn.status = TransactionStatus::Success;
        match caller.as_ref() {
            Some(user) => self.activities.send_notification(&txn, user).await,
            None => warn!("No caller identity, skipping notification"),
        }

        state.commit(|s| {
            s.step = SagaStep::Success;
            s.status = TransactionStatus::Success;
        });
        info!("Transaction completed");
        Ok(())
    }

    async fn apply_wallet_effect(
        &self,
        txn: &Transaction,
        caller: Option<&TokenData>,
    ) -> Result<(), (SagaStep, TransactionError)> {
        let failed_step = match txn.transaction_type {
            TransactionType::Purchase => SagaStep::DebitFailed,
            TransactionType::Topup => SagaStep::CreditFailed,
            // No wallet side effect for refunds yet
            TransactionType::Refund => return Ok(()),
        };

        let Some(caller) = caller else {
            return Err((failed_step, TransactionError::Unauthorized));
        };

        let result = match txn.transaction_type {
            TransactionType::Purchase => self.activities.debit_wallet(txn, caller).await,
            TransactionType::Topup => self.activities.credit_wallet(txn, caller).await,
            TransactionType::Refund => return Ok(()),
        };

        result.map(|_| ()).map_err(|e| (failed_step, e))
    }
}

fn fail(state: &SagaStateCell, step: SagaStep, err: &TransactionError) {
    state.commit(|s| {
        s.step = step;
        s.status = TransactionStatus::Failed;
        s.reason = Some(err.to_string());
    });
}
