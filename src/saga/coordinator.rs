//! Saga Coordinator
//!
//! In-process execution substrate: one tokio task per reference, a signal
//! channel and a query handle per live saga, and a start-up scan that
//! resumes PENDING records left behind by a previous process.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{Instrument, debug, error, info, info_span, warn};
use validator::Validate;

use super::activities::SagaActivities;
use super::signal::{Signal, SignalReceiver, SignalSender, signal_channel};
use super::state::{SagaQuery, SagaState, SagaStateCell, SagaStep};
use super::workflow::TransactionWorkflow;
use crate::config::SagaConfig;
use crate::transaction::{
    CreateTransactionRequest, PendingCursor, TokenData, Transaction, TransactionError,
    TransactionService,
};

#[derive(Clone)]
struct SagaHandle {
    owner: i64,
    signals: SignalSender,
    query: SagaQuery,
}

pub struct SagaCoordinator {
    workflow: Arc<TransactionWorkflow>,
    service: Arc<TransactionService>,
    sagas: Arc<DashMap<String, SagaHandle>>,
    retain_finished: Duration,
    recovery_batch_size: usize,
}

impl SagaCoordinator {
    pub fn new(service: Arc<TransactionService>, config: &SagaConfig) -> Self {
        let activities = SagaActivities::new(service.clone(), config.retry.clone());
        Self {
            workflow: Arc::new(TransactionWorkflow::new(
                activities,
                config.confirm_timeout(),
            )),
            service,
            sagas: Arc::new(DashMap::new()),
            retain_finished: config.finished_retention(),
            recovery_batch_size: config.recovery_batch_size,
        }
    }

    /// Start a saga and return its initial state without waiting for it
    ///
    /// The request is validated up front so malformed input is rejected to
    /// the caller instead of failing inside the saga.
    pub async fn start(
        &self,
        req: CreateTransactionRequest,
        caller: Option<TokenData>,
    ) -> Result<SagaState, TransactionError> {
        req.validate()?;

        let reference = req.reference.clone();
        let (receiver, cell, snapshot) =
            self.register(&reference, req.user_id, SagaState::init(&reference))?;

        let workflow = self.workflow.clone();
        let span = info_span!("saga", reference = %reference);
        let task = async move {
            info!(
                transaction_type = %req.transaction_type,
                amount = req.amount,
                user_id = req.user_id,
                "Saga started"
            );
            let result = workflow.execute(req, caller, receiver, &cell).await;
            log_outcome(&cell, result);
        };
        self.spawn_tracked(reference, task.instrument(span));

        Ok(snapshot)
    }

    /// Deliver confirm/cancel to a live saga
    ///
    /// A signal carrying another user's identity is answered as if the saga
    /// did not exist.
    pub fn signal(&self, reference: &str, signal: Signal) -> Result<(), TransactionError> {
        let handle = self
            .sagas
            .get(reference)
            .ok_or_else(|| TransactionError::SagaNotFound(reference.to_string()))?;

        if let Some(caller) = signal.caller.as_ref() {
            if caller.user_id != handle.owner {
                warn!(
                    reference = %reference,
                    owner = handle.owner,
                    caller = caller.user_id,
                    "Rejected signal from non-owner"
                );
                return Err(TransactionError::SagaNotFound(reference.to_string()));
            }
        }

        handle.signals.send(signal)
    }

    /// Last committed snapshot
    pub fn query(&self, reference: &str) -> Result<SagaState, TransactionError> {
        self.sagas
            .get(reference)
            .map(|handle| handle.query.snapshot())
            .ok_or_else(|| TransactionError::SagaNotFound(reference.to_string()))
    }

    /// Wait until the saga reaches a terminal step
    pub async fn wait_for_completion(&self, reference: &str) -> Result<SagaState, TransactionError> {
        let query = self
            .sagas
            .get(reference)
            .map(|handle| handle.query.clone())
            .ok_or_else(|| TransactionError::SagaNotFound(reference.to_string()))?;

        Ok(query.wait_terminal().await)
    }

    pub fn live_count(&self) -> usize {
        self.sagas.len()
    }

    /// Resume PENDING records that have no live saga
    ///
    /// Pages through every pending record, `recovery_batch_size` at a time.
    /// Resumed sagas wait at PENDING_CREATED. Bearer tokens are never
    /// persisted, so the wallet call uses the identity carried by the
    /// confirming signal.
    pub async fn recover_pending(&self) -> Result<usize, TransactionError> {
        let batch_size = self.recovery_batch_size.max(1);
        let mut cursor: Option<PendingCursor> = None;
        let mut resumed = 0;

        loop {
            let page = self
                .service
                .find_pending(cursor.as_ref(), batch_size)
                .await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(PendingCursor::after(last));
            let full_page = page.len() == batch_size;

            debug!(count = page.len(), "Scanning pending transactions");
            for txn in page {
                let reference = txn.reference.clone();
                let mut initial = SagaState::init(&reference);
                initial.step = SagaStep::PendingCreated;

                let (receiver, cell, _) = match self.register(&reference, txn.user_id, initial) {
                    Ok(registered) => registered,
                    Err(_) => {
                        debug!(reference = %reference, "Saga already live, skipping");
                        continue;
                    }
                };

                self.spawn_resume(txn, receiver, cell);
                resumed += 1;
            }

            if !full_page {
                break;
            }
        }

        if resumed == 0 {
            debug!("No pending transactions to resume");
        } else {
            info!(count = resumed, "Resumed pending sagas");
        }
        Ok(resumed)
    }

    fn spawn_resume(&self, txn: Transaction, receiver: SignalReceiver, cell: SagaStateCell) {
        let workflow = self.workflow.clone();
        let reference = txn.reference.clone();
        let span = info_span!("saga", reference = %reference);
        let task = async move {
            info!("Saga resumed at signal wait");
            let result = workflow.resume(txn, None, receiver, &cell).await;
            log_outcome(&cell, result);
        };
        self.spawn_tracked(reference, task.instrument(span));
    }

    fn register(
        &self,
        reference: &str,
        owner: i64,
        initial: SagaState,
    ) -> Result<(SignalReceiver, SagaStateCell, SagaState), TransactionError> {
        match self.sagas.entry(reference.to_string()) {
            Entry::Occupied(_) => Err(TransactionError::DuplicateReference(reference.to_string())),
            Entry::Vacant(slot) => {
                let (signals, receiver) = signal_channel(reference);
                let (cell, query) = SagaStateCell::new(initial);
                let snapshot = query.snapshot();
                slot.insert(SagaHandle {
                    owner,
                    signals,
                    query,
                });
                Ok((receiver, cell, snapshot))
            }
        }
    }

    /// Run the saga, then keep its final state queryable for a while
    fn spawn_tracked<F>(&self, reference: String, saga: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let sagas = self.sagas.clone();
        let retain = self.retain_finished;
        tokio::spawn(async move {
            saga.await;
            tokio::time::sleep(retain).await;
            sagas.remove(&reference);
            debug!(reference = %reference, "Finished saga evicted");
        });
    }
}

fn log_outcome(cell: &SagaStateCell, result: Result<(), TransactionError>) {
    let state = cell.get();
    match result {
        Ok(()) => info!(step = %state.step, status = %state.status, "Saga finished"),
        Err(e) => error!(step = %state.step, status = %state.status, error = %e, "Saga failed"),
    }
}
