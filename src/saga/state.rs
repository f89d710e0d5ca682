//! Saga Progress State
//!
//! `SagaState` is what the query contract returns. The running saga owns a
//! [`SagaStateCell`] and commits whole snapshots; readers hold a
//! [`SagaQuery`] and only ever observe committed snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::transaction::TransactionStatus;

/// Saga step labels
///
/// ```text
/// INIT ──► PENDING_CREATED ──► CONFIRMED ──► SUCCESS
///  │             │                 │   │
///  ▼             ▼                 │   └──► UPDATE_STATUS_FAILED
/// CREATE_     CANCELLED            └──► DEBIT_FAILED / CREDIT_FAILED
/// PENDING_FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStep {
    Init,
    PendingCreated,
    Cancelled,
    Confirmed,
    Success,
    CreatePendingFailed,
    DebitFailed,
    CreditFailed,
    UpdateStatusFailed,
}

impl SagaStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::Init => "INIT",
            SagaStep::PendingCreated => "PENDING_CREATED",
            SagaStep::Cancelled => "CANCELLED",
            SagaStep::Confirmed => "CONFIRMED",
            SagaStep::Success => "SUCCESS",
            SagaStep::CreatePendingFailed => "CREATE_PENDING_FAILED",
            SagaStep::DebitFailed => "DEBIT_FAILED",
            SagaStep::CreditFailed => "CREDIT_FAILED",
            SagaStep::UpdateStatusFailed => "UPDATE_STATUS_FAILED",
        }
    }

    /// No further step follows
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SagaStep::Init | SagaStep::PendingCreated | SagaStep::Confirmed
        )
    }
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-visible progress of one saga
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SagaState {
    pub reference: String,
    pub status: TransactionStatus,
    pub step: SagaStep,
    /// Failure or cancellation reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SagaState {
    pub fn init(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            status: TransactionStatus::Pending,
            step: SagaStep::Init,
            reason: None,
        }
    }
}

/// Writer side, owned by the saga task
pub struct SagaStateCell {
    tx: watch::Sender<SagaState>,
}

impl SagaStateCell {
    pub fn new(initial: SagaState) -> (Self, SagaQuery) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, SagaQuery { rx })
    }

    /// Current committed snapshot
    pub fn get(&self) -> SagaState {
        self.tx.borrow().clone()
    }

    /// Apply one atomic change; readers see all of it or none of it
    pub fn commit(&self, update: impl FnOnce(&mut SagaState)) {
        self.tx.send_modify(update);
    }
}

/// Reader side of the query contract
#[derive(Clone)]
pub struct SagaQuery {
    rx: watch::Receiver<SagaState>,
}

impl SagaQuery {
    pub fn snapshot(&self) -> SagaState {
        self.rx.borrow().clone()
    }

    /// Wait until the saga reaches a terminal step
    ///
    /// Returns the last committed snapshot if the saga task goes away first.
    pub async fn wait_terminal(&self) -> SagaState {
        let mut rx = self.rx.clone();
        let reached = rx
            .wait_for(|state| state.step.is_terminal())
            .await
            .map(|state| state.clone());
        match reached {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }
}
