//! Saga Signal Channel
//!
//! Confirm and cancel signals for one saga share a single bounded channel,
//! so "first received wins" is simply the first message the saga takes.
//! Once the disposition is decided the channel is closed and anything still
//! queued is drained and logged as lost.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::transaction::{TokenData, TransactionError};

/// Signal names as exposed to callers
pub const SIGNAL_CONFIRM: &str = "transaction.confirm";
pub const SIGNAL_CANCEL: &str = "transaction.cancel";

pub const CONFIRM_TIMEOUT_REASON: &str = "confirmation timed out";

/// Signals queued per saga; beyond this the disposition is already decided
const SIGNAL_BUFFER: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Disposition {
    Confirm,
    Cancel,
}

impl Disposition {
    pub fn signal_name(&self) -> &'static str {
        match self {
            Disposition::Confirm => SIGNAL_CONFIRM,
            Disposition::Cancel => SIGNAL_CANCEL,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signal_name())
    }
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONFIRM" => Ok(Disposition::Confirm),
            "CANCEL" => Ok(Disposition::Cancel),
            other => Err(format!("unknown signal: {}", other)),
        }
    }
}

/// Confirm/cancel message delivered to a waiting saga
#[derive(Debug, Clone)]
pub struct Signal {
    pub disposition: Disposition,
    pub reason: Option<String>,
    /// Identity of the signalling caller, used when the saga has none
    pub caller: Option<TokenData>,
}

impl Signal {
    pub fn confirm() -> Self {
        Self {
            disposition: Disposition::Confirm,
            reason: None,
            caller: None,
        }
    }

    pub fn cancel(reason: impl Into<String>) -> Self {
        Self {
            disposition: Disposition::Cancel,
            reason: Some(reason.into()),
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: TokenData) -> Self {
        self.caller = Some(caller);
        self
    }
}

pub fn signal_channel(reference: &str) -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
    (
        SignalSender {
            reference: reference.to_string(),
            tx,
        },
        SignalReceiver {
            reference: reference.to_string(),
            rx,
        },
    )
}

#[derive(Clone)]
pub struct SignalSender {
    reference: String,
    tx: mpsc::Sender<Signal>,
}

impl SignalSender {
    /// Deliver a signal without waiting
    ///
    /// Fails with `SagaCompleted` once the saga has taken its disposition,
    /// or when the queue is full: the first queued signal wins regardless.
    pub fn send(&self, signal: Signal) -> Result<(), TransactionError> {
        debug!(
            reference = %self.reference,
            signal = %signal.disposition,
            "Delivering signal"
        );
        self.tx.try_send(signal).map_err(|e| {
            if let TrySendError::Full(lost) = &e {
                info!(
                    reference = %self.reference,
                    discarded = %lost.disposition,
                    "Signal queue full, discarding"
                );
            }
            TransactionError::SagaCompleted(self.reference.clone())
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct SignalReceiver {
    reference: String,
    rx: mpsc::Receiver<Signal>,
}

impl SignalReceiver {
    /// Wait for the winning signal
    ///
    /// With a timeout, expiry resolves as a cancellation. If every sender is
    /// gone the saga can never be confirmed, so that also cancels.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Signal {
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.rx.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    info!(
                        reference = %self.reference,
                        timeout_secs = limit.as_secs(),
                        "Confirmation wait timed out"
                    );
                    Some(Signal::cancel(CONFIRM_TIMEOUT_REASON))
                }
            },
            None => self.rx.recv().await,
        };

        let winner = received.unwrap_or_else(|| Signal::cancel("signal channel closed"));

        self.rx.close();
        while let Ok(lost) = self.rx.try_recv() {
            info!(
                reference = %self.reference,
                winner = %winner.disposition,
                discarded = %lost.disposition,
                "Discarding signal received after disposition"
            );
        }

        winner
    }
}
