//! Transaction Status Definitions
//!
//! Status names match the persisted `transaction_status` column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Persisted transaction status
///
/// ```text
/// PENDING ──▶ SUCCESS ──▶ REVERSED
///    │
///    ├──────▶ FAILED
///    └──────▶ REVERSED
/// ```
///
/// A status never returns to PENDING once it has left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Recorded, waiting for confirm/cancel
    Pending,
    /// Wallet updated and record settled
    Success,
    /// Cancelled or rejected (no funds moved)
    Failed,
    /// Reversed after the fact
    Reversed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Success,
        TransactionStatus::Failed,
        TransactionStatus::Reversed,
    ];

    /// Outgoing edges of the transition table
    pub fn allowed_transitions(&self) -> &'static [TransactionStatus] {
        match self {
            TransactionStatus::Pending => &[
                TransactionStatus::Success,
                TransactionStatus::Failed,
                TransactionStatus::Reversed,
            ],
            TransactionStatus::Success => &[TransactionStatus::Reversed],
            TransactionStatus::Failed | TransactionStatus::Reversed => &[],
        }
    }

    /// Check whether `self -> to` is a legal edge
    #[inline]
    pub fn can_transition_to(&self, to: TransactionStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// A status is final when no transition leaves it.
    ///
    /// SUCCESS is not final: it can still be REVERSED.
    #[inline]
    pub fn is_final(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Reversed => "REVERSED",
        }
    }
}

/// Decide whether a persisted status may move from `from` to `to`.
///
/// Must be consulted before every status write.
#[inline]
pub fn is_valid_transition(from: TransactionStatus, to: TransactionStatus) -> bool {
    from.can_transition_to(to)
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            "REVERSED" => Ok(TransactionStatus::Reversed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}
