//! External Service Adapters
//!
//! Contracts for the wallet balance service and the notification service.
//! Balance calls must be idempotent by `reference`: the saga may repeat a
//! debit or credit after a transient failure or a restart.

pub mod notification;
pub mod wallet;

pub use notification::HttpNotificationClient;
pub use wallet::HttpBalanceClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::TransactionError;

/// Opaque balance-service response body
pub type BalanceResponse = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub reference: String,
    pub amount: i64,
    pub user_id: i64,
}

/// Wallet balance service
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Remove funds from the user's wallet, authenticated with the caller's
    /// bearer token.
    async fn debit(
        &self,
        token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError>;

    /// Add funds to the user's wallet
    async fn credit(
        &self,
        token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify_user_registered(
        &self,
        user_id: i64,
        email: &str,
        full_name: &str,
    ) -> Result<(), TransactionError>;
}
