//! Transaction Core Types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::state::TransactionStatus;

/// Kind of wallet operation a transaction performs
///
/// REFUND is accepted by the data model but has no wallet side effect yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Credit the user's wallet
    Topup,
    /// Debit the user's wallet
    Purchase,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Topup => "TOPUP",
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Refund => "REFUND",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TOPUP" => Ok(TransactionType::Topup),
            "PURCHASE" => Ok(TransactionType::Purchase),
            "REFUND" => Ok(TransactionType::Refund),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

/// Durable record of a single financial operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Globally unique, immutable
    pub reference: String,
    pub user_id: i64,
    /// Minor currency units
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub description: String,
    /// Reason attached on negative/terminal transitions
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a PENDING record from a saga start request
    pub fn pending(req: &CreateTransactionRequest) -> Self {
        let now = Utc::now();
        Self {
            reference: req.reference.clone(),
            user_id: req.user_id,
            amount: req.amount,
            transaction_type: req.transaction_type,
            status: TransactionStatus::Pending,
            description: req.description.clone(),
            additional_info: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request that starts a transaction saga
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(min = 1, max = 64))]
    pub reference: String,
    #[validate(range(min = 1))]
    pub user_id: i64,
    #[validate(range(min = 1))]
    pub amount: i64,
    pub transaction_type: TransactionType,
    #[validate(length(min = 1))]
    pub description: String,
}

impl CreateTransactionRequest {
    pub fn new(
        reference: impl Into<String>,
        user_id: i64,
        amount: i64,
        transaction_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            user_id,
            amount,
            transaction_type,
            description: description.into(),
        }
    }
}

/// Generate a server-side transaction reference
pub fn generate_reference() -> String {
    format!("TRX{}", ulid::Ulid::new())
}

/// Authenticated caller identity
///
/// Produced by token validation, read-only to the saga, never persisted.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TokenData {
    pub user_id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    /// Raw bearer token (without the `Bearer ` prefix)
    #[serde(skip)]
    pub token: String,
}

impl fmt::Debug for TokenData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenData")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("token", &mask_token(&self.token))
            .finish()
    }
}

/// Mask a bearer token for logging
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
