//! Transaction Error Types

use thiserror::Error;

use super::state::TransactionStatus;

/// Errors surfaced by the transaction service, its collaborators and the saga.
///
/// `is_retryable()` drives the step retry policy: only transient failures
/// (storage, balance-service errors, transport) are attempted again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    // === Caller Errors ===
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Duplicate transaction reference: {0}")]
    DuplicateReference(String),

    // === Storage ===
    #[error("Database error: {0}")]
    Persistence(String),

    // === Balance / Notification Services ===
    #[error("Wallet service unauthorized: token invalid or expired")]
    Unauthorized,

    #[error("External service error: {status} - {body}")]
    ExternalService { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    // === Saga Routing ===
    #[error("No running saga for reference: {0}")]
    SagaNotFound(String),

    #[error("Saga already past its disposition: {0}")]
    SagaCompleted(String),
}

impl TransactionError {
    /// Whether the step runner may attempt the failed step again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransactionError::Persistence(_)
                | TransactionError::ExternalService { .. }
                | TransactionError::Network(_)
        )
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransactionError::Validation(_) => "VALIDATION_ERROR",
            TransactionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            TransactionError::NotFound(_) => "NOT_FOUND",
            TransactionError::DuplicateReference(_) => "DUPLICATE_REFERENCE",
            TransactionError::Persistence(_) => "PERSISTENCE_ERROR",
            TransactionError::Unauthorized => "UNAUTHORIZED",
            TransactionError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            TransactionError::Network(_) => "NETWORK_ERROR",
            TransactionError::SagaNotFound(_) => "SAGA_NOT_FOUND",
            TransactionError::SagaCompleted(_) => "SAGA_COMPLETED",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransactionError::Validation(_) => 400,
            TransactionError::Unauthorized => 401,
            TransactionError::NotFound(_) | TransactionError::SagaNotFound(_) => 404,
            TransactionError::InvalidTransition { .. }
            | TransactionError::DuplicateReference(_)
            | TransactionError::SagaCompleted(_) => 409,
            TransactionError::Persistence(_) => 500,
            TransactionError::ExternalService { .. } => 502,
            TransactionError::Network(_) => 503,
        }
    }
}

impl From<sqlx::Error> for TransactionError {
    fn from(e: sqlx::Error) -> Self {
        TransactionError::Persistence(e.to_string())
    }
}

impl From<reqwest::Error> for TransactionError {
    fn from(e: reqwest::Error) -> Self {
        TransactionError::Network(e.to_string())
    }
}

impl From<validator::ValidationErrors> for TransactionError {
    fn from(e: validator::ValidationErrors) -> Self {
        TransactionError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TransactionError::Persistence("down".into()).is_retryable());
        assert!(
            TransactionError::ExternalService {
                status: 503,
                body: "{}".into()
            }
            .is_retryable()
        );
        assert!(TransactionError::Network("reset".into()).is_retryable());

        assert!(!TransactionError::Unauthorized.is_retryable());
        assert!(!TransactionError::Validation("amount".into()).is_retryable());
        assert!(!TransactionError::NotFound("r1".into()).is_retryable());
        assert!(!TransactionError::DuplicateReference("r1".into()).is_retryable());
        assert!(
            !TransactionError::InvalidTransition {
                from: TransactionStatus::Failed,
                to: TransactionStatus::Success
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TransactionError::Unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(
            TransactionError::DuplicateReference("r1".into()).code(),
            "DUPLICATE_REFERENCE"
        );
        assert_eq!(TransactionError::SagaNotFound("r1".into()).code(), "SAGA_NOT_FOUND");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransactionError::Validation("x".into()).http_status(), 400);
        assert_eq!(TransactionError::Unauthorized.http_status(), 401);
        assert_eq!(TransactionError::NotFound("r1".into()).http_status(), 404);
        assert_eq!(TransactionError::SagaCompleted("r1".into()).http_status(), 409);
        assert_eq!(TransactionError::Network("x".into()).http_status(), 503);
    }

    #[test]
    fn test_display() {
        let err = TransactionError::InvalidTransition {
            from: TransactionStatus::Reversed,
            to: TransactionStatus::Success,
        };
        assert_eq!(err.to_string(), "Invalid status transition: REVERSED -> SUCCESS");
    }
}
