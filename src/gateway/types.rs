//! API request/response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `error_codes`: Standard error code constants
//! - `ApiError`: `TransactionError` rendered as an HTTP response

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::saga::{Disposition, SagaState};
use crate::transaction::{TransactionError, TransactionType};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Body of `POST /transaction/v1/create`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransactionBody {
    /// Minor currency units
    #[validate(range(min = 1))]
    #[schema(example = 150000)]
    pub amount: i64,
    pub transaction_type: TransactionType,
    #[validate(length(min = 1))]
    #[schema(example = "Top up via virtual account")]
    pub description: String,
    /// Generated server-side when absent
    #[validate(length(min = 1, max = 64))]
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionData {
    #[schema(example = "TRX01J9ZQ3V4E6Y7T8K2M5N0P1R3S")]
    pub reference: String,
    #[schema(example = "PROCESSING")]
    pub status: String,
    pub state: SagaState,
}

/// Body of `PUT /transaction/v1/update-status/{reference}`
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusBody {
    pub status: Disposition,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusData {
    pub reference: String,
    /// Signal that was delivered
    #[schema(example = "transaction.confirm")]
    pub signal: String,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const UNSUPPORTED_TYPE: i32 = 1002;
    pub const INVALID_TRANSITION: i32 = 1003;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const WALLET_UNAUTHORIZED: i32 = 2003;

    // Resource errors (4xxx)
    pub const TRANSACTION_NOT_FOUND: i32 = 4001;
    pub const SAGA_NOT_FOUND: i32 = 4002;
    pub const DUPLICATE_REFERENCE: i32 = 4091;
    pub const SAGA_COMPLETED: i32 = 4092;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const UPSTREAM_ERROR: i32 = 5002;
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Handler error: HTTP status plus the unified error body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        let code = match &err {
            TransactionError::Validation(_) => error_codes::INVALID_PARAMETER,
            TransactionError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
            TransactionError::NotFound(_) => error_codes::TRANSACTION_NOT_FOUND,
            TransactionError::DuplicateReference(_) => error_codes::DUPLICATE_REFERENCE,
            TransactionError::Persistence(_) => error_codes::INTERNAL_ERROR,
            TransactionError::Unauthorized => error_codes::WALLET_UNAUTHORIZED,
            TransactionError::ExternalService { .. } => error_codes::UPSTREAM_ERROR,
            TransactionError::Network(_) => error_codes::SERVICE_UNAVAILABLE,
            TransactionError::SagaNotFound(_) => error_codes::SAGA_NOT_FOUND,
            TransactionError::SagaCompleted(_) => error_codes::SAGA_COMPLETED,
        };
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Storage details stay in the logs
        let msg = match &err {
            TransactionError::Persistence(detail) => {
                tracing::error!(error = %detail, "Persistence failure");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        Self::new(status, code, msg)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}
