//! HTTP handlers
//!
//! Thin adapters between JSON and the saga coordinator; no business rules
//! beyond request shape checks live here.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use super::state::AppState;
use super::types::{
    ApiError, ApiResponse, CreateTransactionBody, CreateTransactionData, UpdateStatusBody,
    UpdateStatusData, error_codes,
};
use crate::saga::{SagaState, Signal};
use crate::transaction::{
    CreateTransactionRequest, TokenData, Transaction, TransactionType, generate_reference,
};

/// Status reported for a saga accepted for processing
pub const PROCESSING: &str = "PROCESSING";

/// Health check response data
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Build commit
    #[schema(example = "a1b2c3d")]
    pub version: String,
    /// Sagas currently registered
    pub live_sagas: usize,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            status: "ok".to_string(),
            version: env!("GIT_HASH").to_string(),
            live_sagas: state.coordinator.live_count(),
        })),
    )
}

/// Start a transaction saga
///
/// Returns as soon as the saga is running; progress is available from the
/// state endpoint.
#[utoipa::path(
    post,
    path = "/transaction/v1/create",
    request_body = CreateTransactionBody,
    responses(
        (status = 202, description = "Saga started", body = CreateTransactionData),
        (status = 400, description = "Invalid request or unsupported transaction type"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Reference already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Transaction"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<TokenData>,
    Json(body): Json<CreateTransactionBody>,
) -> Result<(StatusCode, Json<ApiResponse<CreateTransactionData>>), ApiError> {
    body.validate()?;

    if !matches!(
        body.transaction_type,
        TransactionType::Topup | TransactionType::Purchase
    ) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            error_codes::UNSUPPORTED_TYPE,
            format!("unsupported transaction type: {}", body.transaction_type),
        ));
    }

    let reference = body.reference.unwrap_or_else(generate_reference);
    let req = CreateTransactionRequest::new(
        reference.clone(),
        user.user_id,
        body.amount,
        body.transaction_type,
        body.description,
    );

    let saga_state = state.coordinator.start(req, Some(user)).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(CreateTransactionData {
            reference,
            status: PROCESSING.to_string(),
            state: saga_state,
        })),
    ))
}

/// Confirm or cancel a pending transaction
#[utoipa::path(
    put,
    path = "/transaction/v1/update-status/{reference}",
    params(("reference" = String, Path, description = "Transaction reference")),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Signal delivered", body = UpdateStatusData),
        (status = 404, description = "No running saga for reference owned by the caller"),
        (status = 409, description = "Saga already confirmed or cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Transaction"
)]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<TokenData>,
    Path(reference): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<ApiResponse<UpdateStatusData>>, ApiError> {
    let signal = Signal {
        disposition: body.status,
        reason: body.reason,
        caller: Some(user),
    };

    state.coordinator.signal(&reference, signal)?;

    Ok(Json(ApiResponse::success(UpdateStatusData {
        reference,
        signal: body.status.signal_name().to_string(),
    })))
}

/// Current saga progress
#[utoipa::path(
    get,
    path = "/transaction/v1/{reference}/state",
    params(("reference" = String, Path, description = "Transaction reference")),
    responses(
        (status = 200, description = "Last committed saga state", body = SagaState),
        (status = 404, description = "No saga for reference")
    ),
    security(("bearer_auth" = [])),
    tag = "Transaction"
)]
pub async fn get_saga_state(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<SagaState>>, ApiError> {
    let snapshot = state.coordinator.query(&reference)?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// Persisted transaction record
#[utoipa::path(
    get,
    path = "/transaction/v1/{reference}",
    params(("reference" = String, Path, description = "Transaction reference")),
    responses(
        (status = 200, description = "Transaction record", body = Transaction),
        (status = 404, description = "Unknown reference")
    ),
    security(("bearer_auth" = [])),
    tag = "Transaction"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<TokenData>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let txn = state.service.find(&reference).await?;

    // Do not reveal other users' records
    if txn.user_id != user.user_id {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            error_codes::TRANSACTION_NOT_FOUND,
            format!("Transaction not found: {}", reference),
        ));
    }

    Ok(Json(ApiResponse::success(txn)))
}
