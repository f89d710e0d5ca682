//! Bearer token authentication
//!
//! Tokens are checked against the external user service; the resulting
//! [`TokenData`] is attached to the request for handlers to extract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use reqwest::Client;

use super::state::AppState;
use super::types::{ApiResponse, error_codes};
use crate::transaction::{TokenData, TransactionError, mask_token};

#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Resolve a raw bearer token to the caller identity
    async fn validate(&self, token: &str) -> Result<TokenData, TransactionError>;
}

pub struct HttpTokenValidator {
    client: Client,
    url: String,
}

impl HttpTokenValidator {
    pub fn new(
        base_url: &str,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, TransactionError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), endpoint),
        })
    }
}

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn validate(&self, token: &str) -> Result<TokenData, TransactionError> {
        let response = self.client.get(&self.url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                token = %mask_token(token),
                "Token rejected by user service"
            );
            return Err(TransactionError::Unauthorized);
        }

        let mut data: TokenData = response
            .json()
            .await
            .map_err(|_| TransactionError::Unauthorized)?;
        data.token = token.to_string();
        Ok(data)
    }
}

pub async fn bearer_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<()>>)> {
    // 1. Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::MISSING_AUTH,
                "Missing Authorization header",
            )),
        ))?;

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::error(
                    error_codes::AUTH_FAILED,
                    "Invalid token format",
                )),
            ));
        }
    };

    // 2. Validate with the user service
    match state.token_validator.validate(&token).await {
        Ok(user) => {
            // 3. Inject caller identity
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!(token = %mask_token(&token), error = %e, "Authentication failed");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::error(
                    error_codes::AUTH_FAILED,
                    "Invalid or expired token",
                )),
            ))
        }
    }
}
