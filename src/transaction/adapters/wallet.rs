//! Wallet Balance HTTP Client
//!
//! `PUT {host}{endpoint}` with a JSON body and the caller's bearer token.
//! 401 maps to `Unauthorized` before any body decoding; other 4xx/5xx map
//! to `ExternalService` carrying the raw body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::{BalanceRequest, BalanceResponse, BalanceService};
use crate::transaction::error::TransactionError;
use crate::transaction::types::mask_token;

pub const DEFAULT_DEBIT_ENDPOINT: &str = "/wallet/v1/balance/debit";
pub const DEFAULT_CREDIT_ENDPOINT: &str = "/wallet/v1/balance/credit";

#[derive(Clone)]
pub struct HttpBalanceClient {
    client: Client,
    base_url: String,
    debit_endpoint: String,
    credit_endpoint: String,
}

impl HttpBalanceClient {
    pub fn new(
        base_url: impl Into<String>,
        debit_endpoint: impl Into<String>,
        credit_endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransactionError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            debit_endpoint: debit_endpoint.into(),
            credit_endpoint: credit_endpoint.into(),
        })
    }

    async fn put(
        &self,
        endpoint: &str,
        token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!(
            url = %url,
            reference = %req.reference,
            amount = req.amount,
            token = %mask_token(token),
            "Calling wallet service"
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(reference = %req.reference, "Wallet service rejected token");
            return Err(TransactionError::Unauthorized);
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                reference = %req.reference,
                status = status.as_u16(),
                body = %body,
                "Wallet service returned error"
            );
            return Err(TransactionError::ExternalService {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<BalanceResponse>()
            .await
            .map_err(|e| TransactionError::ExternalService {
                status: status.as_u16(),
                body: format!("undecodable response: {}", e),
            })
    }
}

#[async_trait]
impl BalanceService for HttpBalanceClient {
    async fn debit(
        &self,
        token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError> {
        self.put(&self.debit_endpoint, token, req).await
    }

    async fn credit(
        &self,
        token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError> {
        self.put(&self.credit_endpoint, token, req).await
    }
}
