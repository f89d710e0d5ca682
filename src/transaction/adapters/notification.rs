//! Notification HTTP Client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::NotificationService;
use crate::transaction::error::TransactionError;

pub const DEFAULT_NOTIFICATION_ENDPOINT: &str = "/notification/v1/user-registered";

#[derive(Debug, Serialize)]
struct UserRegisteredEvent<'a> {
    user_id: i64,
    email: &'a str,
    full_name: &'a str,
}

#[derive(Clone)]
pub struct HttpNotificationClient {
    client: Client,
    url: String,
}

impl HttpNotificationClient {
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
impl NotificationService for HttpNotificationClient {
    async fn notify_user_registered(
        &self,
        user_id: i64,
        email: &str,
        full_name: &str,
    ) -> Result<(), TransactionError> {
        let event = UserRegisteredEvent {
            user_id,
            email,
            full_name,
        };

        let response = self.client.post(&self.url).json(&event).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransactionError::ExternalService {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
