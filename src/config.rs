use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::saga::RetryPolicy;
use crate::transaction::adapters::notification::DEFAULT_NOTIFICATION_ENDPOINT;
use crate::transaction::adapters::wallet::{DEFAULT_CREDIT_ENDPOINT, DEFAULT_DEBIT_ENDPOINT};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; in-memory store when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub saga: SagaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WalletConfig {
    pub host: String,
    pub debit_endpoint: String,
    pub credit_endpoint: String,
    pub timeout_ms: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8085".to_string(),
            debit_endpoint: DEFAULT_DEBIT_ENDPOINT.to_string(),
            credit_endpoint: DEFAULT_CREDIT_ENDPOINT.to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub host: String,
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8086".to_string(),
            endpoint: DEFAULT_NOTIFICATION_ENDPOINT.to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Token validation service
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub host: String,
    pub validate_endpoint: String,
    pub timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8084".to_string(),
            validate_endpoint: "/user/v1/token/validate".to_string(),
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SagaConfig {
    pub retry: RetryPolicy,
    /// Cancel sagas that receive no signal within this window
    pub confirm_timeout_secs: Option<u64>,
    /// How long a finished saga stays queryable
    pub finished_retention_secs: u64,
    /// PENDING records resumed per start-up scan
    pub recovery_batch_size: usize,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            confirm_timeout_secs: None,
            finished_retention_secs: 3_600,
            recovery_batch_size: 1_000,
        }
    }
}

impl SagaConfig {
    pub fn confirm_timeout(&self) -> Option<Duration> {
        self.confirm_timeout_secs.map(Duration::from_secs)
    }

    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_secs)
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.postgres_url = Some(url);
        }
        Ok(config)
    }

    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
