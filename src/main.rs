//! E-Wallet Transaction Service
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌───────────────┐    ┌──────────┐
//! │ Gateway  │───▶│    Saga      │───▶│  Transaction  │───▶│ Postgres │
//! │ (axum)   │    │ Coordinator  │    │   Service     │    │ / memory │
//! └──────────┘    └──────────────┘    └───────┬───────┘    └──────────┘
//!                                             │
//!                                    wallet / notification
//! ```
//!
//! Usage: `ewallet_txn [--env <name>]` reads `config/<name>.yaml`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use ewallet_txn::config::AppConfig;
use ewallet_txn::db::Database;
use ewallet_txn::gateway::{self, AppState, auth::HttpTokenValidator};
use ewallet_txn::logging::init_logging;
use ewallet_txn::saga::SagaCoordinator;
use ewallet_txn::transaction::adapters::{HttpBalanceClient, HttpNotificationClient};
use ewallet_txn::transaction::{
    InMemoryTransactionRepository, PgTransactionRepository, TransactionRepository,
    TransactionService,
};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

async fn build_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn TransactionRepository>> {
    match config.postgres_url.as_deref() {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.ensure_schema()
                .await
                .context("Failed to apply transactions schema")?;
            Ok(Arc::new(PgTransactionRepository::new(db.pool().clone())))
        }
        None => {
            tracing::warn!("No postgres_url configured, transactions are kept in memory only");
            Ok(Arc::new(InMemoryTransactionRepository::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _guard = init_logging(&config);

    tracing::info!(
        env = %env,
        version = env!("GIT_HASH"),
        "Starting e-wallet transaction service"
    );

    let repo = build_repository(&config).await?;

    let balance = Arc::new(HttpBalanceClient::new(
        config.wallet.host.clone(),
        config.wallet.debit_endpoint.clone(),
        config.wallet.credit_endpoint.clone(),
        Duration::from_millis(config.wallet.timeout_ms),
    )?);
    let notifier = Arc::new(HttpNotificationClient::new(
        &config.notification.host,
        &config.notification.endpoint,
        Duration::from_millis(config.notification.timeout_ms),
    )?);
    let service = Arc::new(TransactionService::new(repo, balance, notifier));

    let coordinator = Arc::new(SagaCoordinator::new(service.clone(), &config.saga));
    let resumed = coordinator
        .recover_pending()
        .await
        .context("Failed to resume pending transactions")?;
    if resumed > 0 {
        tracing::info!(count = resumed, "Pending sagas waiting for confirmation");
    }

    let token_validator = Arc::new(HttpTokenValidator::new(
        &config.auth.host,
        &config.auth.validate_endpoint,
        Duration::from_millis(config.auth.timeout_ms),
    )?);

    let state = AppState::new(coordinator, service, token_validator);
    gateway::run_server(&config.gateway.host, config.gateway.port, state).await
}
