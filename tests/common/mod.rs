//! Shared fixtures for HTTP-level tests

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;

use ewallet_txn::config::SagaConfig;
use ewallet_txn::gateway::{self, AppState, auth::TokenValidator};
use ewallet_txn::saga::{RetryPolicy, SagaCoordinator};
use ewallet_txn::transaction::adapters::{
    BalanceRequest, BalanceResponse, BalanceService, NotificationService,
};
use ewallet_txn::transaction::{
    InMemoryTransactionRepository, TokenData, TransactionError, TransactionService,
};

pub const VALID_TOKEN: &str = "valid-token-0123456789";
pub const USER_ID: i64 = 1001;
pub const OTHER_TOKEN: &str = "other-token-9876543210";
pub const OTHER_USER_ID: i64 = 2002;

/// Accepts only [`VALID_TOKEN`] and [`OTHER_TOKEN`]
pub struct StaticTokenValidator;

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<TokenData, TransactionError> {
        let (user_id, email, full_name) = match token {
            VALID_TOKEN => (USER_ID, "jane@example.com", "Jane Doe"),
            OTHER_TOKEN => (OTHER_USER_ID, "eve@example.com", "Eve"),
            _ => return Err(TransactionError::Unauthorized),
        };
        Ok(TokenData {
            user_id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            token: token.to_string(),
        })
    }
}

/// Records wallet calls and always succeeds
#[derive(Default)]
pub struct RecordingWallet {
    pub calls: Mutex<Vec<(String, BalanceRequest)>>,
}

#[async_trait]
impl BalanceService for RecordingWallet {
    async fn debit(
        &self,
        _token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError> {
        self.calls
            .lock()
            .unwrap()
            .push(("debit".to_string(), req.clone()));
        Ok(BalanceResponse::new())
    }

    async fn credit(
        &self,
        _token: &str,
        req: &BalanceRequest,
    ) -> Result<BalanceResponse, TransactionError> {
        self.calls
            .lock()
            .unwrap()
            .push(("credit".to_string(), req.clone()));
        Ok(BalanceResponse::new())
    }
}

pub struct SilentNotifier;

#[async_trait]
impl NotificationService for SilentNotifier {
    async fn notify_user_registered(
        &self,
        _user_id: i64,
        _email: &str,
        _full_name: &str,
    ) -> Result<(), TransactionError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub coordinator: Arc<SagaCoordinator>,
    pub service: Arc<TransactionService>,
    pub wallet: Arc<RecordingWallet>,
}

pub fn test_app() -> TestApp {
    let repo = Arc::new(InMemoryTransactionRepository::new());
    let wallet = Arc::new(RecordingWallet::default());
    let service = Arc::new(TransactionService::new(
        repo,
        wallet.clone(),
        Arc::new(SilentNotifier),
    ));

    let config = SagaConfig {
        retry: RetryPolicy {
            initial_interval_ms: 1,
            backoff_coefficient: 2.0,
            maximum_interval_ms: 5,
            maximum_attempts: 3,
        },
        ..SagaConfig::default()
    };
    let coordinator = Arc::new(SagaCoordinator::new(service.clone(), &config));

    let state = AppState::new(
        coordinator.clone(),
        service.clone(),
        Arc::new(StaticTokenValidator),
    );

    TestApp {
        router: gateway::router(state),
        coordinator,
        service,
        wallet,
    }
}
