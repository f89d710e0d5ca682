use std::sync::Arc;

use super::auth::TokenValidator;
use crate::saga::SagaCoordinator;
use crate::transaction::TransactionService;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SagaCoordinator>,
    pub service: Arc<TransactionService>,
    pub token_validator: Arc<dyn TokenValidator>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<SagaCoordinator>,
        service: Arc<TransactionService>,
        token_validator: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            coordinator,
            service,
            token_validator,
        }
    }
}
