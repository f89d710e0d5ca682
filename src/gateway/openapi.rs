//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    CreateTransactionBody, CreateTransactionData, UpdateStatusBody, UpdateStatusData,
};
use crate::saga::{Disposition, SagaState, SagaStep};
use crate::transaction::{Transaction, TransactionStatus, TransactionType};

/// Bearer token issued by the user service
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-Wallet Transaction API",
        version = "1.0.0",
        description = "Start wallet top-ups and purchases, then confirm or cancel them."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_transaction,
        crate::gateway::handlers::update_status,
        crate::gateway::handlers::get_saga_state,
        crate::gateway::handlers::get_transaction,
    ),
    components(
        schemas(
            HealthResponse,
            CreateTransactionBody,
            CreateTransactionData,
            UpdateStatusBody,
            UpdateStatusData,
            SagaState,
            SagaStep,
            Disposition,
            Transaction,
            TransactionStatus,
            TransactionType,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Transaction", description = "Transaction sagas (auth required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
