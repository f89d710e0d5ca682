pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    // ==========================================================================
    // Transaction Routes - Protected by bearer token
    // ==========================================================================
    let transaction_routes = Router::new()
        .route("/create", post(handlers::create_transaction))
        .route("/update-status/{reference}", put(handlers::update_status))
        .route("/{reference}/state", get(handlers::get_saga_state))
        .route("/{reference}", get(handlers::get_transaction))
        .layer(from_fn_with_state(
            state.clone(),
            auth::bearer_auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/transaction/v1", transaction_routes)
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(addr = %addr, "Gateway listening");
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
