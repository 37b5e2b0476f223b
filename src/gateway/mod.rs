//! HTTP gateway: router, shared state, handlers and OpenAPI documentation

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Build the application router.
///
/// Split from [`run_server`] so tests can serve it on an ephemeral port.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/transfers/send", post(handlers::send_transfer))
        .route(
            "/api/v1/transfers/receive",
            post(handlers::receive_transfer),
        )
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ FATAL: Failed to bind to {}: {}", addr, e);
            eprintln!(
                "   Hint: Port {} may already be in use. Check with: lsof -i :{}",
                port, port
            );
            std::process::exit(1);
        }
    };

    println!("🚀 Gateway listening on http://{}", addr);
    println!("📖 API Docs: http://{}/swagger-ui", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ FATAL: Server error: {}", e);
        std::process::exit(1);
    }
}
