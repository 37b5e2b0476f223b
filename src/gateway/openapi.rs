//! OpenAPI / Swagger UI Documentation
//!
//! Auto-generated OpenAPI 3.0 documentation for the transfer API.
//!
//! - Swagger UI: `http://localhost:8080/swagger-ui`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

// Import handler types for schema registration
use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::ApiResponse;
use crate::interbank::{InterbankAck, InterbankTransfer};
use crate::transfer::{SendTransferRequest, TransferData};

/// Bank API key security scheme for the interbank receive endpoint
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bank_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Api-Key",
                    "Shared secret issued to the counterparty bank. Keys are \
                     compared in constant time against the registered bank record.",
                ))),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BankLink Transfer API",
        version = "1.0.0",
        description = "Interbank transfer orchestration: idempotent outbound sends with \
                       commit/rollback against counterparty banks, and authenticated \
                       inbound settlement.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::send_transfer,
        crate::gateway::handlers::receive_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            SendTransferRequest,
            TransferData,
            InterbankTransfer,
            InterbankAck,
            ApiResponse<TransferData>,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Transfers", description = "Outbound sends and inbound settlement"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
