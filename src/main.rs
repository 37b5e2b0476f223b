//! BankLink service entry point
//!
//! Boots configuration, logging and PostgreSQL, wires the transfer
//! orchestrators and serves the HTTP gateway:
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────┐
//! │  Config  │───▶│  PostgreSQL  │───▶│ Orchestrators│───▶│ Gateway  │
//! │  (YAML)  │    │ (pool+schema)│    │ (out/inbound)│    │  (HTTP)  │
//! └──────────┘    └──────────────┘    └──────────────┘    └──────────┘
//! ```

use std::sync::Arc;

use banklink::config::AppConfig;
use banklink::db::{Database, ensure_schema};
use banklink::gateway::{self, state::AppState};
use banklink::interbank::HttpBankClient;
use banklink::ledger::PgLedgerStore;
use banklink::logging::init_logging;
use banklink::registry::PgBankRegistry;
use banklink::transfer::{InboundSettlement, OutboundOrchestrator};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = init_logging(&config);

    tracing::info!("Starting BankLink gateway in {} mode", env);

    // PostgreSQL: pool + schema bootstrap
    let db = Arc::new(
        Database::connect(&config.database_url(), config.database.max_connections).await?,
    );
    ensure_schema(db.pool()).await?;
    println!("✅ PostgreSQL connected, schema ready");

    // Stores share the one pool
    let ledger = Arc::new(PgLedgerStore::new(db.pool().clone()));
    let registry = Arc::new(PgBankRegistry::new(db.pool().clone()));

    // Outbound HTTP client with per-bank circuit breakers
    let client = Arc::new(HttpBankClient::new(&config.interbank)?);

    let outbound = OutboundOrchestrator::new(
        ledger.clone(),
        registry.clone(),
        client,
        &config.interbank,
        &config.limits,
    );
    let inbound = InboundSettlement::new(ledger, registry);

    let state = Arc::new(AppState::new(outbound, inbound, Some(db)));

    let port = get_port_override().unwrap_or(config.server.port);
    gateway::run_server(&config.server.host, port, state).await;

    Ok(())
}
