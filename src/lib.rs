//! BankLink - Interbank Transfer Orchestration Service
//!
//! Moves money between local ledger accounts and counterparty banks with
//! commit/rollback semantics around the external call.
//!
//! # Modules
//!
//! - [`config`] - Per-environment YAML configuration
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`ledger`] - Accounts, movements and the transactional store
//! - [`registry`] - Registered counterparty banks and their API keys
//! - [`interbank`] - Wire types and the HTTP bank client (retry + breaker)
//! - [`transfer`] - Outbound orchestration and inbound settlement
//! - [`gateway`] - HTTP surface with OpenAPI docs
//! - [`logging`] - Log initialization

pub mod config;
pub mod db;
pub mod gateway;
pub mod interbank;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use interbank::{
    BankClient, BreakerRegistry, CallOutcome, HttpBankClient, InterbankAck, InterbankTransfer,
    RetryPolicy,
};
pub use ledger::{Account, LedgerStore, MemoryLedger, Movement, MovementKind, PgLedgerStore};
pub use registry::{BankRegistry, ExternalBank, MemoryBankRegistry, PgBankRegistry};
pub use transfer::{
    InboundSettlement, OutboundOrchestrator, SendOutcome, SendTransferRequest, SettlementOutcome,
    TransferData, TransferError,
};
