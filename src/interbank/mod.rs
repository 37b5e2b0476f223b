//! Connectivity to counterparty banks: wire types, call policies, HTTP client.

pub mod client;
pub mod policy;
pub mod types;

pub use client::{join_url, BankClient, HttpBankClient, MockBankClient};
pub use policy::{BreakerRegistry, BreakerState, RetryPolicy};
pub use types::{
    CallOutcome, InterbankAck, InterbankTransfer, HEADER_API_KEY, HEADER_IDEMPOTENCY_KEY,
};
