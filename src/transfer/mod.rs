//! Transfer orchestration
//!
//! Two entry points: [`OutboundOrchestrator::send`] pushes money out to a
//! counterparty bank, [`InboundSettlement::receive`] accepts money pushed
//! to us. Both are idempotent on (account, key, movement kind) and leave
//! no partial state behind on any failure.

pub mod error;
pub mod inbound;
pub mod outbound;
pub mod state;
pub mod types;

pub use error::TransferError;
pub use inbound::InboundSettlement;
pub use outbound::OutboundOrchestrator;
pub use state::SendState;
pub use types::{SendOutcome, SendTransferRequest, SettlementOutcome, TransferData};

/// Movement description: the caller's concept, or the catalog fallback
/// when the concept is missing or blank.
pub(crate) fn describe(concept: Option<&str>, fallback: &str) -> String {
    match concept.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => fallback.to_string(),
    }
}
