//! Outbound send protocol states
//!
//! The protocol runs within a single request and a single transaction, so
//! the state is never persisted; it drives tracing and the API response.
//! Terminal states: COMMITTED, ROLLED_BACK.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendState {
    /// Checks that touch nothing: idempotency, accounts, limits, registry
    Validating,

    /// Balance decremented and movement appended, transaction open
    Debited,

    /// Counterparty call in flight, funds still held by the open transaction
    AwaitingExternalAck,

    /// Terminal: transaction committed, counterparty credited
    Committed,

    /// Terminal: transaction rolled back, nothing observable happened
    RolledBack,
}

impl SendState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SendState::Committed | SendState::RolledBack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SendState::Validating => "VALIDATING",
            SendState::Debited => "DEBITED",
            SendState::AwaitingExternalAck => "AWAITING_EXTERNAL_ACK",
            SendState::Committed => "COMMITTED",
            SendState::RolledBack => "ROLLED_BACK",
        }
    }
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
