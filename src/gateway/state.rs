use std::sync::Arc;

use crate::db::Database;
use crate::transfer::{InboundSettlement, OutboundOrchestrator};

/// Shared application state handed to every handler.
pub struct AppState {
    /// Outbound transfer orchestrator (debit, external call, commit)
    pub outbound: OutboundOrchestrator,
    /// Inbound settlement handler (authenticate, credit)
    pub inbound: InboundSettlement,
    /// PostgreSQL handle for health probes; `None` when the service runs
    /// on the in-memory ledger (tests, local demos)
    pub db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        outbound: OutboundOrchestrator,
        inbound: InboundSettlement,
        db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            outbound,
            inbound,
            db,
        }
    }
}
