//! Request and result types for the transfer orchestrators

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::interbank::types::amount_positive;

use super::state::SendState;

/// Body of `POST /api/v1/transfers/send`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SendTransferRequest {
    /// Local account the money leaves from
    pub origin_account_id: i64,
    #[validate(length(min = 1, max = 16))]
    pub destination_bank_code: String,
    #[validate(length(min = 1, max = 34))]
    pub destination_account_number: String,
    #[validate(custom(function = amount_positive))]
    pub amount: Decimal,
    #[validate(length(max = 200))]
    pub concept: Option<String>,
    /// Client-chosen key; replays with the same key return the first result
    #[validate(length(min = 1, max = 80))]
    pub idempotency_key: String,
}

/// Response data of `POST /api/v1/transfers/send`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferData {
    pub movement_id: i64,
    pub balance: Decimal,
    pub state: String,
}

/// Result of a completed outbound send (fresh or replayed).
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub movement_id: i64,
    pub balance: Decimal,
    pub state: SendState,
}

impl From<SendOutcome> for TransferData {
    fn from(outcome: SendOutcome) -> Self {
        Self {
            movement_id: outcome.movement_id,
            balance: outcome.balance,
            state: outcome.state.as_str().to_string(),
        }
    }
}

/// Result of a settled inbound credit (fresh or replayed).
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub movement_id: i64,
    pub balance: Decimal,
}
