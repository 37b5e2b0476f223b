//! Ledger domain models
//!
//! Kind IDs are stored as SMALLINT in PostgreSQL; keep them stable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Savings = 1,
    Checking = 2,
}

impl AccountKind {
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(AccountKind::Savings),
            2 => Some(AccountKind::Checking),
            _ => None,
        }
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Savings => "savings",
            AccountKind::Checking => "checking",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Movement direction/type
///
/// `TransferSent` and `TransferReceived` are the two legs the orchestrators
/// create; `Deposit` and `Withdrawal` come from the plain cash flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Deposit = 1,
    Withdrawal = 2,
    TransferSent = 3,
    TransferReceived = 4,
}

impl MovementKind {
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(MovementKind::Deposit),
            2 => Some(MovementKind::Withdrawal),
            3 => Some(MovementKind::TransferSent),
            4 => Some(MovementKind::TransferReceived),
            _ => None,
        }
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// True when the movement increases the account balance.
    #[inline]
    pub fn is_credit(&self) -> bool {
        matches!(self, MovementKind::Deposit | MovementKind::TransferReceived)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Deposit => "deposit",
            MovementKind::Withdrawal => "withdrawal",
            MovementKind::TransferSent => "transfer_sent",
            MovementKind::TransferReceived => "transfer_received",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client account holding a balance
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub is_active: bool,
    pub client_id: i64,
    pub created_at: DateTime<Utc>,
}

/// One recorded balance change
///
/// Immutable once written, except `external_ref` which is updated exactly
/// once after a counterparty acknowledges an outbound transfer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Movement {
    pub id: i64,
    pub account_id: i64,
    pub kind: MovementKind,
    pub amount: Decimal,
    pub description: String,
    /// Caller-supplied token; unique per (account, key, kind)
    pub idempotency_key: Option<String>,
    /// `<bankCode>:<counterpartyAccountOrTxId>`
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Movement fields for insertion; id and timestamp come from the store.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub account_id: i64,
    pub kind: MovementKind,
    pub amount: Decimal,
    pub description: String,
    pub idempotency_key: Option<String>,
    pub external_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_id_roundtrip() {
        let kinds = [
            MovementKind::Deposit,
            MovementKind::Withdrawal,
            MovementKind::TransferSent,
            MovementKind::TransferReceived,
        ];

        for kind in kinds {
            let id = kind.id();
            let recovered = MovementKind::from_id(id).unwrap();
            assert_eq!(kind, recovered);
        }
    }

    #[test]
    fn test_invalid_kind_id() {
        assert!(MovementKind::from_id(0).is_none());
        assert!(MovementKind::from_id(99).is_none());
        assert!(AccountKind::from_id(0).is_none());
    }

    #[test]
    fn test_credit_direction() {
        assert!(MovementKind::Deposit.is_credit());
        assert!(MovementKind::TransferReceived.is_credit());
        assert!(!MovementKind::Withdrawal.is_credit());
        assert!(!MovementKind::TransferSent.is_credit());
    }

    #[test]
    fn test_display() {
        assert_eq!(MovementKind::TransferSent.to_string(), "transfer_sent");
        assert_eq!(AccountKind::Checking.to_string(), "checking");
    }
}
