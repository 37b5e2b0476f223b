//! Ledger storage contract
//!
//! Two seams: `LedgerStore` for plain reads and opening a transaction, and
//! `LedgerTxn` for the mutations that must share one atomic scope. A
//! `LedgerTxn` that is dropped without `commit` rolls back everything it
//! did, including when the task holding it is cancelled mid-await.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::models::{Account, Movement, MovementKind, NewMovement};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(i64),

    /// A movement already exists for the same (account, key, kind) scope.
    /// Callers treat this as "lost the race": roll back and read the winner.
    #[error("movement already recorded for this idempotency scope")]
    DuplicateIdempotency,

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            return LedgerError::DuplicateIdempotency;
        }
        LedgerError::Database(e.to_string())
    }
}

/// Read access to accounts and movements, plus transaction entry.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn account_by_id(&self, id: i64) -> Result<Option<Account>, LedgerError>;

    async fn account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerError>;

    /// Prior movement for an idempotency scope, if the operation already ran.
    async fn movement_by_scope(
        &self,
        account_id: i64,
        key: &str,
        kind: MovementKind,
    ) -> Result<Option<Movement>, LedgerError>;

    async fn begin(&self) -> Result<Box<dyn LedgerTxn>, LedgerError>;
}

/// Mutations inside one transaction boundary.
#[async_trait]
pub trait LedgerTxn: Send {
    /// Current balance, read under a lock held until the transaction ends.
    async fn balance_for_update(&mut self, account_id: i64) -> Result<Decimal, LedgerError>;

    /// Apply a signed balance delta; returns the new balance.
    async fn apply_delta(&mut self, account_id: i64, delta: Decimal)
    -> Result<Decimal, LedgerError>;

    /// Insert a movement; `DuplicateIdempotency` when the scope is taken.
    async fn append_movement(&mut self, movement: NewMovement) -> Result<i64, LedgerError>;

    async fn set_external_ref(
        &mut self,
        movement_id: i64,
        external_ref: &str,
    ) -> Result<(), LedgerError>;

    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    /// Explicit rollback. Dropping without commit has the same effect.
    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}
