//! In-memory ledger store for tests and local simulation
//!
//! A transaction holds the store mutex for its whole lifetime, so
//! transactions are fully serialized: a concurrent `begin` waits until the
//! holder commits or drops. Mutations are applied in place with an undo log
//! that is replayed on drop-without-commit, mirroring the rollback behavior
//! of the PostgreSQL store. Plain reads block while a transaction is open,
//! so finish (commit or rollback) before re-reading from the same task.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::models::{Account, Movement, MovementKind, NewMovement};
use super::store::{LedgerError, LedgerStore, LedgerTxn};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<i64, Account>,
    movements: Vec<Movement>,
    next_movement_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, account: Account) {
        self.state.lock().await.accounts.insert(account.id, account);
    }

    /// Test helper: minimal active account with a starting balance.
    pub async fn seed_account(&self, id: i64, number: &str, balance: Decimal) {
        self.insert_account(Account {
            id,
            account_number: number.to_string(),
            kind: super::models::AccountKind::Checking,
            balance,
            is_active: true,
            client_id: id,
            created_at: Utc::now(),
        })
        .await;
    }

    pub async fn balance_of(&self, account_id: i64) -> Option<Decimal> {
        self.state
            .lock()
            .await
            .accounts
            .get(&account_id)
            .map(|a| a.balance)
    }

    pub async fn movements_of(&self, account_id: i64) -> Vec<Movement> {
        self.state
            .lock()
            .await
            .movements
            .iter()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn account_by_id(&self, id: i64) -> Result<Option<Account>, LedgerError> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn account_by_number(&self, number: &str) -> Result<Option<Account>, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .accounts
            .values()
            .find(|a| a.account_number == number)
            .cloned())
    }

    async fn movement_by_scope(
        &self,
        account_id: i64,
        key: &str,
        kind: MovementKind,
    ) -> Result<Option<Movement>, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .movements
            .iter()
            .find(|m| {
                m.account_id == account_id
                    && m.kind == kind
                    && m.idempotency_key.as_deref() == Some(key)
            })
            .cloned())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTxn>, LedgerError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryTxn {
            guard,
            undo: Vec::new(),
            committed: false,
        }))
    }
}

enum Undo {
    Delta { account_id: i64, delta: Decimal },
    Insert { movement_id: i64 },
    ExternalRef { movement_id: i64, prev: Option<String> },
}

pub struct MemoryTxn {
    guard: OwnedMutexGuard<MemoryState>,
    undo: Vec<Undo>,
    committed: bool,
}

#[async_trait]
impl LedgerTxn for MemoryTxn {
    async fn balance_for_update(&mut self, account_id: i64) -> Result<Decimal, LedgerError> {
        self.guard
            .accounts
            .get(&account_id)
            .map(|a| a.balance)
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    async fn apply_delta(
        &mut self,
        account_id: i64,
        delta: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let account = self
            .guard
            .accounts
            .get_mut(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let new_balance = account.balance + delta;
        if new_balance < Decimal::ZERO {
            // Same failure the balance >= 0 CHECK constraint produces
            return Err(LedgerError::Database(
                "check constraint violated: balance >= 0".to_string(),
            ));
        }
        account.balance = new_balance;
        self.undo.push(Undo::Delta { account_id, delta });
        Ok(new_balance)
    }

    async fn append_movement(&mut self, movement: NewMovement) -> Result<i64, LedgerError> {
        if let Some(key) = movement.idempotency_key.as_deref() {
            let taken = self.guard.movements.iter().any(|m| {
                m.account_id == movement.account_id
                    && m.kind == movement.kind
                    && m.idempotency_key.as_deref() == Some(key)
            });
            if taken {
                return Err(LedgerError::DuplicateIdempotency);
            }
        }

        self.guard.next_movement_id += 1;
        let id = self.guard.next_movement_id;
        self.guard.movements.push(Movement {
            id,
            account_id: movement.account_id,
            kind: movement.kind,
            amount: movement.amount,
            description: movement.description,
            idempotency_key: movement.idempotency_key,
            external_ref: movement.external_ref,
            created_at: Utc::now(),
        });
        self.undo.push(Undo::Insert { movement_id: id });
        Ok(id)
    }

    async fn set_external_ref(
        &mut self,
        movement_id: i64,
        external_ref: &str,
    ) -> Result<(), LedgerError> {
        let movement = self
            .guard
            .movements
            .iter_mut()
            .find(|m| m.id == movement_id)
            .ok_or_else(|| LedgerError::Database(format!("movement {} missing", movement_id)))?;
        self.undo.push(Undo::ExternalRef {
            movement_id,
            prev: movement.external_ref.clone(),
        });
        movement.external_ref = Some(external_ref.to_string());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), LedgerError> {
        self.committed = true;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        // Drop replays the undo log
        Ok(())
    }
}

impl Drop for MemoryTxn {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Delta { account_id, delta } => {
                    if let Some(account) = self.guard.accounts.get_mut(&account_id) {
                        account.balance -= delta;
                    }
                }
                Undo::Insert { movement_id } => {
                    self.guard.movements.retain(|m| m.id != movement_id);
                }
                Undo::ExternalRef { movement_id, prev } => {
                    if let Some(movement) =
                        self.guard.movements.iter_mut().find(|m| m.id == movement_id)
                    {
                        movement.external_ref = prev;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sent(account_id: i64, amount: Decimal, key: &str) -> NewMovement {
        NewMovement {
            account_id,
            kind: MovementKind::TransferSent,
            amount,
            description: "test".to_string(),
            idempotency_key: Some(key.to_string()),
            external_ref: None,
        }
    }

    #[tokio::test]
    async fn test_commit_persists_delta_and_movement() {
        let ledger = MemoryLedger::new();
        ledger.seed_account(1, "ACC-1", dec!(1000)).await;

        let mut tx = ledger.begin().await.unwrap();
        let balance = tx.apply_delta(1, dec!(-300)).await.unwrap();
        assert_eq!(balance, dec!(700));
        tx.append_movement(sent(1, dec!(300), "k1")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(ledger.balance_of(1).await, Some(dec!(700)));
        assert_eq!(ledger.movements_of(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let ledger = MemoryLedger::new();
        ledger.seed_account(1, "ACC-1", dec!(1000)).await;

        {
            let mut tx = ledger.begin().await.unwrap();
            tx.apply_delta(1, dec!(-300)).await.unwrap();
            tx.append_movement(sent(1, dec!(300), "k1")).await.unwrap();
            // dropped here
        }

        assert_eq!(ledger.balance_of(1).await, Some(dec!(1000)));
        assert!(ledger.movements_of(1).await.is_empty());
        // The scope is free again after rollback
        let mut tx = ledger.begin().await.unwrap();
        tx.append_movement(sent(1, dec!(300), "k1")).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_scope_rejected() {
        let ledger = MemoryLedger::new();
        ledger.seed_account(1, "ACC-1", dec!(1000)).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.append_movement(sent(1, dec!(10), "dup")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        let err = tx.append_movement(sent(1, dec!(10), "dup")).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateIdempotency));
    }

    #[tokio::test]
    async fn test_overdraw_fails_like_check_constraint() {
        let ledger = MemoryLedger::new();
        ledger.seed_account(1, "ACC-1", dec!(50)).await;

        let mut tx = ledger.begin().await.unwrap();
        let err = tx.apply_delta(1, dec!(-100)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
        drop(tx);

        assert_eq!(ledger.balance_of(1).await, Some(dec!(50)));
    }

    #[tokio::test]
    async fn test_external_ref_update_and_rollback() {
        let ledger = MemoryLedger::new();
        ledger.seed_account(1, "ACC-1", dec!(1000)).await;

        let mut tx = ledger.begin().await.unwrap();
        let id = tx.append_movement(sent(1, dec!(10), "k1")).await.unwrap();
        tx.set_external_ref(id, "OTRO:TX1").await.unwrap();
        tx.commit().await.unwrap();

        let movements = ledger.movements_of(1).await;
        assert_eq!(movements[0].external_ref.as_deref(), Some("OTRO:TX1"));

        // Uncommitted ref update reverts
        {
            let mut tx = ledger.begin().await.unwrap();
            tx.set_external_ref(id, "OTRO:TX2").await.unwrap();
        }
        let movements = ledger.movements_of(1).await;
        assert_eq!(movements[0].external_ref.as_deref(), Some("OTRO:TX1"));
    }
}
