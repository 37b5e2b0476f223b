//! Account and movement storage
//!
//! Balances live on the account row; movements are the append-only journal.
//! All writes go through a [`LedgerTxn`] so a debit, its movement row and
//! any external reference land atomically or not at all.

pub mod memory;
pub mod models;
pub mod pg;
pub mod store;

pub use memory::MemoryLedger;
pub use models::{Account, AccountKind, Movement, MovementKind, NewMovement};
pub use pg::PgLedgerStore;
pub use store::{LedgerError, LedgerStore, LedgerTxn};
