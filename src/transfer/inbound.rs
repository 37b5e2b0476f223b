//! Inbound settlement: credits pushed to us by counterparty banks
//!
//! No outbound call is involved. Authenticate the claimed origin bank,
//! resolve the destination account, then credit and journal inside one
//! transaction. The idempotency scope is (destination account, key,
//! received), so the same key may also exist on a sent movement.

use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::interbank::InterbankTransfer;
use crate::ledger::{LedgerError, LedgerStore, MovementKind, NewMovement};
use crate::registry::BankRegistry;

use super::describe;
use super::error::TransferError;
use super::types::SettlementOutcome;

/// Compares a presented API key against the stored one in constant time.
/// Both are padded to a common length first so the comparison cost does not
/// depend on where the first mismatch sits.
fn keys_match(presented: &str, stored: &str) -> bool {
    let max_len = std::cmp::max(presented.len(), stored.len());

    let mut presented_padded = vec![0u8; max_len];
    let mut stored_padded = vec![0xFFu8; max_len];
    presented_padded[..presented.len()].copy_from_slice(presented.as_bytes());
    stored_padded[..stored.len()].copy_from_slice(stored.as_bytes());

    let lengths_equal = presented.len().ct_eq(&stored.len());
    let contents_equal = presented_padded.ct_eq(&stored_padded);
    (lengths_equal & contents_equal).into()
}

pub struct InboundSettlement {
    ledger: Arc<dyn LedgerStore>,
    registry: Arc<dyn BankRegistry>,
}

impl InboundSettlement {
    pub fn new(ledger: Arc<dyn LedgerStore>, registry: Arc<dyn BankRegistry>) -> Self {
        Self { ledger, registry }
    }

    /// Settles one pushed credit. `presented_api_key` is the `X-Api-Key`
    /// header value sent by the counterparty.
    pub async fn receive(
        &self,
        presented_api_key: &str,
        order: &InterbankTransfer,
    ) -> Result<SettlementOutcome, TransferError> {
        let bank = self
            .registry
            .find_active(&order.origin_bank_code)
            .await?
            .ok_or_else(|| {
                warn!(bank = %order.origin_bank_code, "origin bank missing or inactive");
                TransferError::OriginBankUnavailable(order.origin_bank_code.clone())
            })?;

        if !keys_match(presented_api_key, &bank.api_key) {
            warn!(bank = %bank.code, "inbound transfer with wrong api key");
            return Err(TransferError::InvalidApiKey);
        }

        let account = self
            .ledger
            .account_by_number(&order.destination_account_number)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| {
                warn!(
                    account = %order.destination_account_number,
                    "destination account missing or inactive"
                );
                TransferError::DestinationAccountUnavailable
            })?;

        let key = order.idempotency_key.as_str();
        if let Some(prior) = self
            .ledger
            .movement_by_scope(account.id, key, MovementKind::TransferReceived)
            .await?
        {
            info!(
                account_id = account.id,
                movement_id = prior.id,
                key,
                bank = %bank.code,
                "replaying settled credit"
            );
            return Ok(SettlementOutcome {
                movement_id: prior.id,
                balance: account.balance,
            });
        }

        let mut txn = self.ledger.begin().await?;
        txn.balance_for_update(account.id).await?;
        let new_balance = txn.apply_delta(account.id, order.amount).await?;
        let movement_id = match txn
            .append_movement(NewMovement {
                account_id: account.id,
                kind: MovementKind::TransferReceived,
                amount: order.amount,
                description: describe(order.concept.as_deref(), "Transferencia Recibida"),
                idempotency_key: Some(key.to_string()),
                external_ref: Some(format!(
                    "{}:{}",
                    order.origin_bank_code, order.origin_account_number
                )),
            })
            .await
        {
            Ok(id) => id,
            Err(LedgerError::DuplicateIdempotency) => {
                txn.rollback().await?;
                let winner = self
                    .ledger
                    .movement_by_scope(account.id, key, MovementKind::TransferReceived)
                    .await?
                    .ok_or_else(|| {
                        TransferError::Unexpected(
                            "duplicate key reported but no movement found".to_string(),
                        )
                    })?;
                let current = self
                    .ledger
                    .account_by_id(account.id)
                    .await?
                    .ok_or(TransferError::DestinationAccountUnavailable)?;
                info!(
                    account_id = account.id,
                    movement_id = winner.id,
                    key,
                    "concurrent duplicate settled first, replaying"
                );
                return Ok(SettlementOutcome {
                    movement_id: winner.id,
                    balance: current.balance,
                });
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        info!(
            account_id = account.id,
            movement_id,
            key,
            bank = %bank.code,
            amount = %order.amount,
            balance = %new_balance,
            "inbound credit settled"
        );
        Ok(SettlementOutcome {
            movement_id,
            balance: new_balance,
        })
    }
}
