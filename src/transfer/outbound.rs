//! Outbound transfer orchestration
//!
//! Protocol: validate without touching anything, then debit and append the
//! movement inside one transaction, call the counterparty while that
//! transaction is still open, and commit only on an accepted
//! acknowledgement. Every other outcome rolls back, so no partial state is
//! ever observable; dropping the transaction handle mid-call (cancellation
//! included) rolls back too.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{InterbankConfig, LimitsConfig};
use crate::interbank::{BankClient, CallOutcome, InterbankTransfer};
use crate::ledger::{LedgerError, LedgerStore, Movement, MovementKind, NewMovement};
use crate::registry::BankRegistry;

use super::describe;
use super::error::TransferError;
use super::state::SendState;
use super::types::{SendOutcome, SendTransferRequest};

pub struct OutboundOrchestrator {
    ledger: Arc<dyn LedgerStore>,
    registry: Arc<dyn BankRegistry>,
    client: Arc<dyn BankClient>,
    own_bank_code: String,
    max_amount: Decimal,
}

impl OutboundOrchestrator {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        registry: Arc<dyn BankRegistry>,
        client: Arc<dyn BankClient>,
        interbank: &InterbankConfig,
        limits: &LimitsConfig,
    ) -> Self {
        Self {
            ledger,
            registry,
            client,
            own_bank_code: interbank.own_bank_code.clone(),
            max_amount: limits.max_transfer_amount,
        }
    }

    /// Runs the full send protocol for one transfer order.
    pub async fn send(&self, request: &SendTransferRequest) -> Result<SendOutcome, TransferError> {
        let account_id = request.origin_account_id;
        let key = request.idempotency_key.as_str();

        debug!(
            account_id,
            key,
            bank = %request.destination_bank_code,
            amount = %request.amount,
            state = %SendState::Validating,
            "outbound transfer requested"
        );

        // Replay wins over everything else: same scope, same result
        if let Some(prior) = self
            .ledger
            .movement_by_scope(account_id, key, MovementKind::TransferSent)
            .await?
        {
            return self.replay(account_id, prior).await;
        }

        if request.amount <= Decimal::ZERO {
            return Err(TransferError::InvalidRequest(
                "el monto debe ser mayor a cero".to_string(),
            ));
        }

        let account = self
            .ledger
            .account_by_id(account_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| {
                warn!(account_id, "origin account missing or inactive");
                TransferError::OriginAccountUnavailable
            })?;

        // Advisory pre-check; the authoritative one runs under the row lock
        if account.balance < request.amount {
            warn!(
                account_id,
                balance = %account.balance,
                requested = %request.amount,
                "insufficient balance"
            );
            return Err(TransferError::InsufficientBalance);
        }
        if request.amount > self.max_amount {
            return Err(TransferError::AmountOverLimit(self.max_amount));
        }

        let bank = self
            .registry
            .find_active(&request.destination_bank_code)
            .await?
            .ok_or_else(|| {
                warn!(bank = %request.destination_bank_code, "destination bank missing or inactive");
                TransferError::DestinationBankUnavailable(request.destination_bank_code.clone())
            })?;

        if !self
            .client
            .validate_account(&bank, &request.destination_account_number)
            .await
        {
            return Err(TransferError::DestinationAccountUnavailable);
        }

        let mut txn = self.ledger.begin().await?;

        let locked_balance = txn.balance_for_update(account_id).await?;
        if locked_balance < request.amount {
            warn!(account_id, key, "balance changed under us, rejecting");
            return Err(TransferError::InsufficientBalance);
        }

        let new_balance = txn.apply_delta(account_id, -request.amount).await?;
        let movement_id = match txn
            .append_movement(NewMovement {
                account_id,
                kind: MovementKind::TransferSent,
                amount: request.amount,
                description: describe(request.concept.as_deref(), "Transferencia Enviada"),
                idempotency_key: Some(key.to_string()),
                // Provisional; replaced by the counterparty transaction id
                external_ref: Some(format!(
                    "{}:{}",
                    bank.code, request.destination_account_number
                )),
            })
            .await
        {
            Ok(id) => id,
            Err(LedgerError::DuplicateIdempotency) => {
                // A concurrent duplicate committed first; its result stands
                txn.rollback().await?;
                let winner = self
                    .ledger
                    .movement_by_scope(account_id, key, MovementKind::TransferSent)
                    .await?
                    .ok_or_else(|| {
                        TransferError::Unexpected(
                            "duplicate key reported but no movement found".to_string(),
                        )
                    })?;
                return self.replay(account_id, winner).await;
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            account_id,
            key,
            movement_id,
            balance = %new_balance,
            state = %SendState::Debited,
            "debit held, calling counterparty"
        );

        let order = InterbankTransfer {
            origin_bank_code: self.own_bank_code.clone(),
            origin_account_number: account.account_number.clone(),
            destination_account_number: request.destination_account_number.clone(),
            amount: request.amount,
            concept: request.concept.clone(),
            idempotency_key: key.to_string(),
        };

        debug!(account_id, key, state = %SendState::AwaitingExternalAck, bank = %bank.code, "awaiting acknowledgement");
        match self.client.send_transfer(&bank, &order).await {
            CallOutcome::Accepted { transaction_id } => {
                txn.set_external_ref(movement_id, &format!("{}:{}", bank.code, transaction_id))
                    .await?;
                txn.commit().await?;
                info!(
                    account_id,
                    key,
                    movement_id,
                    transaction_id = %transaction_id,
                    balance = %new_balance,
                    state = %SendState::Committed,
                    "transfer committed"
                );
                Ok(SendOutcome {
                    movement_id,
                    balance: new_balance,
                    state: SendState::Committed,
                })
            }
            CallOutcome::Rejected { reason } => {
                txn.rollback().await?;
                warn!(account_id, key, reason = %reason, state = %SendState::RolledBack, "counterparty refused, debit rolled back");
                Err(TransferError::ExternalRejection(reason))
            }
            CallOutcome::NetworkError => {
                txn.rollback().await?;
                warn!(account_id, key, state = %SendState::RolledBack, "counterparty unreachable, debit rolled back");
                Err(TransferError::NetworkError)
            }
            CallOutcome::Timeout => {
                txn.rollback().await?;
                warn!(account_id, key, state = %SendState::RolledBack, "counterparty timed out, debit rolled back");
                Err(TransferError::Timeout)
            }
        }
    }

    /// Returns the already-committed result for this idempotency scope,
    /// with the balance as it stands now.
    async fn replay(
        &self,
        account_id: i64,
        prior: Movement,
    ) -> Result<SendOutcome, TransferError> {
        let account = self
            .ledger
            .account_by_id(account_id)
            .await?
            .ok_or(TransferError::OriginAccountUnavailable)?;
        info!(
            account_id,
            movement_id = prior.id,
            key = prior.idempotency_key.as_deref().unwrap_or_default(),
            "replaying committed transfer"
        );
        Ok(SendOutcome {
            movement_id: prior.id,
            balance: account.balance,
            state: SendState::Committed,
        })
    }
}
