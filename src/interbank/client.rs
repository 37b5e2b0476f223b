//! HTTP gateway to counterparty banks
//!
//! One `send_transfer` call covers the whole policy chain: circuit breaker
//! check, up to `max_attempts` HTTP attempts with doubling backoff, and
//! classification of whatever came back into a [`CallOutcome`]. Transient
//! means no usable HTTP exchange happened (connect failure, timeout, 429);
//! everything else is final on the first attempt.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::InterbankConfig;
use crate::registry::ExternalBank;

use super::policy::{BreakerRegistry, BreakerState, RetryPolicy};
use super::types::{
    CallOutcome, InterbankAck, InterbankTransfer, HEADER_API_KEY, HEADER_IDEMPOTENCY_KEY,
};

/// Joins base URL and endpoint with exactly one separating slash.
pub fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[async_trait]
pub trait BankClient: Send + Sync {
    /// Pushes a transfer order to the counterparty, retries included.
    async fn send_transfer(&self, bank: &ExternalBank, transfer: &InterbankTransfer)
        -> CallOutcome;

    /// Checks that the destination account exists at the counterparty.
    /// Banks without a validation endpoint are assumed valid; with one
    /// configured, only a 2xx answer counts as valid.
    async fn validate_account(&self, bank: &ExternalBank, account_number: &str) -> bool;
}

enum Attempt {
    Final(CallOutcome),
    /// Worth retrying; carries the classification used if retries run out.
    Transient(CallOutcome),
}

pub struct HttpBankClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    breakers: BreakerRegistry,
}

impl HttpBankClient {
    pub fn new(config: &InterbankConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.call_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            retry: RetryPolicy::from_config(config),
            breakers: BreakerRegistry::from_config(config),
        })
    }

    pub fn breaker_state(&self, bank_code: &str) -> BreakerState {
        self.breakers.state(bank_code)
    }

    async fn attempt_transfer(
        &self,
        url: &str,
        bank: &ExternalBank,
        transfer: &InterbankTransfer,
    ) -> Attempt {
        let result = self
            .http
            .post(url)
            .header(HEADER_API_KEY, &bank.api_key)
            .header(HEADER_IDEMPOTENCY_KEY, &transfer.idempotency_key)
            .json(transfer)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(bank = %bank.code, "transfer call timed out");
                return Attempt::Transient(CallOutcome::Timeout);
            }
            Err(e) => {
                warn!(bank = %bank.code, error = %e, "transfer call could not reach counterparty");
                return Attempt::Transient(CallOutcome::NetworkError);
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(bank = %bank.code, "counterparty throttling");
            return Attempt::Transient(CallOutcome::NetworkError);
        }

        if status.is_success() {
            return match response.json::<InterbankAck>().await {
                Ok(ack) if ack.success => Attempt::Final(CallOutcome::Accepted {
                    // The counterparty may omit its transaction id
                    transaction_id: ack.transaction_id.unwrap_or_default(),
                }),
                Ok(ack) => Attempt::Final(CallOutcome::Rejected {
                    reason: ack
                        .message
                        .unwrap_or_else(|| "Banco externo rechazó la transferencia".to_string()),
                }),
                Err(e) => {
                    // 2xx with an unreadable body: retry and let the
                    // counterparty's idempotency replay the real answer
                    warn!(bank = %bank.code, error = %e, "unreadable acknowledgement body");
                    Attempt::Transient(CallOutcome::NetworkError)
                }
            };
        }

        let reason = match response.json::<InterbankAck>().await {
            Ok(ack) => ack
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            Err(_) => format!("HTTP {}", status.as_u16()),
        };
        Attempt::Final(CallOutcome::Rejected { reason })
    }
}

#[async_trait]
impl BankClient for HttpBankClient {
    async fn send_transfer(
        &self,
        bank: &ExternalBank,
        transfer: &InterbankTransfer,
    ) -> CallOutcome {
        let url = join_url(&bank.base_url, &bank.transfer_endpoint);
        let mut last = CallOutcome::NetworkError;

        for attempt in 1..=self.retry.max_attempts {
            if !self.breakers.check(&bank.code) {
                debug!(bank = %bank.code, "circuit open, not calling counterparty");
                return CallOutcome::NetworkError;
            }

            match self.attempt_transfer(&url, bank, transfer).await {
                Attempt::Final(outcome) => {
                    self.breakers.record_success(&bank.code);
                    return outcome;
                }
                Attempt::Transient(outcome) => {
                    self.breakers.record_failure(&bank.code);
                    last = outcome;
                    if attempt < self.retry.max_attempts {
                        let delay = self.retry.delay_after(attempt);
                        debug!(
                            bank = %bank.code,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying transfer call"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        last
    }

    async fn validate_account(&self, bank: &ExternalBank, account_number: &str) -> bool {
        let Some(endpoint) = bank.validation_endpoint.as_deref() else {
            return true;
        };
        let url = join_url(&join_url(&bank.base_url, endpoint), account_number);

        match self
            .http
            .get(&url)
            .header(HEADER_API_KEY, &bank.api_key)
            .send()
            .await
        {
            Ok(response) => {
                let valid = response.status().is_success();
                if !valid {
                    debug!(
                        bank = %bank.code,
                        account = account_number,
                        status = response.status().as_u16(),
                        "counterparty did not validate the account"
                    );
                }
                valid
            }
            Err(e) => {
                // A configured endpoint we cannot reach counts as invalid;
                // only banks without one skip the check entirely
                warn!(bank = %bank.code, error = %e, "validation call failed");
                false
            }
        }
    }
}

/// Scriptable stand-in for orchestrator tests: outcomes are dequeued per
/// call, every order is recorded.
#[derive(Default)]
pub struct MockBankClient {
    script: Mutex<VecDeque<CallOutcome>>,
    calls: Mutex<Vec<InterbankTransfer>>,
    invalid_accounts: Mutex<HashSet<String>>,
}

impl MockBankClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, outcome: CallOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    pub async fn mark_invalid(&self, account_number: &str) {
        self.invalid_accounts
            .lock()
            .await
            .insert(account_number.to_string());
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn last_call(&self) -> Option<InterbankTransfer> {
        self.calls.lock().await.last().cloned()
    }
}

#[async_trait]
impl BankClient for MockBankClient {
    async fn send_transfer(
        &self,
        _bank: &ExternalBank,
        transfer: &InterbankTransfer,
    ) -> CallOutcome {
        self.calls.lock().await.push(transfer.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(CallOutcome::NetworkError)
    }

    async fn validate_account(&self, _bank: &ExternalBank, account_number: &str) -> bool {
        !self.invalid_accounts.lock().await.contains(account_number)
    }
}
