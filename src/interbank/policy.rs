//! Call policies for counterparty banks: retry backoff and circuit breaking
//!
//! Breakers are per bank code. Only transient failures (no HTTP exchange
//! completed, or throttling) count toward opening; a completed exchange of
//! any kind resets the streak. An open breaker rejects until the cooldown
//! elapses, then lets exactly one probe through: success closes it, failure
//! reopens it for another cooldown.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::InterbankConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &InterbankConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_secs(config.retry_base_delay_secs),
        }
    }

    /// Delay before the retry following `attempt` (1-based); doubles each retry.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay * factor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "closed"),
            BreakerState::Open => write!(f, "open"),
            BreakerState::HalfOpen => write!(f, "half-open"),
        }
    }
}

struct Circuit {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }
}

pub struct BreakerRegistry {
    circuits: DashMap<String, Circuit>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl BreakerRegistry {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            circuits: DashMap::new(),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn from_config(config: &InterbankConfig) -> Self {
        Self::new(
            config.breaker_failure_threshold,
            Duration::from_secs(config.breaker_cooldown_secs),
        )
    }

    /// Whether a call to this bank may go out now. Transitions an expired
    /// open circuit to half-open and admits the caller as the probe.
    pub fn check(&self, bank_code: &str) -> bool {
        let mut circuit = self.circuits.entry(bank_code.to_string()).or_default();
        match circuit.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                if circuit
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.cooldown)
                {
                    info!(bank = bank_code, "circuit breaker half-open, probing");
                    circuit.state = BreakerState::HalfOpen;
                    true
                } else {
                    false
                }
            }
            // One probe at a time; the probe outcome decides the next state
            BreakerState::HalfOpen => false,
        }
    }

    /// An HTTP exchange completed (accepted or refused): the bank is up.
    pub fn record_success(&self, bank_code: &str) {
        let mut circuit = self.circuits.entry(bank_code.to_string()).or_default();
        if circuit.state != BreakerState::Closed {
            info!(bank = bank_code, "circuit breaker closing");
        }
        circuit.state = BreakerState::Closed;
        circuit.consecutive_failures = 0;
        circuit.opened_at = None;
    }

    pub fn record_failure(&self, bank_code: &str) {
        let mut circuit = self.circuits.entry(bank_code.to_string()).or_default();
        match circuit.state {
            BreakerState::Closed => {
                circuit.consecutive_failures += 1;
                if circuit.consecutive_failures >= self.failure_threshold {
                    warn!(
                        bank = bank_code,
                        failures = circuit.consecutive_failures,
                        cooldown_secs = self.cooldown.as_secs(),
                        "circuit breaker opening"
                    );
                    circuit.state = BreakerState::Open;
                    circuit.opened_at = Some(Instant::now());
                }
            }
            BreakerState::HalfOpen => {
                warn!(bank = bank_code, "probe failed, circuit breaker reopening");
                circuit.state = BreakerState::Open;
                circuit.opened_at = Some(Instant::now());
            }
            BreakerState::Open => {
                circuit.opened_at = Some(Instant::now());
            }
        }
    }

    pub fn state(&self, bank_code: &str) -> BreakerState {
        self.circuits
            .get(bank_code)
            .map(|circuit| circuit.state)
            .unwrap_or(BreakerState::Closed)
    }

    #[cfg(test)]
    pub fn force_open(&self, bank_code: &str) {
        let mut circuit = self.circuits.entry(bank_code.to_string()).or_default();
        circuit.state = BreakerState::Open;
        circuit.opened_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BreakerRegistry {
        BreakerRegistry::new(3, Duration::from_millis(50))
    }

    #[test]
    fn test_delay_doubles_per_retry() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
    }

    #[test]
    fn test_starts_closed_and_allows() {
        let breakers = registry();
        assert_eq!(breakers.state("OTRO"), BreakerState::Closed);
        assert!(breakers.check("OTRO"));
    }

    #[test]
    fn test_opens_at_threshold_and_rejects() {
        let breakers = registry();
        for _ in 0..2 {
            breakers.record_failure("OTRO");
            assert_eq!(breakers.state("OTRO"), BreakerState::Closed);
        }
        breakers.record_failure("OTRO");
        assert_eq!(breakers.state("OTRO"), BreakerState::Open);
        assert!(!breakers.check("OTRO"));
    }

    #[test]
    fn test_completed_exchange_resets_streak() {
        let breakers = registry();
        breakers.record_failure("OTRO");
        breakers.record_failure("OTRO");
        breakers.record_success("OTRO");
        breakers.record_failure("OTRO");
        breakers.record_failure("OTRO");
        assert_eq!(breakers.state("OTRO"), BreakerState::Closed);
    }

    #[test]
    fn test_single_probe_after_cooldown() {
        let breakers = registry();
        for _ in 0..3 {
            breakers.record_failure("OTRO");
        }
        assert!(!breakers.check("OTRO"));

        std::thread::sleep(Duration::from_millis(60));
        assert!(breakers.check("OTRO"));
        assert_eq!(breakers.state("OTRO"), BreakerState::HalfOpen);
        // Second caller is held back while the probe is out
        assert!(!breakers.check("OTRO"));
    }

    #[test]
    fn test_probe_success_closes() {
        let breakers = registry();
        for _ in 0..3 {
            breakers.record_failure("OTRO");
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(breakers.check("OTRO"));
        breakers.record_success("OTRO");
        assert_eq!(breakers.state("OTRO"), BreakerState::Closed);
        assert!(breakers.check("OTRO"));
    }

    #[test]
    fn test_probe_failure_reopens() {
        let breakers = registry();
        for _ in 0..3 {
            breakers.record_failure("OTRO");
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(breakers.check("OTRO"));
        breakers.record_failure("OTRO");
        assert_eq!(breakers.state("OTRO"), BreakerState::Open);
        assert!(!breakers.check("OTRO"));
    }

    #[test]
    fn test_forced_open_rejects_then_probes_after_cooldown() {
        let breakers = registry();
        breakers.force_open("OTRO");
        assert_eq!(breakers.state("OTRO"), BreakerState::Open);
        assert!(!breakers.check("OTRO"));

        std::thread::sleep(Duration::from_millis(60));
        assert!(breakers.check("OTRO"));
        assert_eq!(breakers.state("OTRO"), BreakerState::HalfOpen);
    }

    #[test]
    fn test_breakers_are_per_bank() {
        let breakers = registry();
        for _ in 0..3 {
            breakers.record_failure("OTRO");
        }
        assert_eq!(breakers.state("OTRO"), BreakerState::Open);
        assert_eq!(breakers.state("NORTE"), BreakerState::Closed);
        assert!(breakers.check("NORTE"));
    }
}
