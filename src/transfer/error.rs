//! Transfer error catalog
//!
//! One kind per failure cause, each with a stable code and an HTTP status.
//! Operator-facing messages are Spanish, matching the catalog the
//! counterparty network already uses.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::registry::RegistryError;

#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation ===
    #[error("Cuenta origen inexistente o inactiva")]
    OriginAccountUnavailable,

    #[error("Cuenta destino inexistente o inactiva")]
    DestinationAccountUnavailable,

    #[error("Saldo insuficiente")]
    InsufficientBalance,

    /// Carries the bank code for logging; the message stays fixed.
    #[error("Banco destino no registrado o inactivo")]
    DestinationBankUnavailable(String),

    #[error("Banco origen no registrado o inactivo")]
    OriginBankUnavailable(String),

    #[error("API key inválida")]
    InvalidApiKey,

    #[error("El monto excede el límite permitido")]
    AmountOverLimit(Decimal),

    #[error("Solicitud inválida: {0}")]
    InvalidRequest(String),

    // === Counterparty ===
    /// The counterparty's own refusal message, when it sent one.
    #[error("{0}")]
    ExternalRejection(String),

    #[error("Error de red al contactar banco externo")]
    NetworkError,

    #[error("Timeout al contactar banco externo")]
    Timeout,

    // === System ===
    #[error("Error inesperado: {0}")]
    Unexpected(String),
}

impl TransferError {
    /// Stable error code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::OriginAccountUnavailable => "ORIGIN_ACCOUNT_UNAVAILABLE",
            TransferError::DestinationAccountUnavailable => "DESTINATION_ACCOUNT_UNAVAILABLE",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::DestinationBankUnavailable(_) => "DESTINATION_BANK_UNAVAILABLE",
            TransferError::OriginBankUnavailable(_) => "ORIGIN_BANK_UNAVAILABLE",
            TransferError::InvalidApiKey => "INVALID_API_KEY",
            TransferError::AmountOverLimit(_) => "AMOUNT_OVER_LIMIT",
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::ExternalRejection(_) => "EXTERNAL_REJECTION",
            TransferError::NetworkError => "NETWORK_ERROR",
            TransferError::Timeout => "TIMEOUT",
            TransferError::Unexpected(_) => "UNEXPECTED",
        }
    }

    /// HTTP status for the API layer
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidRequest(_) => 400,
            TransferError::InvalidApiKey => 401,
            TransferError::OriginAccountUnavailable
            | TransferError::DestinationAccountUnavailable
            | TransferError::DestinationBankUnavailable(_)
            | TransferError::OriginBankUnavailable(_) => 404,
            TransferError::InsufficientBalance
            | TransferError::AmountOverLimit(_)
            | TransferError::ExternalRejection(_) => 422,
            TransferError::NetworkError => 503,
            TransferError::Timeout => 504,
            TransferError::Unexpected(_) => 500,
        }
    }
}

impl From<LedgerError> for TransferError {
    fn from(e: LedgerError) -> Self {
        // Duplicate-scope errors are handled where the insert happens; any
        // that escape, and every other storage failure, are unexpected
        TransferError::Unexpected(e.to_string())
    }
}

impl From<RegistryError> for TransferError {
    fn from(e: RegistryError) -> Self {
        TransferError::Unexpected(e.to_string())
    }
}
