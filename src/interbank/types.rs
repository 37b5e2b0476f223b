//! Wire types shared with counterparty banks
//!
//! Field names are camelCase on the wire so peers running the reference
//! deployment interoperate without a translation layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const HEADER_API_KEY: &str = "X-Api-Key";
pub const HEADER_IDEMPOTENCY_KEY: &str = "Idempotency-Key";

pub(crate) fn amount_positive(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_positive"));
    }
    Ok(())
}

/// Transfer order pushed to a counterparty bank; also the body this
/// service accepts on its own receive endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterbankTransfer {
    #[validate(length(min = 1, max = 16))]
    pub origin_bank_code: String,
    #[validate(length(min = 1, max = 34))]
    pub origin_account_number: String,
    #[validate(length(min = 1, max = 34))]
    pub destination_account_number: String,
    #[validate(custom(function = amount_positive))]
    pub amount: Decimal,
    #[validate(length(max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub idempotency_key: String,
}

/// Counterparty acknowledgement for a transfer order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterbankAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InterbankAck {
    pub fn accepted(transaction_id: impl Into<String>, new_balance: Decimal) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            new_balance: Some(new_balance),
            message: None,
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            new_balance: None,
            message: Some(message.into()),
        }
    }
}

/// Classified result of one `send_transfer` call, retries included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Counterparty committed the credit and returned its transaction id.
    Accepted { transaction_id: String },
    /// Definitive business refusal; retrying would not help.
    Rejected { reason: String },
    /// Could not complete an HTTP exchange (connect failures, throttling).
    NetworkError,
    /// Attempt deadline exceeded on the last try.
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_wire_field_names() {
        let transfer = InterbankTransfer {
            origin_bank_code: "BANKLINK".to_string(),
            origin_account_number: "ES11".to_string(),
            destination_account_number: "ES22".to_string(),
            amount: dec!(300),
            concept: Some("alquiler".to_string()),
            idempotency_key: "k-1".to_string(),
        };
        let json = serde_json::to_value(&transfer).unwrap();
        assert_eq!(json["originBankCode"], "BANKLINK");
        assert_eq!(json["originAccountNumber"], "ES11");
        assert_eq!(json["destinationAccountNumber"], "ES22");
        assert_eq!(json["idempotencyKey"], "k-1");
        assert_eq!(json["concept"], "alquiler");
    }

    #[test]
    fn test_concept_omitted_when_absent() {
        let transfer = InterbankTransfer {
            origin_bank_code: "BANKLINK".to_string(),
            origin_account_number: "ES11".to_string(),
            destination_account_number: "ES22".to_string(),
            amount: dec!(1),
            concept: None,
            idempotency_key: "k-1".to_string(),
        };
        let json = serde_json::to_value(&transfer).unwrap();
        assert!(json.get("concept").is_none());
    }

    #[test]
    fn test_ack_parses_counterparty_shape() {
        let ack: InterbankAck = serde_json::from_str(
            r#"{"success":true,"transactionId":"TX1","newBalance":"1050.00"}"#,
        )
        .unwrap();
        assert!(ack.success);
        assert_eq!(ack.transaction_id.as_deref(), Some("TX1"));
        assert_eq!(ack.new_balance, Some(dec!(1050.00)));
        assert!(ack.message.is_none());
    }

    #[test]
    fn test_refused_helper() {
        let ack = InterbankAck::refused("cuenta bloqueada");
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("cuenta bloqueada"));
        assert!(ack.transaction_id.is_none());
    }

    #[test]
    fn test_validation_limits() {
        let mut transfer = InterbankTransfer {
            origin_bank_code: "OTRO".to_string(),
            origin_account_number: "ES11".to_string(),
            destination_account_number: "ES22".to_string(),
            amount: dec!(50),
            concept: None,
            idempotency_key: "k-1".to_string(),
        };
        assert!(transfer.validate().is_ok());

        transfer.amount = Decimal::ZERO;
        assert!(transfer.validate().is_err());

        transfer.amount = dec!(50);
        transfer.idempotency_key = String::new();
        assert!(transfer.validate().is_err());

        transfer.idempotency_key = "k".repeat(81);
        assert!(transfer.validate().is_err());

        transfer.idempotency_key = "k".repeat(80);
        assert!(transfer.validate().is_ok());
    }
}
