//! API response types and error codes
//!
//! - `ApiResponse<T>`: unified response wrapper
//! - `ApiError`: error half of [`ApiResult`], renders as the wrapper with
//!   a null data field
//! - `error_codes`: standard error code constants

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::TransferError;

/// Unified API response wrapper
///
/// All enveloped responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
///
/// The inbound settlement endpoint is the one exception: it answers with
/// the bare interbank acknowledgement so counterparty banks can parse it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const AMOUNT_OVER_LIMIT: i32 = 1003;

    // Auth errors (2xxx)
    pub const AUTH_FAILED: i32 = 2002;

    // Resource errors (4xxx)
    pub const ORIGIN_ACCOUNT_NOT_FOUND: i32 = 4041;
    pub const DESTINATION_ACCOUNT_NOT_FOUND: i32 = 4042;
    pub const DESTINATION_BANK_NOT_FOUND: i32 = 4043;
    pub const ORIGIN_BANK_NOT_FOUND: i32 = 4044;
    pub const EXTERNAL_REJECTION: i32 = 4221;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const NETWORK_ERROR: i32 = 5031;
    pub const TIMEOUT: i32 = 5041;
}

/// Handler error carrying the HTTP status plus the envelope code and message.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    /// Shorthand for early returns from `ApiResult` handlers.
    pub fn into_err<T>(self) -> ApiResult<T> {
        Err(self)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let code = match &e {
            TransferError::InvalidRequest(_) => error_codes::INVALID_PARAMETER,
            TransferError::InsufficientBalance => error_codes::INSUFFICIENT_BALANCE,
            TransferError::AmountOverLimit(_) => error_codes::AMOUNT_OVER_LIMIT,
            TransferError::InvalidApiKey => error_codes::AUTH_FAILED,
            TransferError::OriginAccountUnavailable => error_codes::ORIGIN_ACCOUNT_NOT_FOUND,
            TransferError::DestinationAccountUnavailable => {
                error_codes::DESTINATION_ACCOUNT_NOT_FOUND
            }
            TransferError::DestinationBankUnavailable(_) => error_codes::DESTINATION_BANK_NOT_FOUND,
            TransferError::OriginBankUnavailable(_) => error_codes::ORIGIN_BANK_NOT_FOUND,
            TransferError::ExternalRejection(_) => error_codes::EXTERNAL_REJECTION,
            TransferError::NetworkError => error_codes::NETWORK_ERROR,
            TransferError::Timeout => error_codes::TIMEOUT,
            TransferError::Unexpected(_) => error_codes::INTERNAL_ERROR,
        };
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.code, self.msg);
        (self.status, Json(body)).into_response()
    }
}

/// Result type for enveloped handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap a success payload into the envelope.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success(42);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["msg"], "ok");
        assert_eq!(json["data"], 42);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let resp =
            ApiResponse::<()>::error(error_codes::INSUFFICIENT_BALANCE, "Saldo insuficiente");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], 1002);
        assert_eq!(json["msg"], "Saldo insuficiente");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_transfer_error_mapping() {
        let err: ApiError = TransferError::InsufficientBalance.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);
        assert_eq!(err.msg, "Saldo insuficiente");

        let err: ApiError = TransferError::InvalidApiKey.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, error_codes::AUTH_FAILED);

        let err: ApiError = TransferError::Timeout.into();
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.code, error_codes::TIMEOUT);

        let err: ApiError = TransferError::DestinationBankUnavailable("OTRO".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::DESTINATION_BANK_NOT_FOUND);

        let err: ApiError = TransferError::NetworkError.into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, error_codes::NETWORK_ERROR);
    }
}
