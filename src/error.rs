//! Lottery error types with HTTP status code mapping.
//!
//! [`LootpotError`] is the single error type shared by the domain, service
//! and API layers. Each variant belongs to an [`ErrorKind`], carries a stable
//! numeric code, and maps to an HTTP status with a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Address, Amount, PoolId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4002,
///     "kind": "funds",
///     "message": "deposit 5 is below the pool minimum 10"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, category and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
}

/// Coarse error category surfaced to callers next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed configuration or request.
    Validation,
    /// Operation not allowed in the current lifecycle state.
    State,
    /// Caller is not permitted to perform the operation.
    Authorization,
    /// Paid or deposited amount is insufficient.
    Funds,
    /// Randomness provider could not answer.
    Oracle,
    /// Referenced pool or entry does not exist.
    NotFound,
    /// Unexpected server-side failure.
    Internal,
}

/// Error enum for every rejected lottery operation.
///
/// # Error Code Ranges
///
/// | Range     | Category      | HTTP Status                  |
/// |-----------|---------------|------------------------------|
/// | 1000–1999 | Validation    | 400 Bad Request              |
/// | 2000–2999 | State / Found | 409 Conflict / 404 Not Found |
/// | 3000–3999 | Server        | 500 / 503                    |
/// | 4000–4999 | Funds         | 402 Payment Required / 422   |
/// | 5000–5999 | Authorization | 403 Forbidden                |
#[derive(Debug, thiserror::Error)]
pub enum LootpotError {
    /// Pool configuration violates an invariant.
    #[error("invalid pool config: {0}")]
    InvalidConfig(String),

    /// Request could not be parsed or is missing data.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Creation fee paid is below the registry's flat fee.
    #[error("insufficient creation fee: paid {paid}, required {required}")]
    InsufficientFee {
        /// Amount paid by the creator.
        paid: Amount,
        /// Flat fee configured on the registry.
        required: Amount,
    },

    /// Deposit is below the pool minimum.
    #[error("deposit {amount} is below the pool minimum {minimum}")]
    BelowMinimum {
        /// Deposited amount.
        amount: Amount,
        /// Pool minimum participation.
        minimum: Amount,
    },

    /// Registry index is past the end of the pool list.
    #[error("pool index {index} out of range (count {count})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current pool count.
        count: usize,
    },

    /// Pool with the given ID is not registered.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolId),

    /// Join attempted on an ended or expired pool.
    #[error("pool {0} is not active")]
    InactivePool(PoolId),

    /// Address already holds a record in this pool.
    #[error("{0} already participated in this pool")]
    DuplicateParticipant(Address),

    /// `end_pool` called before the end time.
    #[error("pool has not ended yet; ends at {end_time}")]
    NotYetExpired {
        /// Scheduled end of the pool.
        end_time: chrono::DateTime<chrono::Utc>,
    },

    /// `end_pool` called on an ended pool.
    #[error("pool already ended")]
    AlreadyEnded,

    /// Emergency withdrawal attempted on an active pool.
    #[error("pool is still active")]
    StillActive,

    /// Caller does not hold the role the operation requires.
    #[error("caller {0} is not authorized for this operation")]
    Unauthorized(Address),

    /// Randomness provider failed to answer.
    #[error("randomness oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// Ledger arithmetic overflowed.
    #[error("ledger arithmetic overflow")]
    Overflow,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LootpotError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) | Self::InvalidRequest(_) => ErrorKind::Validation,
            Self::InsufficientFee { .. } | Self::BelowMinimum { .. } => ErrorKind::Funds,
            Self::IndexOutOfRange { .. } | Self::PoolNotFound(_) => ErrorKind::NotFound,
            Self::InactivePool(_)
            | Self::DuplicateParticipant(_)
            | Self::NotYetExpired { .. }
            | Self::AlreadyEnded
            | Self::StillActive => ErrorKind::State,
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::OracleUnavailable(_) => ErrorKind::Oracle,
            Self::Overflow | Self::PersistenceError(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidConfig(_) => 1002,
            Self::PoolNotFound(_) => 2001,
            Self::IndexOutOfRange { .. } => 2002,
            Self::InactivePool(_) => 2101,
            Self::DuplicateParticipant(_) => 2102,
            Self::NotYetExpired { .. } => 2103,
            Self::AlreadyEnded => 2104,
            Self::StillActive => 2105,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Overflow => 3002,
            Self::OracleUnavailable(_) => 3100,
            Self::InsufficientFee { .. } => 4001,
            Self::BelowMinimum { .. } => 4002,
            Self::Unauthorized(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Self::PoolNotFound(_) | Self::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            Self::InactivePool(_)
            | Self::DuplicateParticipant(_)
            | Self::NotYetExpired { .. }
            | Self::AlreadyEnded
            | Self::StillActive => StatusCode::CONFLICT,
            Self::InsufficientFee { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::BelowMinimum { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::OracleUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Overflow | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for LootpotError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                kind: self.kind(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_map_to_conflict() {
        let err = LootpotError::AlreadyEnded;
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn oracle_error_is_its_own_kind() {
        let err = LootpotError::OracleUnavailable("timeout".to_string());
        assert_eq!(err.kind(), ErrorKind::Oracle);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn insufficient_fee_message_names_both_amounts() {
        let err = LootpotError::InsufficientFee {
            paid: Amount::new(5),
            required: Amount::new(10),
        };
        assert_eq!(err.kind(), ErrorKind::Funds);
        assert_eq!(err.error_code(), 4001);
        assert_eq!(err.to_string(), "insufficient creation fee: paid 5, required 10");
    }
}
