//! # Session Error Type
//!
//! Unified error type for checkout session commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Pocket POS                             │
//! │                                                                         │
//! │  Cashier action                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutSession method ── SessionResult<T>                            │
//! │       │                                                                 │
//! │       ├── CoreError        (cart / ledger refused the transition)      │
//! │       ├── ValidationError  (bad discount, bad item record)             │
//! │       ├── DbError          (lookup failed)                             │
//! │       └── Persistence      (sale not saved, state rolled back)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UI reads error.code() and error.to_string()                           │
//! │  Retry button shown when error.is_retryable()                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use pocket_core::{CoreError, ValidationError};
use pocket_db::DbError;

/// Errors surfaced by [`CheckoutSession`](crate::session::CheckoutSession)
/// and the other orchestration helpers.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The cart or payment ledger refused the transition.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input failed a boundary check.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No item matches the scanned or typed key.
    #[error("Item not found: {key}")]
    ItemNotFound { key: String },

    /// The item has no stock on hand.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// The cart already holds every unit on hand.
    #[error("Only {stock} units of {name} available")]
    StockLimitReached { name: String, stock: i64 },

    /// A finalize is in flight; the sale is locked until it settles.
    #[error("Checkout in progress, please wait")]
    Finalizing,

    /// The finalized sale could not be saved. Cart and tenders were
    /// restored, so the cashier can retry.
    #[error("Could not save sale: {reason}")]
    Persistence { reason: String },

    /// Database error outside of finalize (lookups, reports).
    #[error(transparent)]
    Database(#[from] DbError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Machine-readable error codes for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    CartError,
    InsufficientStock,
    PaymentError,
    Busy,
    PersistenceFailed,
    DatabaseError,
    ConfigError,
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::Core(err) => match err {
                CoreError::CheckoutBlocked(_) => ErrorCode::CartError,
                CoreError::InvalidPaymentAmount { .. }
                | CoreError::TenderIndexOutOfRange { .. }
                | CoreError::IncompletePayment { .. }
                | CoreError::AlreadyFinalized => ErrorCode::PaymentError,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            SessionError::Validation(_) => ErrorCode::ValidationError,
            SessionError::ItemNotFound { .. } => ErrorCode::NotFound,
            SessionError::OutOfStock { .. } | SessionError::StockLimitReached { .. } => {
                ErrorCode::InsufficientStock
            }
            SessionError::Finalizing => ErrorCode::Busy,
            SessionError::Persistence { .. } => ErrorCode::PersistenceFailed,
            SessionError::Database(DbError::NotFound { .. }) => ErrorCode::NotFound,
            SessionError::Database(_) => ErrorCode::DatabaseError,
            SessionError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Whether the same request may succeed if simply tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Persistence { .. } | SessionError::Finalizing => true,
            SessionError::Database(err) => err.is_transient(),
            _ => false,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SessionError::Config(message.into())
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pocket_core::{CheckoutIssue, Money};

    #[test]
    fn test_codes() {
        let blocked = SessionError::from(CoreError::CheckoutBlocked(vec![CheckoutIssue::EmptyCart]));
        assert_eq!(blocked.code(), ErrorCode::CartError);
        assert_eq!(blocked.to_string(), "Checkout blocked: Cart is empty");

        let short = SessionError::from(CoreError::IncompletePayment {
            remaining: Money::from_cents(800),
        });
        assert_eq!(short.code(), ErrorCode::PaymentError);

        assert_eq!(SessionError::Finalizing.code(), ErrorCode::Busy);
    }

    #[test]
    fn test_retryable() {
        assert!(SessionError::Persistence {
            reason: "offline".to_string()
        }
        .is_retryable());
        assert!(SessionError::Database(DbError::PoolExhausted).is_retryable());
        assert!(!SessionError::OutOfStock {
            name: "Tissue Box".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::PersistenceFailed).unwrap();
        assert_eq!(json, "\"PERSISTENCE_FAILED\"");
    }
}
