//! # Error Types
//!
//! Domain-specific error types for pocket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pocket-core errors (this file)                                        │
//! │  ├── CoreError        - Blocked transitions (payment, checkout)        │
//! │  ├── CheckoutIssue    - One checkout violation (empty, stock)          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pocket-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  pocket-checkout errors                                                │
//! │  └── SessionError     - What the UI sees (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → UI                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error here is recoverable: it blocks the requested transition and
//! is reported to the cashier for correction.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The cart failed checkout validation.
    ///
    /// Carries every violation found, not just the first, so the cashier
    /// can fix them all in one pass.
    #[error("Checkout blocked: {}", join_issues(.0))]
    CheckoutBlocked(Vec<CheckoutIssue>),

    /// Tender amount is zero or negative.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// `remove_tender` was given a position that does not exist.
    #[error("Tender index {index} is out of range (have {len})")]
    TenderIndexOutOfRange { index: usize, len: usize },

    /// Finalize was attempted while a balance is still owed.
    ///
    /// ## User Workflow
    /// ```text
    /// Total $20.00, tendered $12.00
    ///      │
    ///      ▼
    /// finalize()
    ///      │
    ///      ▼
    /// IncompletePayment { remaining: $8.00 }
    ///      │
    ///      ▼
    /// UI shows: "Remaining balance $8.00"
    /// ```
    #[error("Payment incomplete: {remaining} still due")]
    IncompletePayment { remaining: Money },

    /// The ledger already produced its transaction.
    #[error("Transaction already finalized")]
    AlreadyFinalized,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Checkout Issue
// =============================================================================

/// A single reason the cart cannot proceed to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutIssue {
    /// No lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line asks for more units than the stock snapshot taken at add time.
    #[error("Insufficient stock for {name} ({sku}): available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        name: String,
        sku: String,
        available: i64,
        requested: i64,
    },
}

fn join_issues(issues: &[CheckoutIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the boundary, before a value reaches a cart or ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., non-numeric barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
