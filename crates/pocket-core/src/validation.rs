//! # Validation Module
//!
//! Input validation utilities for Pocket POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Mobile UI                                                    │
//! │  ├── Keypad input, empty-field checks                                  │
//! │  └── Immediate cashier feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain constructors (Rust)                                   │
//! │  ├── Discount::new, InventoryItem::validate, add_tender                │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── CHECK (stock >= 0)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pocket_core::validation::{validate_sku, validate_barcode};
//!
//! validate_sku("CC330ML").unwrap();
//! validate_barcode("1234567890123").unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DiscountType;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum digits in a scannable barcode.
pub const MIN_BARCODE_DIGITS: usize = 8;

/// Exclusive upper bound for any single keyed amount (price, tender, fixed
/// discount). Keeps every cart and ledger sum far inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn ensure_below_max(field: &str, value: Decimal) -> ValidationResult<()> {
    if value >= MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: "999999999.99".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use pocket_core::validation::validate_sku;
///
/// assert!(validate_sku("LAY50G").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates an item name: non-empty, at most 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Digits only
/// - At least [`MIN_BARCODE_DIGITS`] long (EAN-8 and up)
///
/// ## Example
/// ```rust
/// use pocket_core::validation::validate_barcode;
///
/// assert!(validate_barcode("12345678").is_ok());
/// assert!(validate_barcode("1234567").is_err());
/// assert!(validate_barcode("12345abc9").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::required("barcode"));
    }

    if !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("barcode", "must contain only digits"));
    }

    if barcode.len() < MIN_BARCODE_DIGITS {
        return Err(ValidationError::invalid_format(
            "barcode",
            format!("must be at least {MIN_BARCODE_DIGITS} digits"),
        ));
    }

    Ok(())
}

/// Validates a search query and returns it trimmed. Empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit price. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    ensure_below_max("price", price.amount())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a tender amount.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Payment: Add Tender                                                    │
/// │                                                                         │
/// │  Cashier keys amount: 12.00                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_tender_amount(12.00) ← THIS FUNCTION                         │
/// │       │                                                                 │
/// │       ├── amount <= 0? → Error: "payment amount must be positive"      │
/// │       ├── amount >= MAX_AMOUNT? → Error: out of range                  │
/// │       │                                                                 │
/// │       └── OK → Tender appended to the ledger                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_tender_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    ensure_below_max("payment amount", amount.amount())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: "0".to_string(),
            max: "10000".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount value against its type.
///
/// ## Rules
/// - Never negative
/// - Percentages at most 100
/// - Fixed amounts below [`MAX_AMOUNT`] (the cart clamps the result at zero)
pub fn validate_discount(value: Decimal, kind: DiscountType) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount".to_string(),
        });
    }

    if kind == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }

    if kind == DiscountType::Amount {
        ensure_below_max("discount", value)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("CC330ML").is_ok());
        assert!(validate_sku("TIS-200").is_ok());
        assert!(validate_sku("item_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Lay's Chips 50g").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("1234567890123").is_ok());
        assert!(validate_barcode("12345678").is_ok());
        assert!(validate_barcode("1234567").is_err());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("ABCDEFGH").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::ZERO).is_ok());
        assert!(validate_price(Money::from_cents(1099)).is_ok());
        assert!(validate_price(Money::from_cents(-100)).is_err());
        assert!(validate_price(Money::from_decimal(MAX_AMOUNT)).is_err());
    }

    #[test]
    fn test_validate_tender_amount() {
        assert!(validate_tender_amount(Money::from_cents(1)).is_ok());
        assert!(validate_tender_amount(Money::ZERO).is_err());
        assert!(validate_tender_amount(Money::from_cents(-500)).is_err());
        assert!(validate_tender_amount(Money::from_cents(99_999_999_999)).is_ok());
        assert!(validate_tender_amount(Money::from_decimal(MAX_AMOUNT)).is_err());
        assert!(validate_tender_amount(Money::from_decimal(Decimal::MAX)).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(850).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(Decimal::ZERO, DiscountType::Percentage).is_ok());
        assert!(validate_discount(Decimal::ONE_HUNDRED, DiscountType::Percentage).is_ok());
        assert!(validate_discount(Decimal::from(101), DiscountType::Percentage).is_err());
        assert!(validate_discount(Decimal::from(101), DiscountType::Amount).is_ok());
        assert!(validate_discount(Decimal::NEGATIVE_ONE, DiscountType::Amount).is_err());
    }

    #[test]
    fn test_search_query_trimmed() {
        assert_eq!(validate_search_query("  coke ").unwrap(), "coke");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }
}
