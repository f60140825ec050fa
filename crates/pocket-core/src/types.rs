//! # Domain Types
//!
//! Core domain types used throughout Pocket POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │  TenderEntry    │   │ FinalizedTrans- │       │
//! │  │  ─────────────  │   │  ─────────────  │   │ action          │       │
//! │  │  item_id        │   │  method         │   │  ─────────────  │       │
//! │  │  sku / barcode  │   │  amount         │   │  receipt_id     │       │
//! │  │  unit_price     │   └─────────────────┘   │  lines, tenders │       │
//! │  │  stock          │                         │  totals         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │    Discount     │   │ PaymentMethod   │       │
//! │  │  bps (u32)      │   │  value + type   │   │  cash, visa,    │       │
//! │  │  850 = 8.5%     │   │  amount | pct   │   │  mastercard ... │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 850 bps = 8.5%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an exact fraction (850 bps → 0.0850).
    #[inline]
    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// Returns the rate as a percentage (850 bps → 8.50).
    #[inline]
    pub fn as_percentage(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        crate::DEFAULT_TAX_RATE
    }
}

/// Parses a percentage such as `"8.5"` or `"8.5%"`.
impl FromStr for TaxRate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pct: Decimal = s
            .trim()
            .trim_end_matches('%')
            .parse()
            .map_err(|_| ValidationError::invalid_format("tax_rate", "must be a percentage"))?;

        let mut bps = (pct * Decimal::ONE_HUNDRED).round();
        bps.rescale(0);

        let bps = u32::try_from(bps.mantissa())
            .map_err(|_| ValidationError::invalid_format("tax_rate", "must not be negative"))?;
        validation::validate_tax_rate_bps(bps)?;

        Ok(TaxRate(bps))
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a cart-level discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Fixed currency amount off the subtotal.
    #[default]
    Amount,
    /// Percentage of the subtotal (0-100).
    Percentage,
}

/// A validated cart-level discount.
///
/// Construction enforces `value >= 0` and, for percentages, `value <= 100`,
/// so the cart reducer never sees an invalid discount.
///
/// ## Example
/// ```rust
/// use pocket_core::types::{Discount, DiscountType};
/// use rust_decimal::Decimal;
///
/// assert!(Discount::new(Decimal::TEN, DiscountType::Percentage).is_ok());
/// assert!(Discount::new(Decimal::from(150), DiscountType::Percentage).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    value: Decimal,
    kind: DiscountType,
}

impl Discount {
    /// Creates a discount after checking its bounds.
    pub fn new(value: Decimal, kind: DiscountType) -> Result<Self, ValidationError> {
        validation::validate_discount(value, kind)?;
        Ok(Discount { value, kind })
    }

    /// Fixed amount off.
    pub fn amount(amount: Money) -> Result<Self, ValidationError> {
        Discount::new(amount.amount(), DiscountType::Amount)
    }

    /// Percentage off.
    pub fn percentage(percent: Decimal) -> Result<Self, ValidationError> {
        Discount::new(percent, DiscountType::Percentage)
    }

    /// No discount (zero amount).
    pub const fn none() -> Self {
        Discount {
            value: Decimal::ZERO,
            kind: DiscountType::Amount,
        }
    }

    /// The raw value, either currency or percent depending on [`Discount::kind`].
    pub const fn value(&self) -> Decimal {
        self.value
    }

    pub const fn kind(&self) -> DiscountType {
        self.kind
    }

    pub fn is_none(&self) -> bool {
        self.value.is_zero()
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::none()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Tender method.
///
/// The five built-in methods match the till's buttons. Any other name is
/// carried as [`PaymentMethod::Other`] so new tender types need no release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PaymentMethod {
    Cash,
    Visa,
    Mastercard,
    Amex,
    Debit,
    Other(String),
}

impl PaymentMethod {
    /// Stable identifier used in storage and reports.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Visa => "visa",
            PaymentMethod::Mastercard => "mastercard",
            PaymentMethod::Amex => "amex",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Other(name) => name,
        }
    }

    /// Label printed on receipts.
    pub fn display_name(&self) -> &str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Visa => "Visa",
            PaymentMethod::Mastercard => "Mastercard",
            PaymentMethod::Amex => "American Express",
            PaymentMethod::Debit => "Debit Card",
            PaymentMethod::Other(name) => name,
        }
    }

    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        let method = match id.as_str() {
            "" => return Err(ValidationError::required("payment method")),
            "cash" => PaymentMethod::Cash,
            "visa" => PaymentMethod::Visa,
            "mastercard" => PaymentMethod::Mastercard,
            "amex" => PaymentMethod::Amex,
            "debit" => PaymentMethod::Debit,
            _ => PaymentMethod::Other(id),
        };
        Ok(method)
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// An item record as returned by the inventory lookup collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Opaque identifier, unique within a cart.
    pub item_id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    pub unit_price: Money,

    /// Units on hand at lookup time.
    pub stock: i64,

    /// Per-item low-stock threshold.
    pub min_stock: Option<i64>,

    /// Per-item tax rate from the item schema.
    ///
    /// Stored but NOT applied: the cart charges one flat rate on the whole
    /// discounted subtotal.
    pub tax_rate: Option<TaxRate>,

    pub category_name: Option<String>,
}

impl InventoryItem {
    /// Creates an item with the required fields only.
    pub fn new(
        item_id: impl Into<String>,
        name: impl Into<String>,
        sku: impl Into<String>,
        unit_price: Money,
        stock: i64,
    ) -> Self {
        InventoryItem {
            item_id: item_id.into(),
            name: name.into(),
            sku: sku.into(),
            barcode: None,
            unit_price,
            stock,
            min_stock: None,
            tax_rate: None,
            category_name: None,
        }
    }

    /// Checks the record before it enters a cart.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.item_id.trim().is_empty() {
            return Err(ValidationError::required("item_id"));
        }
        validation::validate_item_name(&self.name)?;
        validation::validate_sku(&self.sku)?;
        validation::validate_price(self.unit_price)?;
        validation::validate_stock(self.stock)?;
        if let Some(barcode) = &self.barcode {
            validation::validate_barcode(barcode)?;
        }
        Ok(())
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// `stock <= min_stock`, falling back to `default_threshold`.
    pub fn is_low_stock(&self, default_threshold: i64) -> bool {
        self.stock <= self.min_stock.unwrap_or(default_threshold)
    }
}

// =============================================================================
// Tender Entry
// =============================================================================

/// One payment applied toward a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderEntry {
    pub method: PaymentMethod,
    pub amount: Money,
}

// =============================================================================
// Finalized Transaction
// =============================================================================

/// A line frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedLine {
    pub item_id: String,
    /// Name at time of sale (frozen).
    pub name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// unit_price × quantity, before discount and tax.
    pub line_total: Money,
}

/// Immutable record of a completed sale.
///
/// Carries everything reporting needs: priced lines, tenders and the
/// completion timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedTransaction {
    pub receipt_id: String,
    pub lines: Vec<FinalizedLine>,
    pub subtotal: Money,
    pub discount: Discount,
    /// Currency amount actually taken off the subtotal.
    pub discount_total: Money,
    pub tax_rate: TaxRate,
    pub tax: Money,
    pub grand_total: Money,
    pub tenders: Vec<TenderEntry>,
    pub total_tendered: Money,
    pub change_due: Money,
    pub completed_at: DateTime<Utc>,
}

impl FinalizedTransaction {
    /// Total units sold.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
