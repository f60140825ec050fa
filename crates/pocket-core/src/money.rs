//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  THE ROUNDING PROBLEM                                                   │
//! │    Rounding tax to cents on every recompute compounds error across     │
//! │    hundreds of cart edits.                                             │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, rounded only when displayed            │
//! │    5.25 × 8.5% = 0.44625 (stored exactly)                              │
//! │    shown as $0.45                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pocket_core::money::Money;
//!
//! let price = Money::from_cents(150); // $1.50
//! let line = price * 3;               // $4.50
//! assert_eq!(line, Money::from_cents(450));
//! assert_eq!(line.to_string(), "$4.50");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Decimal places of the currency's minor unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value held as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal, not cents**: tax on a discounted subtotal produces fractions
///   of a cent (0.401625) that must survive recomputation untouched.
/// - **Signed**: `remaining_balance` goes negative on overpayment.
/// - **Rounding**: only [`Money::rounded`], [`Money::cents`] and `Display`
///   round, using Bankers Rounding.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InventoryItem.unit_price ──► CartLine.unit_price ──► line_total        │
/// │                                                                         │
/// │  Cart.subtotal ──► discount ──► tax ──► grand_total ──► TenderEntry    │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use pocket_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MINOR_UNIT_SCALE))
    }

    /// Returns the exact, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    #[inline]
    pub fn non_negative(self) -> Self {
        self.max(Money::ZERO)
    }

    /// Rounds to the currency's minor unit using Bankers Rounding.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Round half to even: 0.125 → 0.12, 0.135 → 0.14                    │
    /// │  No systematic upward bias over millions of receipts               │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Presentation only. Never feed a rounded value back into a total.
    ///
    /// ## Example
    /// ```rust
    /// use pocket_core::money::Money;
    ///
    /// let total: Money = "5.69625".parse().unwrap();
    /// assert_eq!(total.rounded(), Money::from_cents(570));
    /// ```
    pub fn rounded(&self) -> Self {
        let mut value = self
            .0
            .round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointNearestEven);
        value.rescale(MINOR_UNIT_SCALE);
        Money(value)
    }

    /// Returns the rounded value in cents.
    ///
    /// ## Example
    /// ```rust
    /// use pocket_core::money::Money;
    ///
    /// let tax: Money = "0.44625".parse().unwrap();
    /// assert_eq!(tax.cents(), 45);
    /// ```
    pub fn cents(&self) -> i64 {
        // Mantissa of a 2-dp value fits comfortably in i64 for any till amount
        self.rounded().0.mantissa() as i64
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Calculates tax on this amount, exactly.
    ///
    /// ## Example
    /// ```rust
    /// use pocket_core::money::Money;
    /// use pocket_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(525);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(850));
    /// assert_eq!(tax.amount().to_string(), "0.446250");
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.as_fraction())
    }

    /// Returns `percent`% of this amount (`self × percent / 100`).
    pub fn percentage(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to two places.
///
/// ## Note
/// Localised currency formatting belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}${}", sign, rounded.abs())
    }
}

/// Parses a plain decimal string such as `"12.50"`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Decimal>()
            .map(Money)
            .map_err(|e| ValidationError::invalid_format("amount", e.to_string()))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
