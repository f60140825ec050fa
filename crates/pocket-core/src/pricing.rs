//! # Pricing
//!
//! Discount and tax math shared by the cart and the payment ledger.
//!
//! ## Order of Operations
//! ```text
//! subtotal            Σ unit_price × quantity
//!    │
//!    ▼
//! discounted_subtotal max(0, subtotal − discount)
//!    │
//!    ▼
//! tax                 discounted_subtotal × tax_rate
//!    │
//!    ▼
//! grand_total         discounted_subtotal + tax
//! ```
//!
//! Nothing here rounds. Tax on a discounted subtotal is usually a fraction
//! of a cent and stays that way until it is displayed.

use serde::Serialize;

use crate::money::Money;
use crate::types::{Discount, DiscountType, TaxRate};

/// Derived cart totals. Always recomputed, never edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    /// Currency actually taken off (`subtotal − discounted_subtotal`).
    pub discount_total: Money,
    pub discounted_subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
}

/// Raw currency value of a discount against `subtotal`, before clamping.
pub fn discount_amount(subtotal: Money, discount: &Discount) -> Money {
    match discount.kind() {
        DiscountType::Amount => Money::from_decimal(discount.value()),
        DiscountType::Percentage => subtotal.percentage(discount.value()),
    }
}

/// Applies a discount, clamping the result at zero.
///
/// ## Example
/// ```rust
/// use pocket_core::money::Money;
/// use pocket_core::pricing::apply_discount;
/// use pocket_core::types::Discount;
///
/// let over = Discount::amount(Money::from_cents(1000)).unwrap();
/// assert_eq!(apply_discount(Money::from_cents(525), &over), Money::ZERO);
/// ```
pub fn apply_discount(subtotal: Money, discount: &Discount) -> Money {
    (subtotal - discount_amount(subtotal, discount)).non_negative()
}

#[inline]
pub fn tax_on(amount: Money, rate: TaxRate) -> Money {
    amount.calculate_tax(rate)
}

/// Computes every derived total from a subtotal.
pub fn compute_totals(subtotal: Money, discount: &Discount, rate: TaxRate) -> Totals {
    let discounted_subtotal = apply_discount(subtotal, discount);
    let tax = tax_on(discounted_subtotal, rate);

    Totals {
        subtotal,
        discount_total: subtotal - discounted_subtotal,
        discounted_subtotal,
        tax,
        grand_total: discounted_subtotal + tax,
    }
}
