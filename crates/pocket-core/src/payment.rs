//! # Payment Reconciliation
//!
//! Accumulates tenders against the cart's grand total and gates completion.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  add_tender  ┌──────────────┐  remaining ≤ tol  ┌─────────┐
//! │   │  Empty  │─────────────►│ Accumulating │──────────────────►│Satisfied│
//! │   └─────────┘              └──────────────┘◄──────────────────└────┬────┘
//! │                                             remove_tender          │
//! │                                                                    │ finalize
//! │                                                                    ▼
//! │                                                             ┌───────────┐
//! │                                                             │ Finalized │
//! │                                                             └───────────┘
//! │   Finalized is terminal: the next sale gets a fresh ledger.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger never stores the amount due. Every read takes the current
//! grand total, so edits to the cart between tenders are always reflected.
//!
//! ## Example
//! ```rust
//! use pocket_core::money::Money;
//! use pocket_core::payment::PaymentLedger;
//! use pocket_core::types::PaymentMethod;
//!
//! let due = Money::from_cents(2000);
//! let mut ledger = PaymentLedger::new();
//! ledger.add_tender(PaymentMethod::Cash, Money::from_cents(2500)).unwrap();
//!
//! assert!(ledger.can_finalize(due));
//! assert_eq!(ledger.change_due(due), Money::from_cents(500));
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cart::CartState;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{FinalizedTransaction, PaymentMethod, TenderEntry};
use crate::validation;

/// Where a ledger is in its lifecycle relative to an amount due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPhase {
    Empty,
    Accumulating,
    Satisfied,
    Finalized,
}

/// Ordered tenders for one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLedger {
    tenders: Vec<TenderEntry>,
    /// Largest remaining balance still treated as paid.
    tolerance: Money,
    finalized: bool,
}

impl PaymentLedger {
    /// Creates an empty ledger with the default one-cent tolerance.
    pub fn new() -> Self {
        PaymentLedger::with_tolerance(Self::default_tolerance())
    }

    pub fn with_tolerance(tolerance: Money) -> Self {
        PaymentLedger {
            tenders: Vec::new(),
            tolerance: tolerance.abs(),
            finalized: false,
        }
    }

    /// One minor unit (0.01).
    pub fn default_tolerance() -> Money {
        Money::from_cents(1)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Appends a tender.
    ///
    /// Overpayment is allowed and becomes change. Asking the cashier to
    /// confirm it is the caller's job (see [`PaymentLedger::would_overpay`]).
    pub fn add_tender(&mut self, method: PaymentMethod, amount: Money) -> CoreResult<()> {
        self.ensure_open()?;
        validation::validate_tender_amount(amount).map_err(|e| CoreError::InvalidPaymentAmount {
            reason: e.to_string(),
        })?;

        self.tenders.push(TenderEntry { method, amount });
        Ok(())
    }

    /// Removes and returns the tender at `index`.
    pub fn remove_tender(&mut self, index: usize) -> CoreResult<TenderEntry> {
        self.ensure_open()?;
        if index >= self.tenders.len() {
            return Err(CoreError::TenderIndexOutOfRange {
                index,
                len: self.tenders.len(),
            });
        }
        Ok(self.tenders.remove(index))
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.finalized {
            Err(CoreError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }

    // -------------------------------------------------------------------------
    // Derived reads
    // -------------------------------------------------------------------------

    pub fn tenders(&self) -> &[TenderEntry] {
        &self.tenders
    }

    pub fn tolerance(&self) -> Money {
        self.tolerance
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn total_tendered(&self) -> Money {
        self.tenders.iter().map(|t| t.amount).sum()
    }

    /// `due − total_tendered`. Negative when overpaid.
    pub fn remaining_balance(&self, due: Money) -> Money {
        due - self.total_tendered()
    }

    /// `max(0, total_tendered − due)`.
    pub fn change_due(&self, due: Money) -> Money {
        (self.total_tendered() - due).non_negative()
    }

    /// The sole gate for completing a sale.
    pub fn can_finalize(&self, due: Money) -> bool {
        self.remaining_balance(due) <= self.tolerance
    }

    /// Whether tendering `amount` now would exceed a balance that is still
    /// owed. Always false once the sale is covered.
    pub fn would_overpay(&self, due: Money, amount: Money) -> bool {
        let remaining = self.remaining_balance(due);
        remaining.is_positive() && amount > remaining
    }

    pub fn phase(&self, due: Money) -> PaymentPhase {
        if self.finalized {
            PaymentPhase::Finalized
        } else if self.tenders.is_empty() {
            PaymentPhase::Empty
        } else if self.can_finalize(due) {
            PaymentPhase::Satisfied
        } else {
            PaymentPhase::Accumulating
        }
    }

    // -------------------------------------------------------------------------
    // Finalize
    // -------------------------------------------------------------------------

    /// Converts the cart and tenders into a [`FinalizedTransaction`] and
    /// clears the cart.
    ///
    /// Either the record is produced and the cart cleared, or an error is
    /// returned and neither the cart nor the ledger changes.
    /// `next_receipt_id` is called only once every check has passed.
    ///
    /// ## Errors
    /// - [`CoreError::AlreadyFinalized`] on a second call
    /// - [`CoreError::CheckoutBlocked`] when the cart fails validation
    /// - [`CoreError::IncompletePayment`] when more than the tolerance is owed
    pub fn finalize<F>(
        &mut self,
        cart: &mut CartState,
        next_receipt_id: F,
        completed_at: DateTime<Utc>,
    ) -> CoreResult<FinalizedTransaction>
    where
        F: FnOnce() -> String,
    {
        self.ensure_open()?;
        cart.ensure_checkout_ready()?;

        let due = cart.grand_total();
        if !self.can_finalize(due) {
            return Err(CoreError::IncompletePayment {
                remaining: self.remaining_balance(due),
            });
        }

        let totals = *cart.totals();
        let transaction = FinalizedTransaction {
            receipt_id: next_receipt_id(),
            lines: cart.line_snapshots(),
            subtotal: totals.subtotal,
            discount: *cart.discount(),
            discount_total: totals.discount_total,
            tax_rate: cart.tax_rate(),
            tax: totals.tax,
            grand_total: totals.grand_total,
            tenders: self.tenders.clone(),
            total_tendered: self.total_tendered(),
            change_due: self.change_due(due),
            completed_at,
        };

        cart.clear();
        self.finalized = true;

        Ok(transaction)
    }
}

impl Default for PaymentLedger {
    fn default() -> Self {
        PaymentLedger::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutIssue;
    use crate::types::{InventoryItem, TaxRate};
    use rust_decimal::Decimal;

    fn due() -> Money {
        Money::from_cents(2000)
    }

    fn cart_totalling_20() -> CartState {
        let mut cart = CartState::new(TaxRate::zero());
        let item = InventoryItem::new("a", "Gift Basket", "GIFT", Money::from_cents(1000), 10);
        cart.add_item(&item);
        cart.add_item(&item);
        cart
    }

    #[test]
    fn test_cash_overpayment() {
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Cash, Money::from_cents(2500)).unwrap();

        assert_eq!(ledger.remaining_balance(due()), Money::from_cents(-500));
        assert_eq!(ledger.change_due(due()), Money::from_cents(500));
        assert!(ledger.can_finalize(due()));
        assert_eq!(ledger.phase(due()), PaymentPhase::Satisfied);
    }

    #[test]
    fn test_split_tender() {
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Visa, Money::from_cents(1200)).unwrap();
        assert_eq!(ledger.phase(due()), PaymentPhase::Accumulating);

        ledger.add_tender(PaymentMethod::Cash, Money::from_cents(800)).unwrap();
        assert_eq!(ledger.remaining_balance(due()), Money::ZERO);
        assert!(ledger.can_finalize(due()));

        let removed = ledger.remove_tender(1).unwrap();
        assert_eq!(removed.method, PaymentMethod::Cash);
        assert!(!ledger.can_finalize(due()));
        assert_eq!(ledger.phase(due()), PaymentPhase::Accumulating);
    }

    #[test]
    fn test_tolerance_absorbs_sub_cent_remainder() {
        let due: Money = "5.69625".parse().unwrap();
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Debit, Money::from_cents(569)).unwrap();

        // 0.00625 still owed, inside the one-cent tolerance
        assert!(ledger.can_finalize(due));

        let mut short = PaymentLedger::new();
        short.add_tender(PaymentMethod::Debit, Money::from_cents(568)).unwrap();
        assert!(!short.can_finalize(due));
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let mut ledger = PaymentLedger::new();
        assert!(matches!(
            ledger.add_tender(PaymentMethod::Cash, Money::ZERO),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
        assert!(ledger
            .add_tender(PaymentMethod::Cash, Money::from_cents(-100))
            .is_err());
        assert!(ledger.tenders().is_empty());
        assert_eq!(ledger.phase(due()), PaymentPhase::Empty);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Amex, Money::from_cents(100)).unwrap();

        assert_eq!(
            ledger.remove_tender(3),
            Err(CoreError::TenderIndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(ledger.tenders().len(), 1);
    }

    #[test]
    fn test_would_overpay() {
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Visa, Money::from_cents(1500)).unwrap();

        assert!(!ledger.would_overpay(due(), Money::from_cents(500)));
        assert!(ledger.would_overpay(due(), Money::from_cents(501)));
    }

    #[test]
    fn test_would_overpay_false_once_covered() {
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Cash, Money::from_cents(2500)).unwrap();

        assert!(!ledger.would_overpay(due(), Money::from_cents(100)));
        assert!(!ledger.would_overpay(due(), Money::from_cents(1)));

        let mut exact = PaymentLedger::new();
        exact.add_tender(PaymentMethod::Visa, Money::from_cents(2000)).unwrap();
        assert!(!exact.would_overpay(due(), Money::from_cents(100)));
    }

    #[test]
    fn test_rejects_amounts_beyond_cap() {
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Cash, Money::from_cents(1000)).unwrap();

        let huge = Money::from_decimal(Decimal::MAX);
        assert!(matches!(
            ledger.add_tender(PaymentMethod::Cash, huge),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            ledger.add_tender(PaymentMethod::Visa, huge),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));

        // Totals stay computable after the rejected tenders
        assert_eq!(ledger.tenders().len(), 1);
        assert_eq!(ledger.total_tendered(), Money::from_cents(1000));
        assert_eq!(ledger.remaining_balance(due()), Money::from_cents(1000));
    }

    #[test]
    fn test_finalize_produces_record_and_clears_cart() {
        let mut cart = cart_totalling_20();
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Visa, Money::from_cents(1200)).unwrap();
        ledger.add_tender(PaymentMethod::Cash, Money::from_cents(1000)).unwrap();

        let now = Utc::now();
        let tx = ledger
            .finalize(&mut cart, || "RCP-1".to_string(), now)
            .unwrap();

        assert_eq!(tx.receipt_id, "RCP-1");
        assert_eq!(tx.grand_total, Money::from_cents(2000));
        assert_eq!(tx.total_tendered, Money::from_cents(2200));
        assert_eq!(tx.change_due, Money::from_cents(200));
        assert_eq!(tx.lines.len(), 1);
        assert_eq!(tx.lines[0].line_total, Money::from_cents(2000));
        assert_eq!(tx.tenders.len(), 2);
        assert_eq!(tx.completed_at, now);

        assert!(cart.is_empty());
        assert_eq!(ledger.phase(Money::ZERO), PaymentPhase::Finalized);
        assert_eq!(
            ledger.add_tender(PaymentMethod::Cash, Money::from_cents(1)),
            Err(CoreError::AlreadyFinalized)
        );
    }

    #[test]
    fn test_finalize_incomplete_leaves_state_untouched() {
        let mut cart = cart_totalling_20();
        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Visa, Money::from_cents(1200)).unwrap();

        let cart_before = cart.clone();
        let ledger_before = ledger.clone();
        let mut called = false;

        let err = ledger
            .finalize(
                &mut cart,
                || {
                    called = true;
                    "never".to_string()
                },
                Utc::now(),
            )
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::IncompletePayment {
                remaining: Money::from_cents(800)
            }
        );
        assert!(!called);
        assert_eq!(cart, cart_before);
        assert_eq!(ledger, ledger_before);
    }

    #[test]
    fn test_finalize_blocked_by_stock() {
        let mut cart = CartState::new(TaxRate::zero());
        cart.add_item(&InventoryItem::new("t", "Tissue Box", "TIS200", Money::from_cents(100), 5));
        cart.update_quantity("t", 6);

        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Cash, Money::from_cents(600)).unwrap();

        match ledger.finalize(&mut cart, String::new, Utc::now()) {
            Err(CoreError::CheckoutBlocked(issues)) => {
                assert_eq!(issues.len(), 1);
                assert!(matches!(issues[0], CheckoutIssue::InsufficientStock { .. }));
            }
            other => panic!("expected CheckoutBlocked, got {other:?}"),
        }
        assert!(!cart.is_empty());
        assert!(!ledger.is_finalized());
    }
}
