//! # Cart Engine
//!
//! The in-progress sale: lines, discount, tax and derived totals.
//!
//! ## Reducer Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Transitions                               │
//! │                                                                         │
//! │  Cashier Action           CartAction                State Change        │
//! │  ──────────────           ──────────                ────────────        │
//! │                                                                         │
//! │  Scan / tap item ───────► AddItem(item) ──────────► qty += 1 or insert  │
//! │                                                                         │
//! │  Change quantity ───────► UpdateQuantity ─────────► qty = n (≤0 removes)│
//! │                                                                         │
//! │  Swipe to remove ───────► RemoveItem(id) ─────────► line dropped        │
//! │                                                                         │
//! │  Apply discount ────────► SetDiscount ────────────► discount replaced   │
//! │                                                                         │
//! │  New sale ──────────────► Clear ──────────────────► empty, no discount  │
//! │                                                                         │
//! │  EVERY transition ends with a full recompute of the totals.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `item_id` and keep insertion order
//! - A line never has `quantity <= 0`; it is removed instead
//! - `subtotal` is always the exact sum of `unit_price × quantity`
//!
//! Stock is not checked on add. It is checked once, in
//! [`CartState::validate_for_checkout`], against the snapshot taken when the
//! line was created.

use serde::Serialize;

use crate::error::{CheckoutIssue, CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{self, Totals};
use crate::types::{Discount, FinalizedLine, InventoryItem, TaxRate};

// =============================================================================
// Cart Line
// =============================================================================

/// One distinct item in the active sale.
///
/// ## Design Notes
/// `name`, `sku` and `unit_price` are frozen when the line is created, so the
/// cart shows consistent data even if the item changes upstream.
/// `available_stock` is the stock snapshot used for checkout validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub available_stock: i64,
}

impl CartLine {
    /// Creates a line with quantity 1 from an inventory record.
    pub fn from_item(item: &InventoryItem) -> Self {
        CartLine {
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            sku: item.sku.clone(),
            unit_price: item.unit_price,
            quantity: 1,
            available_stock: item.stock,
        }
    }

    /// unit_price × quantity, exact.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    pub fn exceeds_stock(&self) -> bool {
        self.quantity > self.available_stock
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Every way the cart can change.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Insert with quantity 1, or increment an existing line.
    AddItem(InventoryItem),
    /// Drop the line. No-op if absent.
    RemoveItem(String),
    /// Absolute set. `quantity <= 0` removes the line.
    UpdateQuantity { item_id: String, quantity: i64 },
    /// Empty the cart and clear the discount.
    Clear,
    /// Replace the discount (never accumulated).
    SetDiscount(Discount),
}

// =============================================================================
// Cart State
// =============================================================================

/// The cart aggregate.
///
/// Owned by one checkout session; no global instance exists. Derived totals
/// are private and only change through [`CartState::reduce`] or its
/// method shortcuts.
///
/// ## Example
/// ```rust
/// use pocket_core::cart::{CartAction, CartState};
/// use pocket_core::money::Money;
/// use pocket_core::types::{InventoryItem, TaxRate};
///
/// let chips = InventoryItem::new("item-3", "Lay's Chips 50g", "LAY50G", Money::from_cents(225), 25);
///
/// let cart = CartState::new(TaxRate::zero())
///     .reduce(CartAction::AddItem(chips))
///     .reduce(CartAction::UpdateQuantity { item_id: "item-3".into(), quantity: 4 });
///
/// assert_eq!(cart.grand_total(), Money::from_cents(900));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    lines: Vec<CartLine>,
    discount: Discount,
    tax_rate: TaxRate,
    totals: Totals,
}

impl CartState {
    /// Creates an empty cart charging `tax_rate` on the discounted subtotal.
    pub fn new(tax_rate: TaxRate) -> Self {
        CartState {
            lines: Vec::new(),
            discount: Discount::none(),
            tax_rate,
            totals: Totals::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Pure transition: `(state, action) → state`.
    pub fn reduce(mut self, action: CartAction) -> Self {
        self.dispatch(action);
        self
    }

    /// In-place form of [`CartState::reduce`].
    pub fn dispatch(&mut self, action: CartAction) {
        match action {
            CartAction::AddItem(item) => self.apply_add(&item),
            CartAction::RemoveItem(item_id) => self.apply_remove(&item_id),
            CartAction::UpdateQuantity { item_id, quantity } => {
                self.apply_update(&item_id, quantity)
            }
            CartAction::Clear => {
                self.lines.clear();
                self.discount = Discount::none();
            }
            CartAction::SetDiscount(discount) => self.discount = discount,
        }
        self.recompute();
    }

    pub fn add_item(&mut self, item: &InventoryItem) {
        self.apply_add(item);
        self.recompute();
    }

    pub fn remove_item(&mut self, item_id: &str) {
        self.apply_remove(item_id);
        self.recompute();
    }

    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) {
        self.apply_update(item_id, quantity);
        self.recompute();
    }

    /// Empties the cart and clears the discount. The tax rate is kept.
    pub fn clear(&mut self) {
        self.dispatch(CartAction::Clear);
    }

    pub fn set_discount(&mut self, discount: Discount) {
        self.dispatch(CartAction::SetDiscount(discount));
    }

    fn apply_add(&mut self, item: &InventoryItem) {
        match self.line_mut(&item.item_id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine::from_item(item)),
        }
    }

    fn apply_remove(&mut self, item_id: &str) {
        self.lines.retain(|l| l.item_id != item_id);
    }

    fn apply_update(&mut self, item_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.apply_remove(item_id);
        } else if let Some(line) = self.line_mut(item_id) {
            line.quantity = quantity;
        }
    }

    fn recompute(&mut self) {
        let subtotal: Money = self.lines.iter().map(CartLine::line_total).sum();
        self.totals = pricing::compute_totals(subtotal, &self.discount, self.tax_rate);
    }

    fn line_mut(&mut self, item_id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.item_id == item_id)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    pub fn discount(&self) -> &Discount {
        &self.discount
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Sum of line totals, before discount.
    pub fn subtotal(&self) -> Money {
        self.totals.subtotal
    }

    pub fn discount_total(&self) -> Money {
        self.totals.discount_total
    }

    pub fn discounted_subtotal(&self) -> Money {
        self.totals.discounted_subtotal
    }

    pub fn tax(&self) -> Money {
        self.totals.tax
    }

    pub fn grand_total(&self) -> Money {
        self.totals.grand_total
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.line(item_id).is_some()
    }

    /// Quantity of `item_id` in the cart, 0 if absent.
    pub fn quantity_of(&self, item_id: &str) -> i64 {
        self.line(item_id).map_or(0, |l| l.quantity)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Collects every reason the cart cannot be checked out.
    ///
    /// An empty list means checkout may proceed.
    pub fn validate_for_checkout(&self) -> Vec<CheckoutIssue> {
        if self.lines.is_empty() {
            return vec![CheckoutIssue::EmptyCart];
        }

        self.lines
            .iter()
            .filter(|l| l.exceeds_stock())
            .map(|l| CheckoutIssue::InsufficientStock {
                item_id: l.item_id.clone(),
                name: l.name.clone(),
                sku: l.sku.clone(),
                available: l.available_stock,
                requested: l.quantity,
            })
            .collect()
    }

    /// [`CartState::validate_for_checkout`] as a `Result`.
    pub fn ensure_checkout_ready(&self) -> CoreResult<()> {
        let issues = self.validate_for_checkout();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::CheckoutBlocked(issues))
        }
    }

    /// Frozen copies of the lines with resolved line totals.
    pub fn line_snapshots(&self) -> Vec<FinalizedLine> {
        self.lines
            .iter()
            .map(|l| FinalizedLine {
                item_id: l.item_id.clone(),
                name: l.name.clone(),
                sku: l.sku.clone(),
                unit_price: l.unit_price,
                quantity: l.quantity,
                line_total: l.line_total(),
            })
            .collect()
    }

    /// Read model for the cart panel.
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            lines: self.line_snapshots(),
            line_count: self.line_count(),
            item_count: self.item_count(),
            discount: self.discount,
            tax_rate: self.tax_rate,
            totals: self.totals,
        }
    }
}

impl Default for CartState {
    fn default() -> Self {
        CartState::new(crate::DEFAULT_TAX_RATE)
    }
}

/// Cart contents and totals for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<FinalizedLine>,
    pub line_count: usize,
    pub item_count: i64,
    pub discount: Discount,
    pub tax_rate: TaxRate,
    pub totals: Totals,
}

// =============================================================================
// Unit Tests
// =============================================================================
