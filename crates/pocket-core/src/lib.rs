//! # pocket-core: Pure Business Logic for Pocket POS
//!
//! This crate is the **heart** of Pocket POS. It holds the cart pricing
//! engine and the multi-tender payment reconciliation as pure, synchronous
//! code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pocket POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Mobile UI (external)                         │   │
//! │  │    Scan/Search ──► Cart ──► Tender ──► Receipt                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                pocket-checkout (CheckoutSession)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pocket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  cart   │ │ payment │ │ pricing │ │  money  │ │ report  │  │   │
//! │  │   │ reducer │ │ tenders │ │ tax/disc│ │ Decimal │ │ history │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   pocket-db (SQLite Layer)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - Cart state, actions and the reducer
//! - [`payment`] - Tender ledger and finalization
//! - [`pricing`] - Discount and tax math shared by cart and payment
//! - [`money`] - Exact decimal money, rounded only for display
//! - [`types`] - Inventory items, tenders, finalized transactions
//! - [`report`] - Sales aggregation over finalized transactions
//! - [`validation`] - Boundary validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pocket_core::cart::CartState;
//! use pocket_core::money::Money;
//! use pocket_core::types::{InventoryItem, TaxRate};
//!
//! let mut cart = CartState::new(TaxRate::from_bps(850)); // 8.5%
//! let soda = InventoryItem::new("item-1", "Coca-Cola 330ml", "CC330ML", Money::from_cents(150), 45);
//!
//! cart.add_item(&soda);
//! cart.add_item(&soda);
//!
//! assert_eq!(cart.subtotal(), Money::from_cents(300));
//! // 3.00 × 8.5% = 0.255, kept exact until presentation
//! assert_eq!(cart.tax().to_string(), "$0.26");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartAction, CartLine, CartState};
pub use error::{CheckoutIssue, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::{PaymentLedger, PaymentPhase};
pub use pricing::Totals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default sales tax rate: 8.5%.
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_bps(850);

/// Stock level at or below which an item counts as low stock when the item
/// carries no `min_stock` of its own.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Number of entries in a sales report's top-selling list.
pub const TOP_ITEMS_LIMIT: usize = 10;
