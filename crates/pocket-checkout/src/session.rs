//! # Checkout Session
//!
//! Owns the cart and payment ledger of the sale in progress.
//!
//! ## Thread Safety
//! The sale is wrapped in `Arc<Mutex<T>>`: UI handlers may run concurrently,
//! but only one of them may change the sale at a time. The lock is never
//! held across an `.await`.
//!
//! ## Finalize Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CheckoutSession::finalize                         │
//! │                                                                         │
//! │  lock ─► backup (cart, ledger)                                         │
//! │       ─► ledger.finalize(cart)      cart cleared, ledger Finalized     │
//! │       ─► finalizing = true                                             │
//! │  unlock                                                                 │
//! │                                                                         │
//! │  sink.persist(transaction).await    every mutation ─► Busy             │
//! │       │                                                                 │
//! │       ├── Ok(id)  ─► fresh ledger, finalizing = false                  │
//! │       │                                                                 │
//! │       └── Err / future dropped                                         │
//! │               ─► restore backup, finalizing = false                    │
//! │               ─► SessionError::Persistence (retryable)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use pocket_core::cart::CartSummary;
use pocket_core::{
    CartState, CoreError, Discount, DiscountType, FinalizedTransaction, InventoryItem, Money,
    PaymentLedger, PaymentMethod, PaymentPhase, TaxRate, TenderEntry,
};
use pocket_db::Database;

use crate::collaborators::{InventoryLookup, LookupKey, ReceiptIdGenerator, TransactionSink};
use crate::config::PosConfig;
use crate::error::{SessionError, SessionResult};
use crate::receipt::SequentialReceiptIds;

// =============================================================================
// Read Models
// =============================================================================

/// Payment progress against the current grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub grand_total: Money,
    pub tenders: Vec<TenderEntry>,
    pub total_tendered: Money,
    pub remaining_balance: Money,
    pub change_due: Money,
    pub phase: PaymentPhase,
    pub can_finalize: bool,
}

/// A sale that was finalized and saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSale {
    /// Id assigned by the transaction sink.
    pub transaction_id: String,
    pub transaction: FinalizedTransaction,
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug)]
struct SaleState {
    cart: CartState,
    ledger: PaymentLedger,
    finalizing: bool,
}

/// One sale at a time, shared by every UI handler.
///
/// Cloning is cheap and every clone drives the same sale.
#[derive(Clone)]
pub struct CheckoutSession {
    state: Arc<Mutex<SaleState>>,
    inventory: Arc<dyn InventoryLookup>,
    sink: Arc<dyn TransactionSink>,
    receipts: Arc<dyn ReceiptIdGenerator>,
    tolerance: Money,
}

impl CheckoutSession {
    pub fn new(
        tax_rate: TaxRate,
        tolerance: Money,
        inventory: Arc<dyn InventoryLookup>,
        sink: Arc<dyn TransactionSink>,
        receipts: Arc<dyn ReceiptIdGenerator>,
    ) -> Self {
        CheckoutSession {
            state: Arc::new(Mutex::new(SaleState {
                cart: CartState::new(tax_rate),
                ledger: PaymentLedger::with_tolerance(tolerance),
                finalizing: false,
            })),
            inventory,
            sink,
            receipts,
            tolerance,
        }
    }

    /// Session backed by SQLite for both lookup and persistence.
    ///
    /// Receipt numbering continues from the highest stored sequence.
    pub async fn with_database(config: &PosConfig, db: Database) -> SessionResult<Self> {
        let receipts = SequentialReceiptIds::resume(config.receipt_prefix.clone(), &db).await?;
        let db = Arc::new(db);
        Ok(CheckoutSession::new(
            config.tax_rate(),
            config.payment_tolerance,
            db.clone(),
            db,
            Arc::new(receipts),
        ))
    }

    // =========================================================================
    // State Access Helpers
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, SaleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SaleState) -> R,
    {
        f(&self.lock())
    }

    /// Runs a mutation unless a finalize is in flight.
    fn with_state_mut<F, R>(&self, f: F) -> SessionResult<R>
    where
        F: FnOnce(&mut SaleState) -> SessionResult<R>,
    {
        let mut state = self.lock();
        if state.finalizing {
            return Err(SessionError::Finalizing);
        }
        f(&mut state)
    }

    // =========================================================================
    // Cart Commands
    // =========================================================================

    /// Looks the item up and adds one unit.
    pub async fn add_by_lookup(&self, key: &LookupKey) -> SessionResult<CartSummary> {
        debug!(%key, "add_by_lookup command");

        let item = self
            .inventory
            .find(key)
            .await?
            .ok_or_else(|| SessionError::ItemNotFound {
                key: key.value().to_string(),
            })?;

        self.add_item(&item)
    }

    /// Adds one unit of an already resolved item.
    ///
    /// Refuses items with no stock, and refuses to go past the stock on
    /// hand. The cart itself never checks stock on add.
    pub fn add_item(&self, item: &InventoryItem) -> SessionResult<CartSummary> {
        debug!(item_id = %item.item_id, sku = %item.sku, "add_item command");

        item.validate()?;
        if !item.is_in_stock() {
            return Err(SessionError::OutOfStock {
                name: item.name.clone(),
            });
        }

        self.with_state_mut(|s| {
            if s.cart.quantity_of(&item.item_id) >= item.stock {
                return Err(SessionError::StockLimitReached {
                    name: item.name.clone(),
                    stock: item.stock,
                });
            }

            if let Some(rate) = item.tax_rate {
                if rate != s.cart.tax_rate() {
                    debug!(
                        item_id = %item.item_id,
                        item_rate = %rate,
                        cart_rate = %s.cart.tax_rate(),
                        "Item tax rate differs from cart rate; cart rate applies"
                    );
                }
            }

            s.cart.add_item(item);
            Ok(s.cart.summary())
        })
    }

    pub fn remove_item(&self, item_id: &str) -> SessionResult<CartSummary> {
        debug!(item_id = %item_id, "remove_item command");
        self.with_state_mut(|s| {
            s.cart.remove_item(item_id);
            Ok(s.cart.summary())
        })
    }

    /// Sets an absolute quantity; zero or less removes the line.
    pub fn update_quantity(&self, item_id: &str, quantity: i64) -> SessionResult<CartSummary> {
        debug!(item_id = %item_id, quantity, "update_quantity command");
        self.with_state_mut(|s| {
            s.cart.update_quantity(item_id, quantity);
            Ok(s.cart.summary())
        })
    }

    /// Empties the cart and drops the discount. Tenders are kept.
    pub fn clear(&self) -> SessionResult<CartSummary> {
        debug!("clear command");
        self.with_state_mut(|s| {
            s.cart.clear();
            Ok(s.cart.summary())
        })
    }

    pub fn set_discount(&self, value: Decimal, kind: DiscountType) -> SessionResult<CartSummary> {
        debug!(%value, ?kind, "set_discount command");
        let discount = Discount::new(value, kind)?;
        self.with_state_mut(|s| {
            s.cart.set_discount(discount);
            Ok(s.cart.summary())
        })
    }

    /// Abandons the sale: empty cart, no tenders.
    pub fn cancel_sale(&self) -> SessionResult<()> {
        debug!("cancel_sale command");
        let tolerance = self.tolerance;
        self.with_state_mut(|s| {
            s.cart.clear();
            s.ledger = PaymentLedger::with_tolerance(tolerance);
            Ok(())
        })
    }

    // =========================================================================
    // Payment Commands
    // =========================================================================

    pub fn add_tender(&self, method: PaymentMethod, amount: Money) -> SessionResult<PaymentStatus> {
        debug!(method = %method, %amount, "add_tender command");
        self.with_state_mut(|s| {
            s.ledger.add_tender(method, amount)?;
            Ok(s.payment_status())
        })
    }

    pub fn remove_tender(&self, index: usize) -> SessionResult<PaymentStatus> {
        debug!(index, "remove_tender command");
        self.with_state_mut(|s| {
            s.ledger.remove_tender(index)?;
            Ok(s.payment_status())
        })
    }

    /// Tenders exactly the remaining balance in cash.
    pub fn tender_exact_cash(&self) -> SessionResult<PaymentStatus> {
        debug!("tender_exact_cash command");
        self.with_state_mut(|s| {
            let remaining = s.ledger.remaining_balance(s.cart.grand_total());
            if !remaining.is_positive() {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: "nothing left to pay".to_string(),
                }
                .into());
            }
            s.ledger.add_tender(PaymentMethod::Cash, remaining)?;
            Ok(s.payment_status())
        })
    }

    /// Whether tendering `amount` now would produce change.
    pub fn would_overpay(&self, amount: Money) -> bool {
        self.with_state(|s| s.ledger.would_overpay(s.cart.grand_total(), amount))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn summary(&self) -> CartSummary {
        self.with_state(|s| s.cart.summary())
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.with_state(SaleState::payment_status)
    }

    pub fn is_finalizing(&self) -> bool {
        self.with_state(|s| s.finalizing)
    }

    // =========================================================================
    // Finalize
    // =========================================================================

    /// Completes the sale and hands it to the transaction sink.
    ///
    /// On failure, or if this future is dropped before the sink answers,
    /// the cart and tenders are restored exactly as they were.
    pub async fn finalize(&self) -> SessionResult<CompletedSale> {
        debug!("finalize command");

        let receipts = Arc::clone(&self.receipts);
        // Stored timestamps keep microseconds
        let completed_at = Utc::now().trunc_subsecs(6);
        let (transaction, backup) = self.with_state_mut(|s| {
            let backup = (s.cart.clone(), s.ledger.clone());
            let transaction =
                s.ledger
                    .finalize(&mut s.cart, || receipts.next_receipt_id(), completed_at)?;
            s.finalizing = true;
            Ok((transaction, backup))
        })?;

        let restore = RestoreOnDrop {
            state: &self.state,
            backup: Some(backup),
        };

        match self.sink.persist(&transaction).await {
            Ok(transaction_id) => {
                restore.disarm();
                {
                    let mut state = self.lock();
                    state.ledger = PaymentLedger::with_tolerance(self.tolerance);
                    state.finalizing = false;
                }

                info!(
                    transaction_id = %transaction_id,
                    receipt_id = %transaction.receipt_id,
                    total = %transaction.grand_total,
                    change = %transaction.change_due,
                    items = transaction.item_count(),
                    "Sale completed"
                );

                Ok(CompletedSale {
                    transaction_id,
                    transaction,
                })
            }
            Err(e) => {
                drop(restore);
                warn!(
                    receipt_id = %transaction.receipt_id,
                    error = %e,
                    "Persisting sale failed, cart and tenders restored"
                );

                let reason = match e {
                    SessionError::Persistence { reason } => reason,
                    other => other.to_string(),
                };
                Err(SessionError::Persistence { reason })
            }
        }
    }
}

impl SaleState {
    fn payment_status(&self) -> PaymentStatus {
        let due = self.cart.grand_total();
        PaymentStatus {
            grand_total: due,
            tenders: self.ledger.tenders().to_vec(),
            total_tendered: self.ledger.total_tendered(),
            remaining_balance: self.ledger.remaining_balance(due),
            change_due: self.ledger.change_due(due),
            phase: self.ledger.phase(due),
            can_finalize: self.ledger.can_finalize(due),
        }
    }
}

/// Puts the pre-finalize cart and ledger back unless disarmed.
struct RestoreOnDrop<'a> {
    state: &'a Mutex<SaleState>,
    backup: Option<(CartState, PaymentLedger)>,
}

impl RestoreOnDrop<'_> {
    fn disarm(mut self) {
        self.backup = None;
    }
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        if let Some((cart, ledger)) = self.backup.take() {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.cart = cart;
            state.ledger = ledger;
            state.finalizing = false;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
