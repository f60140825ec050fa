//! # Receipts
//!
//! Receipt numbering and the presentation view of a completed sale.
//!
//! ## Receipt Number Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   RCP  20240315  0001                                                  │
//! │   ───  ────────  ────                                                  │
//! │    │      │       └── running sequence, zero padded                    │
//! │    │      └────────── UTC date of the sale                            │
//! │    └───────────────── configurable prefix                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sequence resumes after the highest one already stored for the prefix,
//! so a restarted till never reissues a number.
//!
//! The view is the only place amounts are rounded to cents; the underlying
//! transaction keeps exact values.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use tracing::info;

use pocket_core::FinalizedTransaction;
use pocket_db::Database;

use crate::collaborators::ReceiptIdGenerator;
use crate::config::PosConfig;
use crate::error::SessionResult;

// =============================================================================
// Receipt Numbers
// =============================================================================

/// `{prefix}{YYYYMMDD}{NNNN}`.
#[derive(Debug)]
pub struct SequentialReceiptIds {
    prefix: String,
    sequence: AtomicU32,
}

impl SequentialReceiptIds {
    /// Generator whose first number is 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialReceiptIds::starting_after(prefix, 0)
    }

    pub fn starting_after(prefix: impl Into<String>, last: u32) -> Self {
        SequentialReceiptIds {
            prefix: prefix.into(),
            sequence: AtomicU32::new(last),
        }
    }

    /// Continues numbering after the last receipt stored under `prefix`.
    pub async fn resume(prefix: impl Into<String>, db: &Database) -> SessionResult<Self> {
        let prefix = prefix.into();
        let last = db.transactions().last_receipt_sequence(&prefix).await?.unwrap_or(0);
        info!(prefix = %prefix, last = last, "Receipt sequence resumed");
        Ok(SequentialReceiptIds::starting_after(prefix, last))
    }

    /// Issues the next number for the given date.
    pub fn next_for(&self, date: NaiveDate) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}{:04}", self.prefix, date.format("%Y%m%d"), seq)
    }
}

impl Default for SequentialReceiptIds {
    fn default() -> Self {
        SequentialReceiptIds::new("RCP")
    }
}

impl ReceiptIdGenerator for SequentialReceiptIds {
    fn next_receipt_id(&self) -> String {
        self.next_for(Utc::now().date_naive())
    }
}

// =============================================================================
// Receipt View
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTender {
    pub method: String,
    pub amount: String,
}

/// Display-ready receipt. Every amount is rounded to cents and formatted
/// with the store's currency symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub store_name: String,
    pub receipt_id: String,
    pub completed_at: String,
    pub lines: Vec<ReceiptLine>,
    pub item_count: i64,
    pub subtotal: String,
    /// Absent when no discount was applied.
    pub discount: Option<String>,
    /// e.g. `Tax (8.5%)`.
    pub tax_label: String,
    pub tax: String,
    pub total: String,
    pub tenders: Vec<ReceiptTender>,
    pub total_tendered: String,
    pub change: String,
}

impl ReceiptView {
    pub fn from_transaction(tx: &FinalizedTransaction, config: &PosConfig) -> Self {
        let money = |amount| config.format_money(amount);

        let lines = tx
            .lines
            .iter()
            .map(|line| ReceiptLine {
                name: line.name.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                unit_price: money(line.unit_price),
                line_total: money(line.line_total),
            })
            .collect();

        let tenders = tx
            .tenders
            .iter()
            .map(|t| ReceiptTender {
                method: t.method.display_name().to_string(),
                amount: money(t.amount),
            })
            .collect();

        let discount = if tx.discount_total.is_zero() {
            None
        } else {
            Some(format!("-{}", money(tx.discount_total)))
        };

        ReceiptView {
            store_name: config.store_name.clone(),
            receipt_id: tx.receipt_id.clone(),
            completed_at: tx.completed_at.format("%Y-%m-%d %H:%M").to_string(),
            lines,
            item_count: tx.item_count(),
            subtotal: money(tx.subtotal),
            discount,
            tax_label: format!("Tax ({})", tx.tax_rate),
            tax: money(tx.tax),
            total: money(tx.grand_total),
            tenders,
            total_tendered: money(tx.total_tendered),
            change: money(tx.change_due),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pocket_core::{
        CartState, Discount, InventoryItem, Money, PaymentLedger, PaymentMethod, TaxRate,
    };
    use rust_decimal::Decimal;

    #[test]
    fn test_sequence_format() {
        let ids = SequentialReceiptIds::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        assert_eq!(ids.next_for(date), "RCP202403150001");
        assert_eq!(ids.next_for(date), "RCP202403150002");
    }

    #[test]
    fn test_starting_after_continues_sequence() {
        let ids = SequentialReceiptIds::starting_after("RCP", 41);
        let date = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();

        assert_eq!(ids.next_for(date), "RCP202403160042");
        assert_eq!(ids.next_for(date), "RCP202403160043");
    }

    #[tokio::test]
    async fn test_resume_on_empty_history_starts_at_one() {
        let db = Database::new(pocket_db::DbConfig::in_memory()).await.unwrap();
        let ids = SequentialReceiptIds::resume("RCP", &db).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        assert_eq!(ids.next_for(date), "RCP202403150001");
    }

    #[test]
    fn test_ids_unique() {
        let ids = SequentialReceiptIds::new("T");
        let a = ids.next_receipt_id();
        let b = ids.next_receipt_id();
        assert_ne!(a, b);
        assert!(a.starts_with('T'));
    }

    #[test]
    fn test_view_rounds_for_display() {
        let mut cart = CartState::new(TaxRate::from_bps(850));
        let chips = InventoryItem::new("item-3", "Lay's Chips 50g", "LAY50G", Money::from_cents(225), 25);
        let soda = InventoryItem::new("item-1", "Coca-Cola 330ml", "CC330ML", Money::from_cents(150), 45);
        cart.add_item(&chips);
        cart.add_item(&soda);
        cart.add_item(&soda);
        cart.set_discount(Discount::percentage(Decimal::TEN).unwrap());

        let mut ledger = PaymentLedger::new();
        ledger.add_tender(PaymentMethod::Amex, Money::from_cents(600)).unwrap();

        let completed_at = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        let tx = ledger
            .finalize(&mut cart, || "RCP202403150007".to_string(), completed_at)
            .unwrap();

        let view = ReceiptView::from_transaction(&tx, &PosConfig::default());

        assert_eq!(view.receipt_id, "RCP202403150007");
        assert_eq!(view.completed_at, "2024-03-15 14:30");
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$5.25");
        assert_eq!(view.discount.as_deref(), Some("-$0.52"));
        assert_eq!(view.tax_label, "Tax (8.5%)");
        assert_eq!(view.tax, "$0.40");
        assert_eq!(view.total, "$5.13");
        assert_eq!(view.change, "$0.87");
        assert_eq!(view.tenders[0].method, "American Express");
        assert_eq!(view.lines[1].line_total, "$3.00");
    }
}
