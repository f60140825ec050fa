//! # Sales Reporting
//!
//! Aggregates finalized transactions into the numbers shown on the
//! reports screen.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FinalizedTransaction history (from pocket-db)                          │
//! │       │                                                                 │
//! │       ├──► total_sales / transaction_count / average / total_tax       │
//! │       ├──► payment_methods  (per tender method: total + count)         │
//! │       └──► top_items        (by units sold, top 10)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{FinalizedTransaction, PaymentMethod};
use crate::TOP_ITEMS_LIMIT;

// =============================================================================
// Report Period
// =============================================================================

/// Time window a report covers, ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    #[default]
    Today,
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
}

impl ReportPeriod {
    /// First instant included in the window.
    ///
    /// `Today` starts at midnight UTC; the others reach back a fixed number
    /// of days from `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            ReportPeriod::Today => {
                return now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .map_or(now, |midnight| midnight.and_utc());
            }
            ReportPeriod::Week => 7,
            ReportPeriod::Month => 30,
            ReportPeriod::ThreeMonths => 90,
            ReportPeriod::SixMonths => 180,
            ReportPeriod::Year => 365,
        };
        now - Duration::days(days)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
            ReportPeriod::ThreeMonths => "three_months",
            ReportPeriod::SixMonths => "six_months",
            ReportPeriod::Year => "year",
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Totals for one tender method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub total_amount: Money,
    pub count: u64,
}

/// Units and revenue for one item name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub name: String,
    pub total_quantity: i64,
    /// Σ quantity × unit price, before discount and tax.
    pub total_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    /// Σ grand totals.
    pub total_sales: Money,
    pub transaction_count: u64,
    /// Zero when there are no transactions.
    pub average_transaction: Money,
    pub total_tax: Money,
    /// In first-seen order.
    pub payment_methods: Vec<MethodTotal>,
    /// Highest quantity first.
    pub top_items: Vec<TopItem>,
}

impl SalesReport {
    pub fn from_transactions(transactions: &[FinalizedTransaction]) -> Self {
        let total_sales: Money = transactions.iter().map(|t| t.grand_total).sum();
        let total_tax: Money = transactions.iter().map(|t| t.tax).sum();
        let transaction_count = transactions.len() as u64;

        let average_transaction = if transactions.is_empty() {
            Money::ZERO
        } else {
            Money::from_decimal(total_sales.amount() / rust_decimal::Decimal::from(transaction_count))
        };

        SalesReport {
            total_sales,
            transaction_count,
            average_transaction,
            total_tax,
            payment_methods: method_totals(transactions),
            top_items: top_items(transactions, TOP_ITEMS_LIMIT),
        }
    }
}

fn method_totals(transactions: &[FinalizedTransaction]) -> Vec<MethodTotal> {
    let mut totals: Vec<MethodTotal> = Vec::new();

    for tender in transactions.iter().flat_map(|t| &t.tenders) {
        match totals.iter_mut().find(|m| m.method == tender.method) {
            Some(entry) => {
                entry.total_amount += tender.amount;
                entry.count += 1;
            }
            None => totals.push(MethodTotal {
                method: tender.method.clone(),
                total_amount: tender.amount,
                count: 1,
            }),
        }
    }

    totals
}

fn top_items(transactions: &[FinalizedTransaction], limit: usize) -> Vec<TopItem> {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, TopItem> = HashMap::new();

    for line in transactions.iter().flat_map(|t| &t.lines) {
        let entry = by_name.entry(line.name.clone()).or_insert_with(|| {
            order.push(line.name.clone());
            TopItem {
                name: line.name.clone(),
                total_quantity: 0,
                total_revenue: Money::ZERO,
            }
        });
        entry.total_quantity += line.quantity;
        entry.total_revenue += line.unit_price * line.quantity;
    }

    let mut items: Vec<TopItem> = order
        .iter()
        .filter_map(|name| by_name.remove(name))
        .collect();
    // Stable sort keeps first-seen order among ties
    items.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    items.truncate(limit);
    items
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Discount, FinalizedLine, TaxRate, TenderEntry};
    use chrono::TimeZone;

    fn line(name: &str, price_cents: i64, qty: i64) -> FinalizedLine {
        FinalizedLine {
            item_id: name.to_lowercase(),
            name: name.to_string(),
            sku: name.to_uppercase(),
            unit_price: Money::from_cents(price_cents),
            quantity: qty,
            line_total: Money::from_cents(price_cents * qty),
        }
    }

    fn tx(lines: Vec<FinalizedLine>, tenders: Vec<(PaymentMethod, i64)>, total: i64, tax: i64) -> FinalizedTransaction {
        let tenders: Vec<TenderEntry> = tenders
            .into_iter()
            .map(|(method, cents)| TenderEntry {
                method,
                amount: Money::from_cents(cents),
            })
            .collect();
        let total_tendered = tenders.iter().map(|t| t.amount).sum();
        FinalizedTransaction {
            receipt_id: "RCP".to_string(),
            lines,
            subtotal: Money::from_cents(total - tax),
            discount: Discount::none(),
            discount_total: Money::ZERO,
            tax_rate: TaxRate::from_bps(850),
            tax: Money::from_cents(tax),
            grand_total: Money::from_cents(total),
            tenders,
            total_tendered,
            change_due: Money::ZERO,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = SalesReport::from_transactions(&[]);
        assert_eq!(report, SalesReport::default());
        assert_eq!(report.average_transaction, Money::ZERO);
    }

    #[test]
    fn test_totals_and_average() {
        let report = SalesReport::from_transactions(&[
            tx(vec![line("Coke", 150, 2)], vec![(PaymentMethod::Cash, 1000)], 1000, 80),
            tx(vec![line("Chips", 225, 1)], vec![(PaymentMethod::Visa, 2000)], 2000, 160),
        ]);

        assert_eq!(report.total_sales, Money::from_cents(3000));
        assert_eq!(report.transaction_count, 2);
        assert_eq!(report.average_transaction, Money::from_cents(1500));
        assert_eq!(report.total_tax, Money::from_cents(240));
    }

    #[test]
    fn test_payment_methods_first_seen_order() {
        let report = SalesReport::from_transactions(&[
            tx(vec![], vec![(PaymentMethod::Visa, 1200), (PaymentMethod::Cash, 800)], 2000, 0),
            tx(vec![], vec![(PaymentMethod::Cash, 500)], 500, 0),
        ]);

        assert_eq!(report.payment_methods.len(), 2);
        assert_eq!(report.payment_methods[0].method, PaymentMethod::Visa);
        assert_eq!(report.payment_methods[1].method, PaymentMethod::Cash);
        assert_eq!(report.payment_methods[1].total_amount, Money::from_cents(1300));
        assert_eq!(report.payment_methods[1].count, 2);
    }

    #[test]
    fn test_top_items_by_quantity() {
        let report = SalesReport::from_transactions(&[
            tx(vec![line("Coke", 150, 2), line("Chips", 225, 1)], vec![], 0, 0),
            tx(vec![line("Chips", 225, 4)], vec![], 0, 0),
        ]);

        assert_eq!(report.top_items[0].name, "Chips");
        assert_eq!(report.top_items[0].total_quantity, 5);
        assert_eq!(report.top_items[0].total_revenue, Money::from_cents(1125));
        assert_eq!(report.top_items[1].name, "Coke");
    }

    #[test]
    fn test_top_items_limited_to_ten() {
        let lines = (0..15).map(|i| line(&format!("Item{i}"), 100, i + 1)).collect();
        let report = SalesReport::from_transactions(&[tx(lines, vec![], 0, 0)]);

        assert_eq!(report.top_items.len(), TOP_ITEMS_LIMIT);
        assert_eq!(report.top_items[0].total_quantity, 15);
    }

    #[test]
    fn test_period_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();

        assert_eq!(
            ReportPeriod::Today.start(now),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(ReportPeriod::Week.start(now), now - Duration::days(7));
        assert_eq!(ReportPeriod::Year.start(now), now - Duration::days(365));
    }
}
