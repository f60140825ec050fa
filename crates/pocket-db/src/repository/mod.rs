//! # Repository Module
//!
//! Database repository implementations for Pocket POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CheckoutSession / reports                                             │
//! │       │                                                                 │
//! │       │  db.items().get_by_barcode("1234567890123")                    │
//! │       ▼                                                                 │
//! │  ItemRepository              TransactionRepository                     │
//! │  ├── get_by_id / sku / ...   ├── record (atomic batch)                 │
//! │  ├── search                  ├── get_by_receipt                        │
//! │  ├── insert / adjust_stock   ├── list_between                          │
//! │  └── low_stock / count       └── recent                                │
//! │       │                                                                 │
//! │       │  SQL Query (rows with TEXT decimals)                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Inventory lookup and stock
//! - [`TransactionRepository`](transaction::TransactionRepository) - Completed sales

pub mod item;
pub mod transaction;

use chrono::{DateTime, SecondsFormat, Utc};
use pocket_core::{Money, TaxRate};

use crate::error::{DbError, DbResult};

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::invalid_data(column, e))
}

pub(crate) fn parse_money(column: &str, raw: &str) -> DbResult<Money> {
    raw.parse().map_err(|e| DbError::invalid_data(column, e))
}

pub(crate) fn parse_tax_rate(column: &str, bps: i64) -> DbResult<TaxRate> {
    u32::try_from(bps)
        .map(TaxRate::from_bps)
        .map_err(|e| DbError::invalid_data(column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        let stored = format_timestamp(ts);

        assert_eq!(stored, "2024-03-15T14:30:00.000000Z");
        assert_eq!(parse_timestamp("completed_at", &stored).unwrap(), ts);
    }

    #[test]
    fn test_parse_errors_name_the_column() {
        let err = parse_money("unit_price", "abc").unwrap_err();
        assert!(err.to_string().contains("unit_price"));
        assert!(parse_tax_rate("tax_rate_bps", -1).is_err());
    }
}
