//! # Transaction Repository
//!
//! Stores completed sales and reads them back for receipts and reports.
//!
//! ## Checkout Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record(&FinalizedTransaction)                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    ├── INSERT transactions            (header + totals)                │
//! │    ├── INSERT transaction_items × N   (frozen lines)                   │
//! │    ├── INSERT payments × M            (tenders, in order)              │
//! │    └── UPDATE items SET stock -= qty  × N                              │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure → ROLLBACK. Nothing is half-written and no stock moves.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use pocket_core::{
    Discount, DiscountType, FinalizedLine, FinalizedTransaction, PaymentMethod, TenderEntry,
};

use super::{format_timestamp, parse_money, parse_tax_rate, parse_timestamp};
use crate::error::{DbError, DbResult};

const TRANSACTION_COLUMNS: &str = "id, receipt_id, subtotal, discount_value, discount_type, \
     discount_total, tax_rate_bps, tax, grand_total, total_tendered, change_due, completed_at";

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    receipt_id: String,
    subtotal: String,
    discount_value: String,
    discount_type: DiscountType,
    discount_total: String,
    tax_rate_bps: i64,
    tax: String,
    grand_total: String,
    total_tendered: String,
    change_due: String,
    completed_at: String,
}

#[derive(Debug, FromRow)]
struct LineRow {
    item_id: String,
    name: String,
    sku: String,
    unit_price: String,
    quantity: i64,
    line_total: String,
}

impl TryFrom<LineRow> for FinalizedLine {
    type Error = DbError;

    fn try_from(row: LineRow) -> DbResult<Self> {
        Ok(FinalizedLine {
            unit_price: parse_money("unit_price", &row.unit_price)?,
            line_total: parse_money("line_total", &row.line_total)?,
            item_id: row.item_id,
            name: row.name,
            sku: row.sku,
            quantity: row.quantity,
        })
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    method: String,
    amount: String,
}

impl TryFrom<PaymentRow> for TenderEntry {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> DbResult<Self> {
        Ok(TenderEntry {
            method: row
                .method
                .parse::<PaymentMethod>()
                .map_err(|e| DbError::invalid_data("method", e))?,
            amount: parse_money("amount", &row.amount)?,
        })
    }
}

/// Repository for completed sales.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Writes a finalized sale and decrements stock, all or nothing.
    ///
    /// ## Returns
    /// The generated transaction id.
    ///
    /// ## Errors
    /// - [`DbError::UniqueViolation`] if the receipt id was already used
    /// - [`DbError::NotFound`] if a line's item does not exist
    /// - [`DbError::StockConflict`] if stock on hand is below a line's quantity
    pub async fn record(&self, tx: &FinalizedTransaction) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, receipt_id = %tx.receipt_id, lines = tx.lines.len(), "Recording transaction");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, receipt_id, subtotal, discount_value, discount_type,
                discount_total, tax_rate_bps, tax, grand_total,
                total_tendered, change_due, item_count, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&id)
        .bind(&tx.receipt_id)
        .bind(tx.subtotal.amount().to_string())
        .bind(tx.discount.value().to_string())
        .bind(tx.discount.kind())
        .bind(tx.discount_total.amount().to_string())
        .bind(i64::from(tx.tax_rate.bps()))
        .bind(tx.tax.amount().to_string())
        .bind(tx.grand_total.amount().to_string())
        .bind(tx.total_tendered.amount().to_string())
        .bind(tx.change_due.amount().to_string())
        .bind(tx.item_count())
        .bind(format_timestamp(tx.completed_at))
        .execute(&mut *db_tx)
        .await?;

        for (position, line) in tx.lines.iter().enumerate() {
            let updated = sqlx::query(
                "UPDATE items SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND stock >= ?1",
            )
            .bind(line.quantity)
            .bind(format_timestamp(tx.completed_at))
            .bind(&line.item_id)
            .execute(&mut *db_tx)
            .await?;

            if updated.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar("SELECT stock FROM items WHERE id = ?1")
                    .bind(&line.item_id)
                    .fetch_optional(&mut *db_tx)
                    .await?;
                // Dropping db_tx rolls back
                return Err(match exists {
                    Some(_) => DbError::StockConflict {
                        item_id: line.item_id.clone(),
                        requested: line.quantity,
                    },
                    None => DbError::not_found("Item", &line.item_id),
                });
            }

            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    id, transaction_id, position, item_id, name, sku,
                    unit_price, quantity, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(&line.sku)
            .bind(line.unit_price.amount().to_string())
            .bind(line.quantity)
            .bind(line.line_total.amount().to_string())
            .execute(&mut *db_tx)
            .await?;
        }

        for (position, tender) in tx.tenders.iter().enumerate() {
            sqlx::query(
                "INSERT INTO payments (id, transaction_id, position, method, amount) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(position as i64)
            .bind(tender.method.as_str())
            .bind(tender.amount.amount().to_string())
            .execute(&mut *db_tx)
            .await?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, receipt_id = %tx.receipt_id, total = %tx.grand_total, "Transaction recorded");
        Ok(id)
    }

    pub async fn get_by_receipt(&self, receipt_id: &str) -> DbResult<Option<FinalizedTransaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE receipt_id = ?1");
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(receipt_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Highest numeric suffix among receipt ids shaped
    /// `{prefix}{YYYYMMDD}{sequence}`, across all dates.
    pub async fn last_receipt_sequence(&self, prefix: &str) -> DbResult<Option<u32>> {
        let last: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(CAST(substr(receipt_id, length(?1) + 9) AS INTEGER))
             FROM transactions
             WHERE substr(receipt_id, 1, length(?1)) = ?1
               AND length(receipt_id) > length(?1) + 8",
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;

        last.map(|seq| u32::try_from(seq).map_err(|e| DbError::invalid_data("receipt_id", e)))
            .transpose()
    }

    /// Transactions completed in `[start, end)`, oldest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<FinalizedTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE completed_at >= ?1 AND completed_at < ?2
             ORDER BY completed_at"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(format_timestamp(start))
            .bind(format_timestamp(end))
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(rows).await
    }

    /// Most recent transactions, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<FinalizedTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY completed_at DESC LIMIT ?1"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(rows).await
    }

    async fn hydrate_all(&self, rows: Vec<TransactionRow>) -> DbResult<Vec<FinalizedTransaction>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(self.hydrate(row).await?);
        }
        Ok(out)
    }

    async fn hydrate(&self, row: TransactionRow) -> DbResult<FinalizedTransaction> {
        let lines: Vec<LineRow> = sqlx::query_as(
            "SELECT item_id, name, sku, unit_price, quantity, line_total
             FROM transaction_items WHERE transaction_id = ?1 ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let payments: Vec<PaymentRow> = sqlx::query_as(
            "SELECT method, amount FROM payments WHERE transaction_id = ?1 ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let discount_value: Decimal = row
            .discount_value
            .parse()
            .map_err(|e| DbError::invalid_data("discount_value", e))?;
        let discount = Discount::new(discount_value, row.discount_type)
            .map_err(|e| DbError::invalid_data("discount_value", e))?;

        Ok(FinalizedTransaction {
            receipt_id: row.receipt_id,
            lines: lines
                .into_iter()
                .map(FinalizedLine::try_from)
                .collect::<DbResult<_>>()?,
            subtotal: parse_money("subtotal", &row.subtotal)?,
            discount,
            discount_total: parse_money("discount_total", &row.discount_total)?,
            tax_rate: parse_tax_rate("tax_rate_bps", row.tax_rate_bps)?,
            tax: parse_money("tax", &row.tax)?,
            grand_total: parse_money("grand_total", &row.grand_total)?,
            tenders: payments
                .into_iter()
                .map(TenderEntry::try_from)
                .collect::<DbResult<_>>()?,
            total_tendered: parse_money("total_tendered", &row.total_tendered)?,
            change_due: parse_money("change_due", &row.change_due)?,
            completed_at: parse_timestamp("completed_at", &row.completed_at)?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use pocket_core::{CartState, InventoryItem, Money, PaymentLedger, TaxRate};

    fn chips() -> InventoryItem {
        InventoryItem::new("item-3", "Lay's Chips 50g", "LAY50G", Money::from_cents(225), 25)
    }

    fn soda() -> InventoryItem {
        InventoryItem::new("item-1", "Coca-Cola 330ml", "CC330ML", Money::from_cents(150), 45)
    }

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&soda()).await.unwrap();
        db.items().insert(&chips()).await.unwrap();
        db
    }

    fn finalize(receipt: &str, at: DateTime<Utc>, soda_qty: i64) -> FinalizedTransaction {
        let mut cart = CartState::new(TaxRate::from_bps(850));
        cart.add_item(&soda());
        cart.update_quantity("item-1", soda_qty);
        cart.add_item(&chips());

        let mut ledger = PaymentLedger::new();
        ledger
            .add_tender(PaymentMethod::Visa, Money::from_cents(400))
            .unwrap();
        ledger
            .add_tender(PaymentMethod::Cash, Money::from_cents(10_000))
            .unwrap();

        ledger
            .finalize(&mut cart, || receipt.to_string(), at)
            .unwrap()
    }

    #[tokio::test]
    async fn test_record_round_trip_and_stock_decrement() {
        let db = seeded_db().await;
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        let tx = finalize("RCP202403150001", at, 2);

        db.transactions().record(&tx).await.unwrap();

        let loaded = db
            .transactions()
            .get_by_receipt("RCP202403150001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, tx);
        assert_eq!(loaded.tax, "0.44625".parse::<Money>().unwrap());

        assert_eq!(db.items().get_by_id("item-1").await.unwrap().unwrap().stock, 43);
        assert_eq!(db.items().get_by_id("item-3").await.unwrap().unwrap().stock, 24);
    }

    #[tokio::test]
    async fn test_stock_conflict_rolls_back_everything() {
        let db = seeded_db().await;
        // Cart snapshot says 45 on hand; sell 40 elsewhere first
        db.items().adjust_stock("item-1", -40).await.unwrap();
        let tx = finalize("RCP-CONFLICT", Utc::now(), 10);

        let err = db.transactions().record(&tx).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { .. }));

        assert!(db.transactions().get_by_receipt("RCP-CONFLICT").await.unwrap().is_none());
        assert_eq!(db.items().get_by_id("item-1").await.unwrap().unwrap().stock, 5);
        assert_eq!(db.items().get_by_id("item-3").await.unwrap().unwrap().stock, 25);
    }

    #[tokio::test]
    async fn test_missing_item_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&soda()).await.unwrap();
        let tx = finalize("RCP-MISSING", Utc::now(), 1);

        let err = db.transactions().record(&tx).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.items().get_by_id("item-1").await.unwrap().unwrap().stock, 45);
    }

    #[tokio::test]
    async fn test_duplicate_receipt_rejected() {
        let db = seeded_db().await;
        let tx = finalize("RCP-DUP", Utc::now(), 1);

        db.transactions().record(&tx).await.unwrap();
        let err = db.transactions().record(&tx).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field } => assert_eq!(field, "transactions.receipt_id"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_last_receipt_sequence() {
        let db = seeded_db().await;
        assert_eq!(db.transactions().last_receipt_sequence("RCP").await.unwrap(), None);

        let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        for receipt in ["RCP202403140007", "RCP202403150012", "RCP202403150003", "POS202403150099"] {
            db.transactions().record(&finalize(receipt, at, 1)).await.unwrap();
        }

        assert_eq!(db.transactions().last_receipt_sequence("RCP").await.unwrap(), Some(12));
        assert_eq!(db.transactions().last_receipt_sequence("POS").await.unwrap(), Some(99));
        assert_eq!(db.transactions().last_receipt_sequence("ZZZ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sold_item_cannot_be_deleted() {
        let db = seeded_db().await;
        db.transactions()
            .record(&finalize("RCP-HISTORY", Utc::now(), 1))
            .await
            .unwrap();

        let err = db.items().delete("item-1").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.items().get_by_id("item-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_between_and_recent() {
        let db = seeded_db().await;
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();

        db.transactions()
            .record(&finalize("OLD", now - Duration::days(10), 1))
            .await
            .unwrap();
        db.transactions()
            .record(&finalize("NEW", now - Duration::hours(1), 1))
            .await
            .unwrap();

        let week = db
            .transactions()
            .list_between(now - Duration::days(7), now)
            .await
            .unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week[0].receipt_id, "NEW");

        let recent = db.transactions().recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].receipt_id, "NEW");
        assert_eq!(recent[0].tenders.len(), 2);
        assert_eq!(recent[0].tenders[0].method, PaymentMethod::Visa);
    }
}
