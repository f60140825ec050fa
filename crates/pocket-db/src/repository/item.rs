//! # Item Repository
//!
//! Inventory records: lookup by id, SKU or barcode, search, stock.
//!
//! ## Lookup Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Barcode scanner ──► get_by_barcode("1234567890123")                    │
//! │  Manual entry    ──► get_by_sku("CC330ML")                              │
//! │  Search box      ──► search("cola", 20)  name / SKU / barcode          │
//! │  Cart line       ──► get_by_id(item_id)                                 │
//! │  Category filter ──► list_by_category("Beverages")                      │
//! │                                                                         │
//! │  All four return the same InventoryItem shape the cart expects.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use pocket_core::InventoryItem;

use super::{format_timestamp, parse_money, parse_tax_rate};
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str =
    "id, sku, barcode, name, unit_price, stock, min_stock, tax_rate_bps, category_name";

/// Row shape of the `items` table.
#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    sku: String,
    barcode: Option<String>,
    name: String,
    unit_price: String,
    stock: i64,
    min_stock: Option<i64>,
    tax_rate_bps: Option<i64>,
    category_name: Option<String>,
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        Ok(InventoryItem {
            unit_price: parse_money("unit_price", &row.unit_price)?,
            tax_rate: row
                .tax_rate_bps
                .map(|bps| parse_tax_rate("tax_rate_bps", bps))
                .transpose()?,
            item_id: row.id,
            name: row.name,
            sku: row.sku,
            barcode: row.barcode,
            stock: row.stock,
            min_stock: row.min_stock,
            category_name: row.category_name,
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> DbResult<Vec<InventoryItem>> {
    rows.into_iter().map(InventoryItem::try_from).collect()
}

/// Repository for inventory items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE {column} = ?1");
        let row: Option<ItemRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(InventoryItem::try_from).transpose()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        self.fetch_one_by("id", id).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<InventoryItem>> {
        self.fetch_one_by("sku", sku.trim()).await
    }

    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<InventoryItem>> {
        self.fetch_one_by("barcode", barcode.trim()).await
    }

    /// Case-insensitive substring search over name, SKU and barcode.
    ///
    /// An empty query lists items by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<InventoryItem>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching items");

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE ?1 = ''
                OR instr(lower(name), lower(?1)) > 0
                OR instr(lower(sku), lower(?1)) > 0
                OR instr(COALESCE(barcode, ''), ?1) > 0
             ORDER BY name
             LIMIT ?2"
        );
        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned items");
        into_items(rows)
    }

    /// Inserts a validated item.
    pub async fn insert(&self, item: &InventoryItem) -> DbResult<()> {
        item.validate()
            .map_err(|e| DbError::invalid_data("item", e))?;
        debug!(id = %item.item_id, sku = %item.sku, "Inserting item");

        let now = format_timestamp(Utc::now());
        sqlx::query(
            r#"
            INSERT INTO items (
                id, sku, barcode, name, unit_price, stock,
                min_stock, tax_rate_bps, category_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&item.item_id)
        .bind(&item.sku)
        .bind(&item.barcode)
        .bind(&item.name)
        .bind(item.unit_price.amount().to_string())
        .bind(item.stock)
        .bind(item.min_stock)
        .bind(item.tax_rate.map(|r| i64::from(r.bps())))
        .bind(&item.category_name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Rewrites every editable column of an existing item.
    ///
    /// Fails with [`DbError::NotFound`] when no row has `item.item_id`.
    pub async fn update(&self, item: &InventoryItem) -> DbResult<()> {
        item.validate()
            .map_err(|e| DbError::invalid_data("item", e))?;
        debug!(id = %item.item_id, sku = %item.sku, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                sku = ?2, barcode = ?3, name = ?4, unit_price = ?5, stock = ?6,
                min_stock = ?7, tax_rate_bps = ?8, category_name = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&item.item_id)
        .bind(&item.sku)
        .bind(&item.barcode)
        .bind(&item.name)
        .bind(item.unit_price.amount().to_string())
        .bind(item.stock)
        .bind(item.min_stock)
        .bind(item.tax_rate.map(|r| i64::from(r.bps())))
        .bind(&item.category_name)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.item_id));
        }
        Ok(())
    }

    /// Removes an item.
    ///
    /// Items that appear on a recorded sale are kept for history and fail
    /// with [`DbError::ForeignKeyViolation`].
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }
        Ok(())
    }

    /// Distinct category names in use, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category_name FROM items
             WHERE category_name IS NOT NULL AND category_name <> ''
             ORDER BY category_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE category_name = ?1 ORDER BY name"
        );
        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .bind(category.trim())
            .fetch_all(&self.pool)
            .await?;

        into_items(rows)
    }

    /// Adds `delta` to the stock level and returns the new level.
    ///
    /// Fails with [`DbError::NotFound`] for an unknown id and with
    /// [`DbError::QueryFailed`] if stock would go negative.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = delta, "Adjusting stock");

        let stock: Option<i64> = sqlx::query_scalar(
            "UPDATE items SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3 RETURNING stock",
        )
        .bind(delta)
        .bind(format_timestamp(Utc::now()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        stock.ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Items at or below their own `min_stock`, or `default_threshold`
    /// when they have none. Lowest stock first.
    pub async fn low_stock(&self, default_threshold: i64) -> DbResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE stock <= COALESCE(min_stock, ?1)
             ORDER BY stock, name"
        );
        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .bind(default_threshold)
            .fetch_all(&self.pool)
            .await?;

        into_items(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use pocket_core::{Money, TaxRate, LOW_STOCK_THRESHOLD};

    fn coke() -> InventoryItem {
        let mut item = InventoryItem::new("item-1", "Coca-Cola 330ml", "CC330ML", Money::from_cents(150), 45);
        item.barcode = Some("1234567890123".to_string());
        item.min_stock = Some(10);
        item.tax_rate = Some(TaxRate::from_bps(850));
        item.category_name = Some("Beverages".to_string());
        item
    }

    fn tissue() -> InventoryItem {
        let mut item = InventoryItem::new("item-4", "Tissue Box", "TIS200", Money::from_cents(399), 8);
        item.min_stock = Some(5);
        item
    }

    async fn db_with_items() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.items().insert(&coke()).await.unwrap();
        db.items().insert(&tissue()).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_lookup_paths_agree() {
        let db = db_with_items().await;
        let items = db.items();

        let by_id = items.get_by_id("item-1").await.unwrap().unwrap();
        let by_sku = items.get_by_sku("CC330ML").await.unwrap().unwrap();
        let by_barcode = items.get_by_barcode("1234567890123").await.unwrap().unwrap();

        assert_eq!(by_id, coke());
        assert_eq!(by_id, by_sku);
        assert_eq!(by_id, by_barcode);
        assert!(items.get_by_sku("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search() {
        let db = db_with_items().await;

        let hits = db.items().search("cola", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "CC330ML");

        let hits = db.items().search("tis", 20).await.unwrap();
        assert_eq!(hits[0].name, "Tissue Box");

        let all = db.items().search("  ", 20).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = db_with_items().await;
        let mut dup = tissue();
        dup.item_id = "item-99".to_string();

        let err = db.items().insert(&dup).await.unwrap_err();
        match &err {
            DbError::UniqueViolation { field } => assert_eq!(field, "items.sku"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
        assert!(!err.to_string().contains("unknown"));
    }

    #[tokio::test]
    async fn test_update_item() {
        let db = db_with_items().await;
        let mut tissue = tissue();
        tissue.name = "Tissue Box 200".to_string();
        tissue.unit_price = Money::from_cents(425);
        tissue.category_name = Some("Household".to_string());

        db.items().update(&tissue).await.unwrap();
        assert_eq!(db.items().get_by_id("item-4").await.unwrap().unwrap(), tissue);

        let mut ghost = tissue.clone();
        ghost.item_id = "ghost".to_string();
        ghost.sku = "GHOST1".to_string();
        assert!(matches!(
            db.items().update(&ghost).await,
            Err(DbError::NotFound { .. })
        ));

        // Taking another item's SKU
        let mut clash = tissue.clone();
        clash.sku = "CC330ML".to_string();
        assert!(matches!(
            db.items().update(&clash).await,
            Err(DbError::UniqueViolation { .. })
        ));

        let mut invalid = tissue;
        invalid.unit_price = Money::from_cents(-1);
        assert!(matches!(
            db.items().update(&invalid).await,
            Err(DbError::InvalidData { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_item() {
        let db = db_with_items().await;

        db.items().delete("item-4").await.unwrap();
        assert!(db.items().get_by_id("item-4").await.unwrap().is_none());
        assert_eq!(db.items().count().await.unwrap(), 1);

        assert!(matches!(
            db.items().delete("item-4").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_categories() {
        let db = db_with_items().await;
        let mut pepsi = InventoryItem::new("item-2", "Pepsi 330ml", "PP330ML", Money::from_cents(150), 38);
        pepsi.category_name = Some("Beverages".to_string());
        db.items().insert(&pepsi).await.unwrap();
        let mut chips = InventoryItem::new("item-3", "Lay's Chips 50g", "LAY50G", Money::from_cents(225), 25);
        chips.category_name = Some("Snacks".to_string());
        db.items().insert(&chips).await.unwrap();

        assert_eq!(
            db.items().categories().await.unwrap(),
            vec!["Beverages".to_string(), "Snacks".to_string()]
        );

        let drinks = db.items().list_by_category("Beverages").await.unwrap();
        let names: Vec<_> = drinks.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Coca-Cola 330ml", "Pepsi 330ml"]);
        assert!(db.items().list_by_category("Toys").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = db_with_items().await;

        assert_eq!(db.items().adjust_stock("item-4", -3).await.unwrap(), 5);
        assert_eq!(db.items().adjust_stock("item-4", 10).await.unwrap(), 15);
        assert!(matches!(
            db.items().adjust_stock("ghost", 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(db.items().adjust_stock("item-4", -100).await.is_err());
    }

    #[tokio::test]
    async fn test_low_stock_uses_item_threshold() {
        let db = db_with_items().await;

        // Tissue: 8 > min 5, Coke: 45 > min 10
        assert!(db.items().low_stock(LOW_STOCK_THRESHOLD).await.unwrap().is_empty());

        db.items().adjust_stock("item-4", -3).await.unwrap();
        let low = db.items().low_stock(LOW_STOCK_THRESHOLD).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].item_id, "item-4");
    }

    #[tokio::test]
    async fn test_count() {
        let db = db_with_items().await;
        assert_eq!(db.items().count().await.unwrap(), 2);
    }
}
