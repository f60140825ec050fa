//! # Seed Data
//!
//! Populates the database with the sample store inventory for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p pocket-db --bin seed
//!
//! # Specify database path
//! cargo run -p pocket-db --bin seed -- --db ./data/pocket.db
//! ```

use std::env;

use pocket_core::{InventoryItem, Money, TaxRate, LOW_STOCK_THRESHOLD};
use pocket_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (id, name, sku, barcode, price cents, stock, min stock, category)
const SAMPLE_ITEMS: &[(&str, &str, &str, &str, i64, i64, i64, &str)] = &[
    ("item-1", "Coca-Cola 330ml", "CC330ML", "1234567890123", 150, 45, 10, "Beverages"),
    ("item-2", "Pepsi 330ml", "PP330ML", "1234567890124", 150, 38, 10, "Beverages"),
    ("item-3", "Lay's Chips 50g", "LAY50G", "1234567890125", 225, 25, 15, "Snacks"),
    ("item-4", "Tissue Box", "TIS200", "1234567890126", 399, 8, 5, "Household"),
];

const SAMPLE_TAX_RATE: TaxRate = TaxRate::from_bps(850);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = "./pocket_dev.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pocket POS Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./pocket_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has items, skipping seed");
        return Ok(());
    }

    for &(id, name, sku, barcode, price_cents, stock, min_stock, category) in SAMPLE_ITEMS {
        let mut item = InventoryItem::new(id, name, sku, Money::from_cents(price_cents), stock);
        item.barcode = Some(barcode.to_string());
        item.min_stock = Some(min_stock);
        item.tax_rate = Some(SAMPLE_TAX_RATE);
        item.category_name = Some(category.to_string());

        db.items().insert(&item).await?;
        info!(sku = %sku, price = %item.unit_price, stock, "Inserted item");
    }

    let low = db.items().low_stock(LOW_STOCK_THRESHOLD).await?;
    info!(
        inserted = SAMPLE_ITEMS.len(),
        low_stock = low.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
