//! # Reports
//!
//! Sales and stock reports over the SQLite history.
//!
//! Aggregation itself lives in [`pocket_core::report`]; this module only
//! picks the window and loads the rows.

use chrono::{DateTime, Utc};
use tracing::debug;

use pocket_core::report::{ReportPeriod, SalesReport};
use pocket_core::InventoryItem;
use pocket_db::Database;

use crate::error::SessionResult;

/// Sales between the start of `period` and `now`.
pub async fn sales_report(
    db: &Database,
    period: ReportPeriod,
    now: DateTime<Utc>,
) -> SessionResult<SalesReport> {
    debug!(period = period.as_str(), "sales_report");
    sales_report_between(db, period.start(now), now).await
}

/// Sales completed in `[start, end)`. An inverted window is empty.
pub async fn sales_report_between(
    db: &Database,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SessionResult<SalesReport> {
    debug!(%start, %end, "sales_report_between");

    if end <= start {
        return Ok(SalesReport::from_transactions(&[]));
    }
    let transactions = db.transactions().list_between(start, end).await?;
    Ok(SalesReport::from_transactions(&transactions))
}

/// Items at or below their low-stock threshold.
pub async fn low_stock(db: &Database, default_threshold: i64) -> SessionResult<Vec<InventoryItem>> {
    Ok(db.items().low_stock(default_threshold).await?)
}
