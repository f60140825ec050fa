//! # Collaborators
//!
//! Contracts the checkout session needs from the outside world, and their
//! SQLite implementations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CheckoutSession Collaborators                       │
//! │                                                                         │
//! │   InventoryLookup      LookupKey ──► Option<InventoryItem>             │
//! │   TransactionSink      FinalizedTransaction ──► transaction id         │
//! │   ReceiptIdGenerator   () ──► "RCP202403150001"                        │
//! │                                                                         │
//! │   pocket_db::Database implements the first two;                        │
//! │   SequentialReceiptIds (receipt.rs) implements the third.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use pocket_core::validation::validate_barcode;
use pocket_core::{FinalizedTransaction, InventoryItem};
use pocket_db::Database;

use crate::error::{SessionError, SessionResult};

/// How the cashier identified an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Id(String),
    Sku(String),
    Barcode(String),
}

impl LookupKey {
    /// Classifies scanner or keypad input: a valid barcode is looked up as
    /// a barcode, anything else as a SKU.
    pub fn from_scan(input: &str) -> Self {
        let input = input.trim();
        if validate_barcode(input).is_ok() {
            LookupKey::Barcode(input.to_string())
        } else {
            LookupKey::Sku(input.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            LookupKey::Id(v) | LookupKey::Sku(v) | LookupKey::Barcode(v) => v,
        }
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKey::Id(v) => write!(f, "id {}", v),
            LookupKey::Sku(v) => write!(f, "SKU {}", v),
            LookupKey::Barcode(v) => write!(f, "barcode {}", v),
        }
    }
}

/// Resolves an item record by id, SKU or barcode.
#[async_trait]
pub trait InventoryLookup: Send + Sync {
    async fn find(&self, key: &LookupKey) -> SessionResult<Option<InventoryItem>>;
}

/// Durably records a finalized sale.
///
/// Implementations write the transaction, its lines, its tenders and the
/// per-line stock decrements as one atomic batch and return the stored id.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    async fn persist(&self, transaction: &FinalizedTransaction) -> SessionResult<String>;
}

/// Issues receipt numbers. Called exactly once per successful finalize.
pub trait ReceiptIdGenerator: Send + Sync {
    fn next_receipt_id(&self) -> String;
}

// =============================================================================
// SQLite Implementations
// =============================================================================

#[async_trait]
impl InventoryLookup for Database {
    async fn find(&self, key: &LookupKey) -> SessionResult<Option<InventoryItem>> {
        let items = self.items();
        let item = match key {
            LookupKey::Id(id) => items.get_by_id(id).await?,
            LookupKey::Sku(sku) => items.get_by_sku(sku).await?,
            LookupKey::Barcode(barcode) => items.get_by_barcode(barcode).await?,
        };
        Ok(item)
    }
}

#[async_trait]
impl TransactionSink for Database {
    async fn persist(&self, transaction: &FinalizedTransaction) -> SessionResult<String> {
        self.transactions()
            .record(transaction)
            .await
            .map_err(|e| SessionError::Persistence {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocket_core::Money;
    use pocket_db::DbConfig;

    #[test]
    fn test_from_scan() {
        assert_eq!(
            LookupKey::from_scan(" 1234567890123 "),
            LookupKey::Barcode("1234567890123".to_string())
        );
        assert_eq!(
            LookupKey::from_scan("CC330ML"),
            LookupKey::Sku("CC330ML".to_string())
        );
        // Too short for a barcode
        assert_eq!(LookupKey::from_scan("1234"), LookupKey::Sku("1234".to_string()));
    }

    #[tokio::test]
    async fn test_database_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut item = InventoryItem::new("item-1", "Coca-Cola 330ml", "CC330ML", Money::from_cents(150), 45);
        item.barcode = Some("1234567890123".to_string());
        db.items().insert(&item).await.unwrap();

        let by_sku = db.find(&LookupKey::Sku("CC330ML".into())).await.unwrap();
        let by_barcode = db.find(&LookupKey::from_scan("1234567890123")).await.unwrap();
        let by_id = db.find(&LookupKey::Id("item-1".into())).await.unwrap();

        assert_eq!(by_sku.as_ref(), Some(&item));
        assert_eq!(by_barcode.as_ref(), Some(&item));
        assert_eq!(by_id, Some(item));

        let missing = db.find(&LookupKey::Sku("NOPE".into())).await.unwrap();
        assert!(missing.is_none());
    }
}
