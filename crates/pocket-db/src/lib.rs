//! # pocket-db: Database Layer for Pocket POS
//!
//! SQLite storage for inventory items and completed sales, using sqlx for
//! async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pocket POS Data Flow                             │
//! │                                                                         │
//! │  CheckoutSession (pocket-checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pocket-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ItemRepo       │   │ 001_initial_ │  │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRepo│   │ schema.sql   │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (pocket.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Item and transaction repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pocket_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pocket.db")).await?;
//!
//! let item = db.items().get_by_sku("CC330ML").await?;
//! let receipt = db.transactions().get_by_receipt("RCP202403150001").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::item::ItemRepository;
pub use repository::transaction::TransactionRepository;
