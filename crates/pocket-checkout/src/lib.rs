//! # pocket-checkout: Checkout Orchestration for Pocket POS
//!
//! Drives one sale at a time on top of the pure cart and payment logic in
//! `pocket-core`, with `pocket-db` as the default inventory and persistence
//! backend.
//!
//! ## Module Organization
//! ```text
//! pocket_checkout/
//! ├── lib.rs            ◄─── You are here (startup & tracing)
//! ├── session.rs        ◄─── CheckoutSession: cart + tenders + finalize
//! ├── collaborators.rs  ◄─── InventoryLookup / TransactionSink / receipt ids
//! ├── config.rs         ◄─── PosConfig (defaults → TOML → env)
//! ├── receipt.rs        ◄─── Receipt numbers and receipt view
//! ├── reports.rs        ◄─── Sales and low-stock reports
//! └── error.rs          ◄─── SessionError + ErrorCode
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()           RUST_LOG or the default filter             │
//! │  2. PosConfig::load(None)    platform config dir + POCKET_* overrides   │
//! │  3. open_session(&config)    SQLite pool, migrations, session          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use pocket_checkout::{init_tracing, open_session, LookupKey, PosConfig};
//! use pocket_core::PaymentMethod;
//!
//! init_tracing();
//! let config = PosConfig::load(None)?;
//! let session = open_session(&config).await?;
//!
//! session.add_by_lookup(&LookupKey::from_scan("1234567890123")).await?;
//! session.tender_exact_cash()?;
//! let sale = session.finalize().await?;
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod receipt;
pub mod reports;
pub mod session;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pocket_db::Database;

pub use collaborators::{InventoryLookup, LookupKey, ReceiptIdGenerator, TransactionSink};
pub use config::PosConfig;
pub use error::{ErrorCode, SessionError, SessionResult};
pub use receipt::{ReceiptView, SequentialReceiptIds};
pub use session::{CheckoutSession, CompletedSale, PaymentStatus};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str =
    "info,pocket_core=debug,pocket_db=debug,pocket_checkout=debug,sqlx=warn";

/// Installs the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Err only when a subscriber is already installed
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Opens the configured database and returns a session backed by it.
pub async fn open_session(config: &PosConfig) -> SessionResult<CheckoutSession> {
    let db_config = config.db_config();
    info!(
        location = %db_config.location,
        store = %config.store_name,
        "Opening checkout session"
    );

    let db = Database::new(db_config).await?;
    CheckoutSession::with_database(config, db).await
}
