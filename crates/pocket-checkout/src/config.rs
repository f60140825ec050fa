//! # POS Configuration
//!
//! Store-level settings for the checkout session.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     POCKET_STORE_NAME="Corner Shop"                                    │
//! │     POCKET_TAX_RATE=8.5                                                │
//! │     POCKET_DB_PATH=/data/pocket.db                                     │
//! │     POCKET_PAYMENT_TOLERANCE=0.01                                      │
//! │     POCKET_CURRENCY_SYMBOL=$                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pocket-pos/config.toml (Linux)                           │
//! │     ~/Library/Application Support/com.pocket.pos/config.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     8.5% tax, 0.01 tolerance, low stock at 10                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! store_name = "Corner Shop"
//! currency_symbol = "$"
//! tax_rate_bps = 850
//! payment_tolerance = "0.01"
//! database_path = "/data/pocket.db"
//! low_stock_threshold = 10
//! receipt_prefix = "RCP"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pocket_core::payment::PaymentLedger;
use pocket_core::validation::validate_tax_rate_bps;
use pocket_core::{Money, TaxRate, DEFAULT_TAX_RATE, LOW_STOCK_THRESHOLD};
use pocket_db::DbConfig;

use crate::error::{SessionError, SessionResult};

/// File name inside the platform config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// File name inside the platform data directory.
const DATABASE_FILE_NAME: &str = "pocket.db";

/// Store settings consumed by the checkout session, receipts and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosConfig {
    /// Printed at the top of every receipt.
    pub store_name: String,

    /// Prefix used when formatting amounts for display.
    pub currency_symbol: String,

    /// Sales tax in basis points (850 = 8.5%).
    pub tax_rate_bps: u32,

    /// Largest unpaid remainder that still counts as fully paid.
    pub payment_tolerance: Money,

    /// SQLite file. Falls back to the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Used for items without their own `min_stock`.
    pub low_stock_threshold: i64,

    /// Leading characters of generated receipt numbers.
    pub receipt_prefix: String,
}

impl Default for PosConfig {
    fn default() -> Self {
        PosConfig {
            store_name: "Pocket POS".to_string(),
            currency_symbol: "$".to_string(),
            tax_rate_bps: DEFAULT_TAX_RATE.bps(),
            payment_tolerance: PaymentLedger::default_tolerance(),
            database_path: None,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            receipt_prefix: "RCP".to_string(),
        }
    }
}

impl PosConfig {
    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads configuration: defaults, then the TOML file, then environment
    /// overrides, then validation.
    pub fn load(config_path: Option<PathBuf>) -> SessionResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading POS config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load POS config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn from_file(path: &Path) -> SessionResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SessionError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml(contents: &str) -> SessionResult<Self> {
        toml::from_str(contents).map_err(|e| SessionError::config(e.to_string()))
    }

    /// Applies `POCKET_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("POCKET_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store_name = name;
        }

        if let Some(raw) = lookup("POCKET_TAX_RATE") {
            match TaxRate::from_str(&raw) {
                Ok(rate) => {
                    debug!(tax_rate = %rate, "Overriding tax rate from environment");
                    self.tax_rate_bps = rate.bps();
                }
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid POCKET_TAX_RATE"),
            }
        }

        if let Some(path) = lookup("POCKET_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup("POCKET_PAYMENT_TOLERANCE") {
            match Money::from_str(&raw) {
                Ok(tolerance) => self.payment_tolerance = tolerance,
                Err(e) => {
                    warn!(value = %raw, error = %e, "Ignoring invalid POCKET_PAYMENT_TOLERANCE")
                }
            }
        }

        if let Some(symbol) = lookup("POCKET_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SessionResult<()> {
        if self.store_name.trim().is_empty() {
            return Err(SessionError::config("store_name must not be empty"));
        }

        validate_tax_rate_bps(self.tax_rate_bps)
            .map_err(|e| SessionError::config(e.to_string()))?;

        if self.payment_tolerance.is_negative() {
            return Err(SessionError::config("payment_tolerance must not be negative"));
        }

        if self.low_stock_threshold < 0 {
            return Err(SessionError::config(
                "low_stock_threshold must not be negative",
            ));
        }

        if self.receipt_prefix.trim().is_empty() {
            return Err(SessionError::config("receipt_prefix must not be empty"));
        }

        Ok(())
    }

    /// Returns the default config file path for this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pocket", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Configured database path, else `pocket.db` in the platform data
    /// directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        directories::ProjectDirs::from("com", "pocket", "pos")
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
    }

    /// Formats an amount for display, e.g. `$5.70` or `-$1.25`.
    pub fn format_money(&self, amount: Money) -> String {
        let rounded = amount.rounded();
        let sign = if rounded.is_negative() { "-" } else { "" };
        format!("{}{}{}", sign, self.currency_symbol, rounded.abs().amount())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PosConfig::default();
        assert_eq!(config.tax_rate(), TaxRate::from_bps(850));
        assert_eq!(config.payment_tolerance, Money::from_cents(1));
        assert_eq!(config.low_stock_threshold, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PosConfig::from_toml(
            r#"
            store_name = "Corner Shop"
            tax_rate_bps = 700
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Corner Shop");
        assert_eq!(config.tax_rate_bps, 700);
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.receipt_prefix, "RCP");
    }

    #[test]
    fn test_malformed_toml() {
        let err = PosConfig::from_toml("tax_rate_bps = \"lots\"").unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PosConfig::default();
        config.apply_overrides_from(lookup_from(&[
            ("POCKET_STORE_NAME", "Night Market"),
            ("POCKET_TAX_RATE", "7.25%"),
            ("POCKET_DB_PATH", "/tmp/pocket.db"),
            ("POCKET_PAYMENT_TOLERANCE", "0.05"),
            ("POCKET_CURRENCY_SYMBOL", "€"),
        ]));

        assert_eq!(config.store_name, "Night Market");
        assert_eq!(config.tax_rate_bps, 725);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/pocket.db"));
        assert_eq!(config.payment_tolerance, Money::from_cents(5));
        assert_eq!(config.currency_symbol, "€");
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = PosConfig::default();
        config.apply_overrides_from(lookup_from(&[
            ("POCKET_TAX_RATE", "abc"),
            ("POCKET_PAYMENT_TOLERANCE", "a cent"),
        ]));

        assert_eq!(config.tax_rate_bps, 850);
        assert_eq!(config.payment_tolerance, Money::from_cents(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PosConfig::default();
        config.tax_rate_bps = 10_001;
        assert!(config.validate().is_err());

        let mut config = PosConfig::default();
        config.payment_tolerance = Money::from_cents(-1);
        assert!(config.validate().is_err());

        let mut config = PosConfig::default();
        config.store_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "pocket-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "store_name = \"File Store\"\nlow_stock_threshold = 3\n").unwrap();

        let config = PosConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.low_stock_threshold, 3);
    }

    #[test]
    fn test_format_money() {
        let config = PosConfig::default();
        assert_eq!(config.format_money(Money::from_cents(570)), "$5.70");
        assert_eq!(config.format_money(Money::from_cents(-125)), "-$1.25");
    }
}
