//! Application configuration loading from config.toml
//!
//! The file carries the database location, reconciler defaults and the list
//! of known sellers. Sellers are registered from here because the ingestion
//! pipeline never creates them on its own.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default number of staged items drained per reconciliation run
pub const DEFAULT_PROCESS_LIMIT: u64 = 100;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` in the environment takes precedence
    #[serde(default)]
    pub database_url: Option<String>,
    /// Pipeline tuning
    #[serde(default)]
    pub ingestion: IngestionSettings,
    /// Sellers to register on `seed-sellers`
    #[serde(default)]
    pub sellers: Vec<SellerConfig>,
}

/// Reconciler and parser defaults
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestionSettings {
    /// Row limit used when the caller does not pass one
    pub default_limit: u64,
    /// Stock status assumed when a sheet leaves the column blank
    pub default_stock_status: String,
    /// Item type assumed when a sheet leaves the column blank
    pub default_item_type: String,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PROCESS_LIMIT,
            default_stock_status: "in_stock".to_string(),
            default_item_type: "full_bottle".to_string(),
        }
    }
}

/// Configuration for a single seller
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SellerConfig {
    /// Stable code sellers' sheets are ingested under
    pub code: String,
    /// Display name
    pub name: String,
    /// Logo reference
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Storefront URL
    #[serde(default)]
    pub website_url: Option<String>,
    /// Average rating out of 5
    #[serde(default)]
    pub rating: Option<f64>,
    /// Free-form contact details
    #[serde(default)]
    pub contact_info: Option<String>,
    /// Classification such as `official_retailer`
    #[serde(default)]
    pub seller_type: Option<String>,
}

impl AppConfig {
    /// Resolves the database URL: environment first, then the file, then a
    /// local `SQLite` file.
    #[must_use]
    pub fn resolved_database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| super::database::DEFAULT_DATABASE_URL.to_string())
    }

    fn validate(&self) -> Result<()> {
        if self.ingestion.default_limit == 0 {
            return Err(Error::Config {
                message: "ingestion.default_limit must be a positive integer".to_string(),
            });
        }
        if let Some(seller) = self.sellers.iter().find(|s| s.code.trim().is_empty()) {
            return Err(Error::Config {
                message: format!("Seller '{}' has an empty code", seller.name),
            });
        }
        Ok(())
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range (zero limit, empty seller code)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `./config.toml`, falling back to defaults when
/// the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!("No config.toml found; using built-in defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_app_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"

            [ingestion]
            default_limit = 250

            [[sellers]]
            code = "nykaa_man"
            name = "Nykaa Man"
            rating = 4.6
            seller_type = "official_retailer"

            [[sellers]]
            code = "reddit_decants"
            name = "Reddit Decants"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.ingestion.default_limit, 250);
        assert_eq!(config.ingestion.default_item_type, "full_bottle");
        assert_eq!(config.sellers.len(), 2);
        assert_eq!(config.sellers[0].rating, Some(4.6));
        assert!(config.sellers[1].seller_type.is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.ingestion.default_limit, DEFAULT_PROCESS_LIMIT);
        assert_eq!(config.ingestion.default_stock_status, "in_stock");
        assert!(config.sellers.is_empty());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingestion]\ndefault_limit = 0").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("/definitely/not/here/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
