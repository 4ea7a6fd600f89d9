/// Application settings loaded from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

pub use app::{AppConfig, IngestionSettings, SellerConfig, load_config, load_default_config};
