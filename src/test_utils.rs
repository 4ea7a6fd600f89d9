//! Shared test utilities for `scent-compare`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating sellers, catalog entries and parsed packets with sensible
//! defaults.

use crate::{
    config::SellerConfig,
    core::{
        observer::{IngestionEvent, IngestionObserver},
        perfume::{self, PerfumeAttributes},
        price::{DEFAULT_ITEM_TYPE, IN_STOCK},
        seller,
        staging::{StagingCounts, stage_parsed_data},
    },
    entities,
    errors::Result,
    parsers::{ParsedPerfume, ParsedPrice},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a seller configuration with only code and name set.
pub fn seller_config(code: &str, name: &str) -> SellerConfig {
    SellerConfig {
        code: code.to_string(),
        name: name.to_string(),
        ..SellerConfig::default()
    }
}

/// Creates a test seller named `"Seller {code}"`.
pub async fn create_test_seller(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::seller::Model> {
    seller::create_seller(db, &seller_config(code, &format!("Seller {code}"))).await
}

/// Sets up a complete test environment with a seller and a perfume.
/// Returns (db, seller, perfume) for price-related tests.
pub async fn setup_with_catalog() -> Result<(
    DatabaseConnection,
    entities::seller::Model,
    entities::perfume::Model,
)> {
    let db = setup_test_db().await?;
    let seller = create_test_seller(&db, "test_seller").await?;
    let perfume =
        perfume::create_perfume(&db, "Test Perfume", "Test House", &PerfumeAttributes::default())
            .await?;
    Ok((db, seller, perfume))
}

/// Builds a parsed price entry.
///
/// # Defaults
/// * `currency`: `"INR"`
/// * `stock_status`: `"in_stock"`
/// * `item_type`: `"full_bottle"`
pub fn price_entry(size_ml: i32, amount: i64) -> ParsedPrice {
    ParsedPrice {
        price: Some(Decimal::new(amount, 0)),
        currency: Some("INR".to_string()),
        size_ml: Some(size_ml),
        stock_status: Some(IN_STOCK.to_string()),
        product_url: None,
        item_type: Some(DEFAULT_ITEM_TYPE.to_string()),
        offer_details: None,
    }
}

/// Builds a parsed packet with one price entry per `(size_ml, amount)` pair.
pub fn packet(name: &str, brand: &str, prices: &[(i32, i64)]) -> ParsedPerfume {
    ParsedPerfume {
        perfume_name: Some(name.to_string()),
        brand: Some(brand.to_string()),
        prices: prices
            .iter()
            .map(|&(size_ml, amount)| price_entry(size_ml, amount))
            .collect(),
        ..ParsedPerfume::default()
    }
}

/// Stages `packets` for `seller_code` under `batch_id`, discarding events.
pub async fn stage_for_seller(
    db: &DatabaseConnection,
    batch_id: &str,
    seller_code: &str,
    packets: &[ParsedPerfume],
) -> Result<StagingCounts> {
    stage_parsed_data(
        db,
        packets,
        "excel_import_standard_v1",
        batch_id,
        seller_code,
        &RecordingObserver::default(),
    )
    .await
}

/// Observer that keeps every event as text so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(bool, String)>>,
}

impl RecordingObserver {
    /// Every event received so far, rendered with `Display`.
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.iter().map(|(_, text)| text.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of warning or failure events received so far.
    pub fn problem_count(&self) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|(problem, _)| *problem).count())
            .unwrap_or_default()
    }
}

impl IngestionObserver for RecordingObserver {
    fn notify(&self, event: &IngestionEvent<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.is_problem(), event.to_string()));
        }
    }
}
