//! Staged price entity - one price-level record nested under a staged item.
//!
//! `staged_item_id` is a plain indexed column; the database does not enforce
//! that the parent exists.

use super::sea_orm_active_enums::{ProcessingStatus, ValidationStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staged price database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staged_prices")]
pub struct Model {
    /// Unique identifier for the staged record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent staged item
    pub staged_item_id: i64,
    /// Groups every record written by one ingestion run
    pub import_batch_id: String,
    /// Parser/format that produced the record
    pub source_identifier: String,
    /// Seller code as supplied by the caller
    pub seller_code: Option<String>,
    /// Schema-less snapshot of the parsed price entry
    pub raw_payload: Json,
    /// Validation outcome
    pub validation_status: ValidationStatus,
    /// Reconciliation lifecycle
    pub processing_status: ProcessingStatus,
    /// `{"error": "..."}` when the record failed
    pub error_details: Option<Json>,
    /// Raw asking price
    pub price: Option<Decimal>,
    /// Raw currency code
    pub currency: Option<String>,
    /// Raw size in millilitres
    pub size_ml: Option<i32>,
    /// Normalized stock token
    pub availability: Option<String>,
    /// Normalized format token
    pub item_type: Option<String>,
    /// Raw listing URL
    pub product_url: Option<String>,
    /// Raw promotion text
    #[sea_orm(column_type = "Text", nullable)]
    pub offer_details: Option<String>,
    /// Perfume the parent item was merged into
    pub matched_production_perfume_id: Option<i64>,
    /// Production price this record created or updated
    pub matched_production_price_id: Option<i64>,
    /// When the record was staged
    pub imported_at: DateTimeUtc,
    /// When the reconciler reached a terminal state for this record
    pub processed_at: Option<DateTimeUtc>,
}

/// See [`super::staged_item::Relation`]; the parent link is an index, not a relation.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
