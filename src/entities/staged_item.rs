//! Staged item entity - one perfume-level record produced by a source parser.
//!
//! Staged items are immutable inputs: only the status, error and linkage
//! columns change after staging. The full parsed packet is kept verbatim in
//! `raw_payload`; the extracted columns exist for querying and reconciling.

use super::sea_orm_active_enums::{ProcessingStatus, ValidationStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staged item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staged_items")]
pub struct Model {
    /// Unique identifier for the staged record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Groups every record written by one ingestion run
    pub import_batch_id: String,
    /// Parser/format that produced the record
    pub source_identifier: String,
    /// Seller code as supplied by the caller, not yet resolved
    pub seller_code: Option<String>,
    /// Schema-less snapshot of the parsed packet
    pub raw_payload: Json,
    /// Validation outcome
    pub validation_status: ValidationStatus,
    /// Reconciliation lifecycle
    pub processing_status: ProcessingStatus,
    /// `{"error": "..."}` when the record failed
    pub error_details: Option<Json>,
    /// Perfume this record was merged into
    pub matched_production_id: Option<i64>,
    /// Raw perfume name
    pub perfume_name: Option<String>,
    /// Raw brand name
    pub brand_name: Option<String>,
    /// Raw concentration
    pub concentration: Option<String>,
    /// Raw gender affinity
    pub gender: Option<String>,
    /// Raw description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Notes parsed into top/middle/base groups
    pub notes: Option<Json>,
    /// Raw image URL
    pub image_url: Option<String>,
    /// Raw listing URL, used when a price entry has none of its own
    pub product_url: Option<String>,
    /// Raw launch year
    pub launch_year: Option<i32>,
    /// Representative size in millilitres
    pub size_ml: Option<i32>,
    /// When the record was staged
    pub imported_at: DateTimeUtc,
    /// When the reconciler reached a terminal state for this record
    pub processed_at: Option<DateTimeUtc>,
}

/// Staged items link to their prices through an indexed column rather than a
/// declared relation, so no relations are defined here.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
