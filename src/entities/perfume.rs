//! Perfume entity - the production catalog.
//!
//! A perfume is identified by its (name, brand) pair compared
//! case-insensitively; no external identifier is trusted across sellers.
//! The folded forms live in `name_key`/`brand_key`, which carry a unique
//! index, so lookups never depend on the database's own case folding.
//! Notes are stored as JSON in the shape of [`crate::core::notes::Notes`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Perfume database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "perfumes")]
pub struct Model {
    /// Unique identifier for the perfume
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Black Orchid")
    pub name: String,
    /// Brand or house (e.g., "Tom Ford")
    pub brand: String,
    /// Trimmed, lowercased `name` used for matching
    pub name_key: String,
    /// Trimmed, lowercased `brand` used for matching
    pub brand_key: String,
    /// Marketing description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Structured top/middle/base notes
    pub notes: Option<Json>,
    /// Image reference
    pub image_url: Option<String>,
    /// E.g., "Eau de Parfum"
    pub concentration: Option<String>,
    /// E.g., "Male", "Female", "Unisex"
    pub gender_affinity: Option<String>,
    /// Year the fragrance was released
    pub launch_year: Option<i32>,
    /// When the perfume was first catalogued
    pub created_at: DateTimeUtc,
    /// When the perfume was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Perfume and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One perfume is listed at many prices
    #[sea_orm(has_many = "super::price::Entity")]
    Prices,
}

impl Related<super::price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
