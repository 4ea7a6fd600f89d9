//! Seller entity - retailers and individual sellers that supply price sheets.
//!
//! Sellers are registered out-of-band (see `core::seller::seed_sellers`);
//! staged records reference them only through the stable `code`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seller database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sellers")]
pub struct Model {
    /// Unique identifier for the seller
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stable code used to resolve staged records (e.g., `"nykaa_man"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Display name
    pub name: String,
    /// Logo reference
    pub logo_url: Option<String>,
    /// Storefront URL
    pub website_url: Option<String>,
    /// Average rating out of 5
    pub rating: Option<f64>,
    /// Free-form contact details
    #[sea_orm(column_type = "Text", nullable)]
    pub contact_info: Option<String>,
    /// Classification, e.g. `"official_retailer"` or `"reddit_seller"`
    pub seller_type: Option<String>,
    /// When the seller was registered
    pub created_at: DateTimeUtc,
    /// When the seller was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Seller and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One seller lists many prices
    #[sea_orm(has_many = "super::price::Entity")]
    Prices,
}

impl Related<super::price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
