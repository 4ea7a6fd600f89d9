//! Price entity - one seller's offer for one perfume in one size and format.
//!
//! The tuple (`perfume_id`, `seller_id`, `size_ml`, `item_type`) is unique and
//! is the key the reconciler de-duplicates on. Listings are never deleted;
//! a listing missing from a seller's latest sheet is flipped to
//! `out_of_stock` instead.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prices")]
pub struct Model {
    /// Unique identifier for the price
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Perfume being offered
    pub perfume_id: i64,
    /// Seller making the offer
    pub seller_id: i64,
    /// Asking price
    pub amount: Decimal,
    /// ISO currency code, e.g. `"INR"`
    pub currency: String,
    /// Normalized stock token (`in_stock`, `out_of_stock`, `pre_order`, ...)
    pub stock_status: String,
    /// Listing URL on the seller's site
    pub product_url: Option<String>,
    /// Bottle or decant size in millilitres
    pub size_ml: i32,
    /// Normalized format token (`full_bottle`, `decant`, ...)
    pub item_type: String,
    /// Free-text promotion details
    #[sea_orm(column_type = "Text", nullable)]
    pub offer_details: Option<String>,
    /// When the offer was last confirmed or changed
    pub last_updated: DateTimeUtc,
    /// When the offer was first seen
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Price and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each price belongs to one perfume
    #[sea_orm(
        belongs_to = "super::perfume::Entity",
        from = "Column::PerfumeId",
        to = "super::perfume::Column::Id"
    )]
    Perfume,
    /// Each price belongs to one seller
    #[sea_orm(
        belongs_to = "super::seller::Entity",
        from = "Column::SellerId",
        to = "super::seller::Column::Id"
    )]
    Seller,
    /// One price accumulates many history entries
    #[sea_orm(has_many = "super::price_history::Entity")]
    PriceHistories,
}

impl Related<super::perfume::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Perfume.def()
    }
}

impl Related<super::seller::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::price_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
