//! Entity module - Contains all SeaORM entity definitions for the database.
//! Production tables (perfumes, sellers, prices, price histories) and the two
//! staging tables the ingestion pipeline writes to.

pub mod perfume;
pub mod price;
pub mod price_history;
pub mod sea_orm_active_enums;
pub mod seller;
pub mod staged_item;
pub mod staged_price;

// Re-export specific types to avoid conflicts
pub use perfume::{Column as PerfumeColumn, Entity as Perfume, Model as PerfumeModel};
pub use price::{Column as PriceColumn, Entity as Price, Model as PriceModel};
pub use price_history::{
    Column as PriceHistoryColumn, Entity as PriceHistory, Model as PriceHistoryModel,
};
pub use sea_orm_active_enums::{ProcessingStatus, ValidationStatus};
pub use seller::{Column as SellerColumn, Entity as Seller, Model as SellerModel};
pub use staged_item::{
    Column as StagedItemColumn, Entity as StagedItem, Model as StagedItemModel,
};
pub use staged_price::{
    Column as StagedPriceColumn, Entity as StagedPrice, Model as StagedPriceModel,
};
