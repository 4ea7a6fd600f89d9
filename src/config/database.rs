//! Database configuration module.
//!
//! Establishes the `SQLite` connection and creates every table from the
//! entity definitions with `Schema::create_table_from_entity`, so the schema
//! always matches the Rust structs. Indexes the entities cannot express
//! (the composite unique listing key, the staged price parent lookup) are
//! issued as explicit `Index` statements.

use crate::entities::{
    Perfume, Price, PriceHistory, Seller, StagedItem, StagedPrice, perfume, price, staged_item,
    staged_price,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;

/// Local database used when neither `DATABASE_URL` nor config.toml name one
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/scent_compare.sqlite?mode=rwc";

/// File path of a `SQLite` URL, or `None` for in-memory and non-file URLs.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

/// Establishes a connection to the database at `database_url`, creating the
/// parent directory of a `SQLite` file first.
///
/// # Errors
/// Returns an error if the directory cannot be created or the connection
/// cannot be opened.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url)
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(url = %database_url, "Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn index_statements() -> Vec<IndexCreateStatement> {
    vec![
        // One perfume per case-folded (name, brand)
        Index::create()
            .name("idx_perfumes_identity")
            .table(Perfume)
            .col(perfume::Column::NameKey)
            .col(perfume::Column::BrandKey)
            .unique()
            .if_not_exists()
            .to_owned(),
        // One production price per (perfume, seller, size, item type)
        Index::create()
            .name("idx_prices_listing_key")
            .table(Price)
            .col(price::Column::PerfumeId)
            .col(price::Column::SellerId)
            .col(price::Column::SizeMl)
            .col(price::Column::ItemType)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_staged_prices_staged_item_id")
            .table(StagedPrice)
            .col(staged_price::Column::StagedItemId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_staged_items_status")
            .table(StagedItem)
            .col(staged_item::Column::ProcessingStatus)
            .col(staged_item::Column::ValidationStatus)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_staged_items_batch")
            .table(StagedItem)
            .col(staged_item::Column::ImportBatchId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_staged_prices_batch")
            .table(StagedPrice)
            .col(staged_price::Column::ImportBatchId)
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates all tables and indexes. Safe to run against an existing database.
///
/// # Errors
/// Returns an error if any DDL statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Perfume).await?;
    create_table(db, &schema, Seller).await?;
    create_table(db, &schema, Price).await?;
    create_table(db, &schema, PriceHistory).await?;
    create_table(db, &schema, StagedItem).await?;
    create_table(db, &schema, StagedPrice).await?;

    for index in index_statements() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}
