//! Seller business logic.
//!
//! Sellers are created out-of-band, either one at a time or by seeding from
//! config.toml. The ingestion pipeline only ever looks them up by code.

use crate::{
    config::SellerConfig,
    entities::{Seller, seller},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Finds a seller by its stable code.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_seller_by_code<C>(db: &C, code: &str) -> Result<Option<seller::Model>>
where
    C: ConnectionTrait,
{
    Seller::find()
        .filter(seller::Column::Code.eq(code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every registered seller ordered by code.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_sellers(db: &DatabaseConnection) -> Result<Vec<seller::Model>> {
    Seller::find()
        .order_by_asc(seller::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a new seller.
///
/// # Errors
/// Returns an error if:
/// - The code or name is empty or whitespace-only
/// - A seller with the same code already exists
/// - The database insert fails
pub async fn create_seller<C>(db: &C, config: &SellerConfig) -> Result<seller::Model>
where
    C: ConnectionTrait,
{
    let code = config.code.trim();
    if code.is_empty() {
        return Err(Error::Validation {
            message: "Seller code cannot be empty".to_string(),
        });
    }
    if config.name.trim().is_empty() {
        return Err(Error::Validation {
            message: format!("Seller '{code}' must have a name"),
        });
    }
    if get_seller_by_code(db, code).await?.is_some() {
        return Err(Error::Validation {
            message: format!("Seller with code '{code}' already exists"),
        });
    }

    let now = chrono::Utc::now();
    let seller = seller::ActiveModel {
        code: Set(code.to_string()),
        name: Set(config.name.trim().to_string()),
        logo_url: Set(config.logo_url.clone()),
        website_url: Set(config.website_url.clone()),
        rating: Set(config.rating),
        contact_info: Set(config.contact_info.clone()),
        seller_type: Set(config.seller_type.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    seller.insert(db).await.map_err(Into::into)
}

/// Outcome of [`seed_sellers`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedResult {
    /// Sellers that did not exist yet
    pub created: usize,
    /// Existing sellers whose attributes were refreshed
    pub updated: usize,
}

/// Registers every configured seller, refreshing the attributes of codes
/// that already exist. Runs in a single transaction.
///
/// # Errors
/// Returns an error if any configured seller is invalid or a database
/// operation fails; nothing is written in that case.
pub async fn seed_sellers(db: &DatabaseConnection, sellers: &[SellerConfig]) -> Result<SeedResult> {
    info!(
        "Starting to seed sellers. Found {} configurations from TOML.",
        sellers.len()
    );
    let txn = db.begin().await?;
    let mut result = SeedResult::default();

    for config in sellers {
        if let Some(existing) = get_seller_by_code(&txn, &config.code).await? {
            debug!(code = %existing.code, "Seller exists; refreshing attributes");
            let mut active: seller::ActiveModel = existing.into();
            active.name = Set(config.name.trim().to_string());
            active.logo_url = Set(config.logo_url.clone());
            active.website_url = Set(config.website_url.clone());
            active.rating = Set(config.rating);
            active.contact_info = Set(config.contact_info.clone());
            active.seller_type = Set(config.seller_type.clone());
            active.updated_at = Set(chrono::Utc::now());
            active.update(&txn).await?;
            result.updated += 1;
        } else {
            create_seller(&txn, config).await?;
            result.created += 1;
        }
    }

    txn.commit().await?;
    info!(
        created = result.created,
        updated = result.updated,
        "Sellers seeded"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_find_seller() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_seller(&db, "nykaa_man").await?;

        let found = get_seller_by_code(&db, "nykaa_man").await?.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Seller nykaa_man");

        assert!(get_seller_by_code(&db, "unknown").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_seller_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_seller(&db, &seller_config("  ", "Nameless")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_seller(&db, &seller_config("code", "   ")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        create_seller(&db, &seller_config("dup", "First")).await?;
        let result = create_seller(&db, &seller_config("dup", "Second")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_sellers_inserts_then_refreshes() -> Result<()> {
        let db = setup_test_db().await?;
        let mut configs = vec![
            seller_config("nykaa_man", "Nykaa Man"),
            seller_config("tata_cliq", "Tata CLiQ Luxury"),
        ];

        let first = seed_sellers(&db, &configs).await?;
        assert_eq!(first, SeedResult { created: 2, updated: 0 });

        configs[0].rating = Some(4.6);
        let second = seed_sellers(&db, &configs).await?;
        assert_eq!(second, SeedResult { created: 0, updated: 2 });

        let all = get_all_sellers(&db).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code, "nykaa_man");
        assert_eq!(all[0].rating, Some(4.6));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_sellers_is_atomic() -> Result<()> {
        let db = setup_test_db().await?;
        let configs = vec![seller_config("good", "Good"), seller_config("", "Broken")];

        assert!(seed_sellers(&db, &configs).await.is_err());
        assert!(get_all_sellers(&db).await?.is_empty());
        Ok(())
    }
}
