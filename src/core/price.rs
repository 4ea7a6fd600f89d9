//! Price business logic - seller listings and their history.
//!
//! A listing is keyed by (perfume, seller, size, item type). Reconciling a
//! sheet updates listings in place, so ingesting the same sheet twice never
//! creates duplicates. Listings that vanish from a seller's sheet are marked
//! out of stock rather than deleted.

use crate::{
    entities::{Price, PriceHistory, price, price_history},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Stock token for a listing that can be bought now
pub const IN_STOCK: &str = "in_stock";
/// Stock token for a delisted or sold-out listing
pub const OUT_OF_STOCK: &str = "out_of_stock";
/// Item type assumed when a source does not say
pub const DEFAULT_ITEM_TYPE: &str = "full_bottle";

/// Normalizes free-text stock statuses and item types into snake_case tokens:
/// `"In Stock"` becomes `"in_stock"`, `"Full-Bottle"` becomes `"full_bottle"`.
#[must_use]
pub fn normalize_token(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// De-duplication key of a production listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    /// Perfume on offer
    pub perfume_id: i64,
    /// Seller making the offer
    pub seller_id: i64,
    /// Size in millilitres
    pub size_ml: i32,
    /// Normalized item type
    pub item_type: String,
}

/// The mutable side of a listing as reported by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingOffer {
    /// Asking price
    pub amount: Decimal,
    /// Currency code
    pub currency: String,
    /// Normalized stock token
    pub stock_status: String,
    /// Listing URL
    pub product_url: Option<String>,
    /// Promotion text, only written when the listing is created
    pub offer_details: Option<String>,
}

/// Looks up the listing for `key`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_listing<C>(db: &C, key: &ListingKey) -> Result<Option<price::Model>>
where
    C: ConnectionTrait,
{
    Price::find()
        .filter(price::Column::PerfumeId.eq(key.perfume_id))
        .filter(price::Column::SellerId.eq(key.seller_id))
        .filter(price::Column::SizeMl.eq(key.size_ml))
        .filter(price::Column::ItemType.eq(key.item_type.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every listing of a perfume, cheapest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_prices_for_perfume<C>(db: &C, perfume_id: i64) -> Result<Vec<price::Model>>
where
    C: ConnectionTrait,
{
    Price::find()
        .filter(price::Column::PerfumeId.eq(perfume_id))
        .order_by_asc(price::Column::Amount)
        .order_by_asc(price::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Appends a history snapshot for a listing.
///
/// # Errors
/// Returns an error if the database insert fails.
pub async fn record_history<C>(
    db: &C,
    price_id: i64,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<price_history::Model>
where
    C: ConnectionTrait,
{
    let entry = price_history::ActiveModel {
        price_id: Set(price_id),
        recorded_on: Set(now.date_naive()),
        amount: Set(amount),
        created_at: Set(now),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// History of a listing, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_history<C>(db: &C, price_id: i64) -> Result<Vec<price_history::Model>>
where
    C: ConnectionTrait,
{
    PriceHistory::find()
        .filter(price_history::Column::PriceId.eq(price_id))
        .order_by_asc(price_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates the listing for `key` with `offer`, or creates it. A history entry
/// is written on creation and whenever the amount changes. Returns the row
/// and whether it was created.
///
/// # Errors
/// Returns an error if:
/// - The amount is negative or the currency is empty
/// - Any database operation fails
pub async fn upsert_listing<C>(
    db: &C,
    key: &ListingKey,
    offer: &ListingOffer,
    now: DateTime<Utc>,
) -> Result<(price::Model, bool)>
where
    C: ConnectionTrait,
{
    if offer.amount.is_sign_negative() {
        return Err(Error::Validation {
            message: format!("Price amount cannot be negative: {}", offer.amount),
        });
    }
    if offer.currency.trim().is_empty() {
        return Err(Error::Validation {
            message: "Currency cannot be empty".to_string(),
        });
    }

    if let Some(existing) = find_listing(db, key).await? {
        let amount_changed = existing.amount != offer.amount;
        let mut listing: price::ActiveModel = existing.into();
        listing.amount = Set(offer.amount);
        listing.currency = Set(offer.currency.clone());
        listing.stock_status = Set(offer.stock_status.clone());
        listing.product_url = Set(offer.product_url.clone());
        listing.last_updated = Set(now);
        let updated = listing.update(db).await?;

        if amount_changed {
            record_history(db, updated.id, updated.amount, now).await?;
        }
        return Ok((updated, false));
    }

    let listing = price::ActiveModel {
        perfume_id: Set(key.perfume_id),
        seller_id: Set(key.seller_id),
        amount: Set(offer.amount),
        currency: Set(offer.currency.clone()),
        stock_status: Set(offer.stock_status.clone()),
        product_url: Set(offer.product_url.clone()),
        size_ml: Set(key.size_ml),
        item_type: Set(key.item_type.clone()),
        offer_details: Set(offer.offer_details.clone()),
        last_updated: Set(now),
        created_at: Set(now),
        ..Default::default()
    };
    let created = listing.insert(db).await?;
    record_history(db, created.id, created.amount, now).await?;
    Ok((created, true))
}

/// Marks every listing of (`seller_id`, `perfume_id`) whose id is not in
/// `reaffirmed` as out of stock. Returns how many rows changed.
///
/// # Errors
/// Returns an error if the database update fails.
pub async fn deactivate_unlisted<C>(
    db: &C,
    seller_id: i64,
    perfume_id: i64,
    reaffirmed: &[i64],
    now: DateTime<Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Price::update_many()
        .col_expr(price::Column::StockStatus, Expr::value(OUT_OF_STOCK))
        .col_expr(price::Column::LastUpdated, Expr::value(now))
        .filter(price::Column::SellerId.eq(seller_id))
        .filter(price::Column::PerfumeId.eq(perfume_id))
        .filter(price::Column::Id.is_not_in(reaffirmed.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn offer(amount: Decimal) -> ListingOffer {
        ListingOffer {
            amount,
            currency: "INR".to_string(),
            stock_status: IN_STOCK.to_string(),
            product_url: None,
            offer_details: None,
        }
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("In Stock"), "in_stock");
        assert_eq!(normalize_token("  Full-Bottle "), "full_bottle");
        assert_eq!(normalize_token("PRE_ORDER"), "pre_order");
        assert_eq!(normalize_token("decant"), "decant");
    }

    #[tokio::test]
    async fn test_upsert_listing_updates_in_place() -> Result<()> {
        let (db, seller, perfume) = setup_with_catalog().await?;
        let key = ListingKey {
            perfume_id: perfume.id,
            seller_id: seller.id,
            size_ml: 100,
            item_type: DEFAULT_ITEM_TYPE.to_string(),
        };

        let (first, created) = upsert_listing(&db, &key, &offer(Decimal::new(7500, 0)), Utc::now()).await?;
        assert!(created);

        let (second, created) = upsert_listing(&db, &key, &offer(Decimal::new(6999, 0)), Utc::now()).await?;
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.amount, Decimal::new(6999, 0));

        // Same amount again: no new history entry
        upsert_listing(&db, &key, &offer(Decimal::new(6999, 0)), Utc::now()).await?;

        let history = get_history(&db, first.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, Decimal::new(7500, 0));
        assert_eq!(history[1].amount, Decimal::new(6999, 0));
        assert_eq!(get_prices_for_perfume(&db, perfume.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_listing_rejects_bad_offer() -> Result<()> {
        let (db, seller, perfume) = setup_with_catalog().await?;
        let key = ListingKey {
            perfume_id: perfume.id,
            seller_id: seller.id,
            size_ml: 50,
            item_type: DEFAULT_ITEM_TYPE.to_string(),
        };

        let result = upsert_listing(&db, &key, &offer(Decimal::new(-1, 0)), Utc::now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut blank_currency = offer(Decimal::new(10, 0));
        blank_currency.currency = " ".to_string();
        let result = upsert_listing(&db, &key, &blank_currency, Utc::now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_unlisted_spares_reaffirmed() -> Result<()> {
        let (db, seller, perfume) = setup_with_catalog().await?;
        let mut ids = Vec::new();
        for size in [30, 50, 100] {
            let key = ListingKey {
                perfume_id: perfume.id,
                seller_id: seller.id,
                size_ml: size,
                item_type: DEFAULT_ITEM_TYPE.to_string(),
            };
            let (listing, _) = upsert_listing(&db, &key, &offer(Decimal::new(100, 0)), Utc::now()).await?;
            ids.push(listing.id);
        }

        let changed = deactivate_unlisted(&db, seller.id, perfume.id, &ids[..1], Utc::now()).await?;
        assert_eq!(changed, 2);

        let prices = get_prices_for_perfume(&db, perfume.id).await?;
        for listing in prices {
            let expected = if listing.id == ids[0] { IN_STOCK } else { OUT_OF_STOCK };
            assert_eq!(listing.stock_status, expected);
        }
        Ok(())
    }
}
