//! Staging reconciler - merges staged records into the production catalog.
//!
//! Items are processed one at a time, oldest first, each in its own
//! transaction. A failing item is rolled back and marked `failed` without
//! stopping the run. Once every item is done, listings a seller no longer
//! offers are marked out of stock for each (seller, perfume) pair the run
//! touched.

use crate::{
    core::{
        notes::Notes,
        observer::{IngestionEvent, IngestionObserver},
        perfume::{PerfumeAttributes, upsert_perfume},
        price::{
            DEFAULT_ITEM_TYPE, IN_STOCK, ListingKey, ListingOffer, deactivate_unlisted,
            normalize_token, upsert_listing,
        },
        seller::get_seller_by_code,
    },
    entities::{
        ProcessingStatus, StagedItem, StagedPrice, ValidationStatus, staged_item, staged_price,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    DatabaseTransaction, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Aggregate result of one [`process_staged_data`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    /// Human-readable one-line summary
    pub message: String,
    /// Items merged into production
    pub processed_count: u64,
    /// Perfumes created by this run
    pub perfumes_created: u64,
    /// Existing perfumes matched and merged
    pub perfumes_updated: u64,
    /// Listings created
    pub prices_created: u64,
    /// Existing listings updated in place
    pub prices_updated: u64,
    /// Listings marked out of stock because the seller no longer lists them
    pub prices_deactivated: u64,
    /// Items that ended in the `failed` state
    pub failed_count: u64,
}

impl ProcessingSummary {
    fn describe(&self) -> String {
        format!(
            "Processed {} staged item(s): {} perfume(s) created, {} updated; \
             {} price(s) created, {} updated, {} deactivated; {} failed.",
            self.processed_count,
            self.perfumes_created,
            self.perfumes_updated,
            self.prices_created,
            self.prices_updated,
            self.prices_deactivated,
            self.failed_count
        )
    }
}

/// What a successfully reconciled item contributed.
#[derive(Debug, Default)]
struct ItemStats {
    seller_id: i64,
    perfume_id: i64,
    perfume_created: bool,
    prices_created: u64,
    prices_updated: u64,
    reaffirmed: Vec<i64>,
    rejected_prices: Vec<(i64, String)>,
}

#[derive(Debug)]
enum ItemOutcome {
    Processed(ItemStats),
    Rejected(String),
}

/// Marks a staged item and its staged prices as failed with `reason`.
async fn mark_failed<C>(db: &C, staged_item_id: i64, reason: &str, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let details = json!({ "error": reason });

    StagedItem::update_many()
        .col_expr(staged_item::Column::ValidationStatus, Expr::value(ValidationStatus::Failed))
        .col_expr(staged_item::Column::ProcessingStatus, Expr::value(ProcessingStatus::Failed))
        .col_expr(staged_item::Column::ErrorDetails, Expr::value(details.clone()))
        .col_expr(staged_item::Column::ProcessedAt, Expr::value(now))
        .filter(staged_item::Column::Id.eq(staged_item_id))
        .exec(db)
        .await?;

    StagedPrice::update_many()
        .col_expr(staged_price::Column::ValidationStatus, Expr::value(ValidationStatus::Failed))
        .col_expr(staged_price::Column::ProcessingStatus, Expr::value(ProcessingStatus::Failed))
        .col_expr(staged_price::Column::ErrorDetails, Expr::value(details))
        .col_expr(staged_price::Column::ProcessedAt, Expr::value(now))
        .filter(staged_price::Column::StagedItemId.eq(staged_item_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn fail_price(
    txn: &DatabaseTransaction,
    staged: &staged_price::Model,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut price: staged_price::ActiveModel = staged.clone().into();
    price.validation_status = Set(ValidationStatus::Failed);
    price.processing_status = Set(ProcessingStatus::Failed);
    price.error_details = Set(Some(json!({ "error": reason })));
    price.processed_at = Set(Some(now));
    price.update(txn).await?;
    Ok(())
}

fn attributes_of(item: &staged_item::Model) -> Result<PerfumeAttributes> {
    let notes = item
        .notes
        .clone()
        .map(serde_json::from_value::<Notes>)
        .transpose()?
        .filter(|notes| !notes.is_empty());

    Ok(PerfumeAttributes {
        description: item.description.clone(),
        notes,
        image_url: item.image_url.clone(),
        concentration: item.concentration.clone(),
        gender_affinity: item.gender.clone(),
        launch_year: item.launch_year,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reconciles one staged item. Nothing is committed here; the caller owns
/// the transaction.
async fn reconcile_item(
    txn: &DatabaseTransaction,
    item: &staged_item::Model,
    children: &[staged_price::Model],
    now: DateTime<Utc>,
) -> Result<ItemOutcome> {
    let Some(code) = non_blank(item.seller_code.as_deref()) else {
        return Ok(ItemOutcome::Rejected("Seller code is missing.".to_string()));
    };
    let Some(seller) = get_seller_by_code(txn, code).await? else {
        let missing = Error::SellerNotFound {
            code: code.to_string(),
        };
        return Ok(ItemOutcome::Rejected(missing.to_string()));
    };

    let (Some(name), Some(brand)) = (
        non_blank(item.perfume_name.as_deref()),
        non_blank(item.brand_name.as_deref()),
    ) else {
        return Ok(ItemOutcome::Rejected(
            "Missing perfume name or brand.".to_string(),
        ));
    };

    let (perfume, perfume_created) = upsert_perfume(txn, name, brand, &attributes_of(item)?).await?;
    let mut stats = ItemStats {
        seller_id: seller.id,
        perfume_id: perfume.id,
        perfume_created,
        ..ItemStats::default()
    };

    for staged in children {
        let (Some(amount), Some(currency), Some(size_ml)) = (
            staged.price,
            non_blank(staged.currency.as_deref()),
            staged.size_ml,
        ) else {
            let reason = "Missing price, currency or size.".to_string();
            fail_price(txn, staged, &reason, now).await?;
            stats.rejected_prices.push((staged.id, reason));
            continue;
        };

        let key = ListingKey {
            perfume_id: perfume.id,
            seller_id: seller.id,
            size_ml,
            item_type: non_blank(staged.item_type.as_deref())
                .map_or_else(|| DEFAULT_ITEM_TYPE.to_string(), normalize_token),
        };
        let offer = ListingOffer {
            amount,
            currency: currency.to_uppercase(),
            stock_status: non_blank(staged.availability.as_deref())
                .map_or_else(|| IN_STOCK.to_string(), normalize_token),
            product_url: staged.product_url.clone().or_else(|| item.product_url.clone()),
            offer_details: staged.offer_details.clone(),
        };

        let (listing, created) = match upsert_listing(txn, &key, &offer, now).await {
            Ok(result) => result,
            Err(Error::Validation { message }) => {
                fail_price(txn, staged, &message, now).await?;
                stats.rejected_prices.push((staged.id, message));
                continue;
            }
            Err(other) => return Err(other),
        };

        if created {
            stats.prices_created += 1;
        } else {
            stats.prices_updated += 1;
        }
        stats.reaffirmed.push(listing.id);

        let mut matched: staged_price::ActiveModel = staged.clone().into();
        matched.validation_status = Set(ValidationStatus::Success);
        matched.processing_status = Set(ProcessingStatus::Processed);
        matched.matched_production_perfume_id = Set(Some(perfume.id));
        matched.matched_production_price_id = Set(Some(listing.id));
        matched.processed_at = Set(Some(now));
        matched.update(txn).await?;
    }

    let mut processed: staged_item::ActiveModel = item.clone().into();
    processed.validation_status = Set(ValidationStatus::Success);
    processed.processing_status = Set(ProcessingStatus::Processed);
    processed.matched_production_id = Set(Some(perfume.id));
    processed.processed_at = Set(Some(now));
    processed.update(txn).await?;

    Ok(ItemOutcome::Processed(stats))
}

/// Runs one item inside its own transaction. Rejections are committed as
/// failures; errors roll the transaction back and are returned.
async fn process_item(
    db: &DatabaseConnection,
    item: &staged_item::Model,
    now: DateTime<Utc>,
) -> Result<ItemOutcome> {
    let children = StagedPrice::find()
        .filter(staged_price::Column::StagedItemId.eq(item.id))
        .order_by_asc(staged_price::Column::Id)
        .all(db)
        .await?;

    let txn = db.begin().await?;
    match reconcile_item(&txn, item, &children, now).await {
        Ok(outcome) => {
            if let ItemOutcome::Rejected(reason) = &outcome {
                mark_failed(&txn, item.id, reason, now).await?;
            }
            txn.commit().await?;
            Ok(outcome)
        }
        Err(error) => {
            if let Err(rollback_error) = txn.rollback().await {
                warn!(staged_item_id = item.id, error = %rollback_error, "Rollback failed");
            }
            Err(error)
        }
    }
}

async fn deactivate_pair(
    db: &DatabaseConnection,
    seller_id: i64,
    perfume_id: i64,
    reaffirmed: &[i64],
    now: DateTime<Utc>,
) -> Result<u64> {
    let txn = db.begin().await?;
    let count = deactivate_unlisted(&txn, seller_id, perfume_id, reaffirmed, now).await?;
    txn.commit().await?;
    Ok(count)
}

/// Reconciles up to `limit` new staged items, optionally restricted to one
/// batch, then retires listings that were not reaffirmed.
///
/// When the same listing appears more than once in a run, the staged record
/// with the highest id wins.
///
/// # Errors
/// Returns an error if `limit` is zero or the candidate items cannot be
/// loaded. Failures of individual items are recorded on the items and counted
/// in the summary instead.
pub async fn process_staged_data(
    db: &DatabaseConnection,
    batch_id: Option<&str>,
    limit: u64,
    observer: &dyn IngestionObserver,
) -> Result<ProcessingSummary> {
    if limit == 0 {
        return Err(Error::Validation {
            message: "Processing limit must be a positive number".to_string(),
        });
    }

    let mut query = StagedItem::find()
        .filter(staged_item::Column::ProcessingStatus.eq(ProcessingStatus::New))
        .filter(staged_item::Column::ValidationStatus.eq(ValidationStatus::Pending));
    if let Some(batch) = batch_id {
        query = query.filter(staged_item::Column::ImportBatchId.eq(batch));
    }
    let items = query
        .order_by_asc(staged_item::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let mut summary = ProcessingSummary::default();
    if items.is_empty() {
        summary.message = "No new staged items to process.".to_string();
        observer.notify(&IngestionEvent::RunCompleted { summary: &summary });
        return Ok(summary);
    }
    info!(count = items.len(), batch_id, "Processing staged items");

    let now = Utc::now();
    let mut touched: BTreeMap<(i64, i64), Vec<i64>> = BTreeMap::new();

    for item in &items {
        match process_item(db, item, now).await {
            Ok(ItemOutcome::Processed(stats)) => {
                debug!(staged_item_id = item.id, perfume_id = stats.perfume_id, "Item processed");
                summary.processed_count += 1;
                if stats.perfume_created {
                    summary.perfumes_created += 1;
                } else {
                    summary.perfumes_updated += 1;
                }
                summary.prices_created += stats.prices_created;
                summary.prices_updated += stats.prices_updated;
                for (staged_price_id, reason) in &stats.rejected_prices {
                    observer.notify(&IngestionEvent::PriceEntryFailed {
                        staged_price_id: *staged_price_id,
                        staged_item_id: item.id,
                        reason,
                    });
                }
                touched
                    .entry((stats.seller_id, stats.perfume_id))
                    .or_default()
                    .extend(stats.reaffirmed);
            }
            Ok(ItemOutcome::Rejected(reason)) => {
                summary.failed_count += 1;
                observer.notify(&IngestionEvent::ItemFailed {
                    staged_item_id: item.id,
                    reason: &reason,
                });
            }
            Err(failure) => {
                let reason = failure.to_string();
                if let Err(mark_error) = mark_failed(db, item.id, &reason, now).await {
                    error!(staged_item_id = item.id, error = %mark_error, "Could not record item failure");
                }
                summary.failed_count += 1;
                observer.notify(&IngestionEvent::ItemFailed {
                    staged_item_id: item.id,
                    reason: &reason,
                });
            }
        }
    }

    for ((seller_id, perfume_id), reaffirmed) in &touched {
        match deactivate_pair(db, *seller_id, *perfume_id, reaffirmed, now).await {
            Ok(0) => {}
            Ok(count) => {
                summary.prices_deactivated += count;
                observer.notify(&IngestionEvent::PricesDeactivated {
                    seller_id: *seller_id,
                    perfume_id: *perfume_id,
                    count,
                });
            }
            Err(failure) => observer.notify(&IngestionEvent::DeactivationFailed {
                seller_id: *seller_id,
                perfume_id: *perfume_id,
                error: &failure,
            }),
        }
    }

    summary.message = summary.describe();
    observer.notify(&IngestionEvent::RunCompleted { summary: &summary });
    Ok(summary)
}
