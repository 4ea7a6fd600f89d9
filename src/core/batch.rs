//! Batch operations - inspecting and requeueing one ingestion run.

use crate::{
    entities::{
        ProcessingStatus, StagedItem, StagedPrice, ValidationStatus, staged_item, staged_price,
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{PaginatorTrait, QuerySelect, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::info;

/// Staged record counts of one batch, by processing status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    /// The batch these counts belong to
    pub batch_id: String,
    /// Items waiting for the reconciler
    pub items_new: u64,
    /// Items merged into production
    pub items_processed: u64,
    /// Items that failed
    pub items_failed: u64,
    /// Prices waiting for the reconciler
    pub prices_new: u64,
    /// Prices merged into production
    pub prices_processed: u64,
    /// Prices that failed
    pub prices_failed: u64,
}

impl BatchStatus {
    /// Total staged items in the batch.
    #[must_use]
    pub const fn total_items(&self) -> u64 {
        self.items_new + self.items_processed + self.items_failed
    }
}

async fn count_items(db: &DatabaseConnection, batch_id: &str, status: ProcessingStatus) -> Result<u64> {
    StagedItem::find()
        .filter(staged_item::Column::ImportBatchId.eq(batch_id))
        .filter(staged_item::Column::ProcessingStatus.eq(status))
        .count(db)
        .await
        .map_err(Into::into)
}

async fn count_prices(db: &DatabaseConnection, batch_id: &str, status: ProcessingStatus) -> Result<u64> {
    StagedPrice::find()
        .filter(staged_price::Column::ImportBatchId.eq(batch_id))
        .filter(staged_price::Column::ProcessingStatus.eq(status))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Counts the staged records of `batch_id` per processing status.
///
/// # Errors
/// Returns an error if a count query fails.
pub async fn batch_status(db: &DatabaseConnection, batch_id: &str) -> Result<BatchStatus> {
    Ok(BatchStatus {
        batch_id: batch_id.to_string(),
        items_new: count_items(db, batch_id, ProcessingStatus::New).await?,
        items_processed: count_items(db, batch_id, ProcessingStatus::Processed).await?,
        items_failed: count_items(db, batch_id, ProcessingStatus::Failed).await?,
        prices_new: count_prices(db, batch_id, ProcessingStatus::New).await?,
        prices_processed: count_prices(db, batch_id, ProcessingStatus::Processed).await?,
        prices_failed: count_prices(db, batch_id, ProcessingStatus::Failed).await?,
    })
}

/// Makes the failed items of `batch_id`, and their failed prices, eligible
/// for reconciliation again. Returns the number of items requeued.
///
/// # Errors
/// Returns an error if a database operation fails; nothing changes then.
pub async fn requeue_failed(db: &DatabaseConnection, batch_id: &str) -> Result<u64> {
    let txn = db.begin().await?;

    let failed_ids: Vec<i64> = StagedItem::find()
        .select_only()
        .column(staged_item::Column::Id)
        .filter(staged_item::Column::ImportBatchId.eq(batch_id))
        .filter(staged_item::Column::ProcessingStatus.eq(ProcessingStatus::Failed))
        .into_tuple()
        .all(&txn)
        .await?;

    if failed_ids.is_empty() {
        txn.commit().await?;
        return Ok(0);
    }

    let cleared_details: Option<Json> = None;
    let cleared_at: Option<DateTime<Utc>> = None;

    let items = StagedItem::update_many()
        .col_expr(staged_item::Column::ValidationStatus, Expr::value(ValidationStatus::Pending))
        .col_expr(staged_item::Column::ProcessingStatus, Expr::value(ProcessingStatus::New))
        .col_expr(staged_item::Column::ErrorDetails, Expr::value(cleared_details.clone()))
        .col_expr(staged_item::Column::ProcessedAt, Expr::value(cleared_at))
        .filter(staged_item::Column::Id.is_in(failed_ids.iter().copied()))
        .exec(&txn)
        .await?;

    StagedPrice::update_many()
        .col_expr(staged_price::Column::ValidationStatus, Expr::value(ValidationStatus::Pending))
        .col_expr(staged_price::Column::ProcessingStatus, Expr::value(ProcessingStatus::New))
        .col_expr(staged_price::Column::ErrorDetails, Expr::value(cleared_details))
        .col_expr(staged_price::Column::ProcessedAt, Expr::value(cleared_at))
        .filter(staged_price::Column::StagedItemId.is_in(failed_ids.iter().copied()))
        .filter(staged_price::Column::ProcessingStatus.eq(ProcessingStatus::Failed))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(batch_id, items = items.rows_affected, "Requeued failed staged items");
    Ok(items.rows_affected)
}
