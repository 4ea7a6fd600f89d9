//! Diagnostics side-channel for the staging writer and the reconciler.
//!
//! Both components report skipped records, isolated failures and run
//! summaries through an [`IngestionObserver`] passed in by the caller instead
//! of logging to ambient global state. [`TracingObserver`] forwards every
//! event to `tracing` and is what the binary uses.

use crate::core::reconcile::ProcessingSummary;
use crate::errors::Error;
use std::fmt;
use tracing::{error, info, warn};

/// Something noteworthy that happened while staging or reconciling.
#[derive(Debug)]
pub enum IngestionEvent<'a> {
    /// A parsed packet was not staged
    PacketSkipped {
        /// Batch being staged
        batch_id: &'a str,
        /// Seller the sheet belongs to
        seller_code: &'a str,
        /// Why the packet was dropped
        reason: &'a str,
    },
    /// A price entry of a staged packet was not staged
    PriceEntrySkipped {
        /// Batch being staged
        batch_id: &'a str,
        /// Seller the sheet belongs to
        seller_code: &'a str,
        /// Perfume the entry belonged to, for context
        perfume_name: &'a str,
        /// Why the entry was dropped
        reason: &'a str,
    },
    /// The staging transaction was rolled back
    StagingFailed {
        /// Batch being staged
        batch_id: &'a str,
        /// Seller the sheet belongs to
        seller_code: &'a str,
        /// Underlying failure
        error: &'a Error,
    },
    /// A staged item ended in the `failed` state
    ItemFailed {
        /// Staged item id
        staged_item_id: i64,
        /// Stored failure reason
        reason: &'a str,
    },
    /// A staged price was rejected while its parent item succeeded
    PriceEntryFailed {
        /// Staged price id
        staged_price_id: i64,
        /// Parent staged item id
        staged_item_id: i64,
        /// Stored failure reason
        reason: &'a str,
    },
    /// Listings absent from the latest sheet were marked out of stock
    PricesDeactivated {
        /// Seller whose listings were retired
        seller_id: i64,
        /// Perfume the listings belong to
        perfume_id: i64,
        /// Number of listings flipped to out of stock
        count: u64,
    },
    /// Deactivating stale listings failed for one (seller, perfume) pair
    DeactivationFailed {
        /// Seller whose listings were being retired
        seller_id: i64,
        /// Perfume the listings belong to
        perfume_id: i64,
        /// Underlying failure
        error: &'a Error,
    },
    /// A reconciliation run finished
    RunCompleted {
        /// Aggregate counters of the run
        summary: &'a ProcessingSummary,
    },
}

impl IngestionEvent<'_> {
    /// Whether the event describes data that did not make it through.
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        !matches!(
            self,
            Self::PricesDeactivated { .. } | Self::RunCompleted { .. }
        )
    }
}

impl fmt::Display for IngestionEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PacketSkipped {
                batch_id,
                seller_code,
                reason,
            } => write!(
                f,
                "Skipping item ({reason}) [batch {batch_id}, seller {seller_code}]"
            ),
            Self::PriceEntrySkipped {
                batch_id,
                seller_code,
                perfume_name,
                reason,
            } => write!(
                f,
                "Skipping price entry for '{perfume_name}' ({reason}) [batch {batch_id}, seller {seller_code}]"
            ),
            Self::StagingFailed {
                batch_id,
                seller_code,
                error,
            } => write!(
                f,
                "Failed to stage data: {error} [batch {batch_id}, seller {seller_code}]"
            ),
            Self::ItemFailed {
                staged_item_id,
                reason,
            } => write!(f, "Staged item {staged_item_id} failed: {reason}"),
            Self::PriceEntryFailed {
                staged_price_id,
                staged_item_id,
                reason,
            } => write!(
                f,
                "Staged price {staged_price_id} (item {staged_item_id}) failed: {reason}"
            ),
            Self::PricesDeactivated {
                seller_id,
                perfume_id,
                count,
            } => write!(
                f,
                "Marked {count} unlisted price(s) out of stock for perfume {perfume_id}, seller {seller_id}"
            ),
            Self::DeactivationFailed {
                seller_id,
                perfume_id,
                error,
            } => write!(
                f,
                "Failed to deactivate stale prices for perfume {perfume_id}, seller {seller_id}: {error}"
            ),
            Self::RunCompleted { summary } => f.write_str(&summary.message),
        }
    }
}

/// Receiver of [`IngestionEvent`]s.
pub trait IngestionObserver {
    /// Called once per event, synchronously, in the order events happen.
    fn notify(&self, event: &IngestionEvent<'_>);
}

/// Observer that writes every event to `tracing` under the `ingestion` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn notify(&self, event: &IngestionEvent<'_>) {
        match event {
            IngestionEvent::PacketSkipped { .. }
            | IngestionEvent::PriceEntrySkipped { .. }
            | IngestionEvent::PriceEntryFailed { .. } => {
                warn!(target: "ingestion", "{event}");
            }
            IngestionEvent::StagingFailed { .. }
            | IngestionEvent::ItemFailed { .. }
            | IngestionEvent::DeactivationFailed { .. } => {
                error!(target: "ingestion", "{event}");
            }
            IngestionEvent::PricesDeactivated { .. } | IngestionEvent::RunCompleted { .. } => {
                info!(target: "ingestion", "{event}");
            }
        }
    }
}
