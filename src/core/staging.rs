//! Staging writer - persists parsed packets into the staging tables.
//!
//! A call stages one parsed sheet under one batch id. Everything is written in
//! a single transaction: either every acceptable record lands, or nothing does.
//! Packets and price entries that cannot be reconciled later are dropped here
//! and reported to the observer.

use crate::{
    core::notes::Notes,
    core::observer::{IngestionEvent, IngestionObserver},
    entities::{ProcessingStatus, ValidationStatus, staged_item, staged_price},
    errors::{Error, Result},
    parsers::{ParsedPerfume, ParsedPrice},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, warn};

/// Number of records written by [`stage_parsed_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StagingCounts {
    /// Staged item rows
    pub items_staged: usize,
    /// Staged price rows
    pub prices_staged: usize,
}

struct StagingContext<'a> {
    source_identifier: &'a str,
    batch_id: &'a str,
    seller_code: &'a str,
    imported_at: DateTime<Utc>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn price_is_complete(entry: &ParsedPrice) -> bool {
    entry.price.is_some() && present(entry.currency.as_ref()).is_some() && entry.size_ml.is_some()
}

/// Writes `packets` to the staging tables under `batch_id`.
///
/// Packets without a perfume name or brand, and price entries without a
/// price, currency or size, are skipped with an observer warning. Callers can
/// compare the returned counts with what the parser produced.
///
/// # Errors
/// Returns an error if serialization or any database write fails. The
/// transaction is rolled back and nothing from this call is kept.
pub async fn stage_parsed_data(
    db: &DatabaseConnection,
    packets: &[ParsedPerfume],
    source_identifier: &str,
    batch_id: &str,
    seller_code: &str,
    observer: &dyn IngestionObserver,
) -> Result<StagingCounts> {
    info!(
        batch_id,
        seller_code,
        source_identifier,
        packets = packets.len(),
        "Staging parsed data"
    );
    let context = StagingContext {
        source_identifier,
        batch_id,
        seller_code,
        imported_at: Utc::now(),
    };

    let txn = db.begin().await?;
    let outcome = match stage_packets(&txn, &context, packets, observer).await {
        Ok(counts) => txn.commit().await.map(|()| counts).map_err(Error::from),
        Err(error) => {
            if let Err(rollback_error) = txn.rollback().await {
                warn!(batch_id, error = %rollback_error, "Rollback of staging transaction failed");
            }
            Err(error)
        }
    };

    match &outcome {
        Ok(counts) => info!(
            batch_id,
            items = counts.items_staged,
            prices = counts.prices_staged,
            "Staging committed"
        ),
        Err(error) => observer.notify(&IngestionEvent::StagingFailed {
            batch_id,
            seller_code,
            error,
        }),
    }
    outcome
}

async fn stage_packets(
    txn: &DatabaseTransaction,
    context: &StagingContext<'_>,
    packets: &[ParsedPerfume],
    observer: &dyn IngestionObserver,
) -> Result<StagingCounts> {
    let mut counts = StagingCounts::default();

    for packet in packets {
        let (Some(name), Some(brand)) = (
            present(packet.perfume_name.as_ref()),
            present(packet.brand.as_ref()),
        ) else {
            observer.notify(&IngestionEvent::PacketSkipped {
                batch_id: context.batch_id,
                seller_code: context.seller_code,
                reason: "missing perfume name or brand",
            });
            continue;
        };

        let entries: Vec<&ParsedPrice> = packet
            .prices
            .iter()
            .filter(|entry| {
                let complete = price_is_complete(entry);
                if !complete {
                    observer.notify(&IngestionEvent::PriceEntrySkipped {
                        batch_id: context.batch_id,
                        seller_code: context.seller_code,
                        perfume_name: name,
                        reason: "missing price, currency or size",
                    });
                }
                complete
            })
            .collect();

        let item = insert_item(txn, context, packet, name, brand, entries.first().copied()).await?;
        counts.items_staged += 1;

        for entry in entries {
            insert_price(txn, context, item.id, entry).await?;
            counts.prices_staged += 1;
        }
    }

    Ok(counts)
}

async fn insert_item(
    txn: &DatabaseTransaction,
    context: &StagingContext<'_>,
    packet: &ParsedPerfume,
    name: &str,
    brand: &str,
    first_price: Option<&ParsedPrice>,
) -> Result<staged_item::Model> {
    let mut snapshot = packet.clone();
    if snapshot.size_ml.is_none() {
        snapshot.size_ml = first_price.and_then(|entry| entry.size_ml);
    }

    let notes = packet
        .notes
        .as_deref()
        .and_then(Notes::parse)
        .map(|notes| serde_json::to_value(&notes))
        .transpose()?;

    let item = staged_item::ActiveModel {
        import_batch_id: Set(context.batch_id.to_string()),
        source_identifier: Set(context.source_identifier.to_string()),
        seller_code: Set(Some(context.seller_code.to_string())),
        raw_payload: Set(serde_json::to_value(&snapshot)?),
        validation_status: Set(ValidationStatus::Pending),
        processing_status: Set(ProcessingStatus::New),
        error_details: Set(None),
        matched_production_id: Set(None),
        perfume_name: Set(Some(name.to_string())),
        brand_name: Set(Some(brand.to_string())),
        concentration: Set(snapshot.concentration.clone()),
        gender: Set(snapshot.gender_affinity.clone()),
        description: Set(snapshot.description.clone()),
        notes: Set(notes),
        image_url: Set(snapshot.image_url.clone()),
        product_url: Set(first_price.and_then(|entry| entry.product_url.clone())),
        launch_year: Set(snapshot.launch_year),
        size_ml: Set(snapshot.size_ml),
        imported_at: Set(context.imported_at),
        processed_at: Set(None),
        ..Default::default()
    };
    item.insert(txn).await.map_err(Into::into)
}

async fn insert_price(
    txn: &DatabaseTransaction,
    context: &StagingContext<'_>,
    staged_item_id: i64,
    entry: &ParsedPrice,
) -> Result<staged_price::Model> {
    let price = staged_price::ActiveModel {
        staged_item_id: Set(staged_item_id),
        import_batch_id: Set(context.batch_id.to_string()),
        source_identifier: Set(context.source_identifier.to_string()),
        seller_code: Set(Some(context.seller_code.to_string())),
        raw_payload: Set(serde_json::to_value(entry)?),
        validation_status: Set(ValidationStatus::Pending),
        processing_status: Set(ProcessingStatus::New),
        error_details: Set(None),
        price: Set(entry.price),
        currency: Set(present(entry.currency.as_ref()).map(str::to_uppercase)),
        size_ml: Set(entry.size_ml),
        availability: Set(entry.stock_status.clone()),
        item_type: Set(entry.item_type.clone()),
        product_url: Set(entry.product_url.clone()),
        offer_details: Set(entry.offer_details.clone()),
        matched_production_perfume_id: Set(None),
        matched_production_price_id: Set(None),
        imported_at: Set(context.imported_at),
        processed_at: Set(None),
        ..Default::default()
    };
    price.insert(txn).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{StagedItem, StagedPrice};
    use crate::test_utils::*;
    use rust_decimal::Decimal;
    use sea_orm::{PaginatorTrait, QueryOrder};

    #[tokio::test]
    async fn test_stage_skips_incomplete_price_entry() -> Result<()> {
        let db = setup_test_db().await?;
        let observer = RecordingObserver::default();

        let mut missing_price = packet("Black Orchid", "Tom Ford", &[(50, 9900)]);
        missing_price.prices[0].price = None;
        let packets = vec![
            packet("La Nuit de L'Homme", "Yves Saint Laurent", &[(100, 7500)]),
            missing_price,
        ];

        let counts =
            stage_parsed_data(&db, &packets, "excel_import_standard_v1", "batch-1", "nykaa", &observer)
                .await?;

        assert_eq!(counts, StagingCounts { items_staged: 2, prices_staged: 1 });
        assert_eq!(observer.problem_count(), 1);
        assert_eq!(StagedItem::find().count(&db).await?, 2);
        assert_eq!(StagedPrice::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_skips_packet_without_brand() -> Result<()> {
        let db = setup_test_db().await?;
        let observer = RecordingObserver::default();
        let packets = vec![packet("Aventus", "  ", &[(100, 32_500)])];

        let counts = stage_parsed_data(&db, &packets, "csv_import_standard_v1", "b", "nykaa", &observer)
            .await?;

        assert_eq!(counts, StagingCounts::default());
        assert_eq!(observer.problem_count(), 1);
        assert!(observer.events()[0].contains("missing perfume name or brand"));
        Ok(())
    }

    #[tokio::test]
    async fn test_staged_records_carry_batch_context() -> Result<()> {
        let db = setup_test_db().await?;
        let observer = RecordingObserver::default();
        let mut sheet = packet("Aventus", "Creed", &[(100, 32_500), (10, 3400)]);
        sheet.notes = Some("Top: Pineapple, Bergamot; Base: Musk".to_string());
        sheet.prices[0].product_url = Some("https://example.com/aventus".to_string());

        stage_parsed_data(&db, &[sheet], "excel_import_standard_v1", "batch-7", "nykaa", &observer)
            .await?;

        let item = StagedItem::find().one(&db).await?.unwrap();
        assert_eq!(item.import_batch_id, "batch-7");
        assert_eq!(item.seller_code.as_deref(), Some("nykaa"));
        assert_eq!(item.validation_status, ValidationStatus::Pending);
        assert_eq!(item.processing_status, ProcessingStatus::New);
        assert_eq!(item.size_ml, Some(100));
        assert_eq!(item.product_url.as_deref(), Some("https://example.com/aventus"));
        assert_eq!(item.raw_payload["perfume_name"], "Aventus");

        let notes: Notes = serde_json::from_value(item.notes.unwrap())?;
        assert_eq!(notes.top, vec!["Pineapple", "Bergamot"]);
        assert_eq!(notes.base, vec!["Musk"]);

        let prices = StagedPrice::find()
            .order_by_asc(staged_price::Column::Id)
            .all(&db)
            .await?;
        assert_eq!(prices.len(), 2);
        assert!(prices.iter().all(|p| p.staged_item_id == item.id));
        assert!(prices.iter().all(|p| p.imported_at == item.imported_at));
        assert_eq!(prices[1].price, Some(Decimal::new(3400, 0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_empty_input() -> Result<()> {
        let db = setup_test_db().await?;
        let observer = RecordingObserver::default();
        let counts = stage_parsed_data(&db, &[], "excel_import_standard_v1", "b", "nykaa", &observer)
            .await?;
        assert_eq!(counts, StagingCounts::default());
        assert!(observer.events().is_empty());
        Ok(())
    }
}
