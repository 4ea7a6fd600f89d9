//! Perfume business logic - catalog lookups and merges.
//!
//! The catalog identity of a perfume is its (name, brand) pair, compared
//! case-insensitively and exactly. Every function is generic over
//! `ConnectionTrait` so the reconciler can run it inside an item transaction.

use crate::{
    core::notes::Notes,
    entities::{Perfume, perfume},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Catalog attributes supplied by a source. `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerfumeAttributes {
    /// Marketing description
    pub description: Option<String>,
    /// Structured notes
    pub notes: Option<Notes>,
    /// Image reference
    pub image_url: Option<String>,
    /// E.g., "Eau de Parfum"
    pub concentration: Option<String>,
    /// E.g., "Unisex"
    pub gender_affinity: Option<String>,
    /// Release year
    pub launch_year: Option<i32>,
}

/// Folds a name or brand into its matching key: trimmed and lowercased with
/// full Unicode case mapping, so `"Éclat"` and `"ÉCLAT "` share a key.
#[must_use]
pub fn identity_key(text: &str) -> String {
    text.trim().to_lowercase()
}

fn notes_to_json(notes: Option<&Notes>) -> Result<Option<Json>> {
    notes.map(serde_json::to_value).transpose().map_err(Into::into)
}

/// Finds a perfume by name and brand, ignoring case and surrounding whitespace.
/// Matching runs on the stored keys, never on `LOWER()` in SQL.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_by_name_and_brand<C>(
    db: &C,
    name: &str,
    brand: &str,
) -> Result<Option<perfume::Model>>
where
    C: ConnectionTrait,
{
    Perfume::find()
        .filter(perfume::Column::NameKey.eq(identity_key(name)))
        .filter(perfume::Column::BrandKey.eq(identity_key(brand)))
        .order_by_asc(perfume::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a perfume by id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_perfume_by_id<C>(db: &C, perfume_id: i64) -> Result<Option<perfume::Model>>
where
    C: ConnectionTrait,
{
    Perfume::find_by_id(perfume_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a catalog entry.
///
/// # Errors
/// Returns an error if:
/// - The name or brand is empty or whitespace-only
/// - A perfume with the same folded name and brand already exists
/// - The notes cannot be serialized
/// - The database insert fails
pub async fn create_perfume<C>(
    db: &C,
    name: &str,
    brand: &str,
    attributes: &PerfumeAttributes,
) -> Result<perfume::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() || brand.trim().is_empty() {
        return Err(Error::Validation {
            message: "Missing perfume name or brand.".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let perfume = perfume::ActiveModel {
        name: Set(name.trim().to_string()),
        brand: Set(brand.trim().to_string()),
        name_key: Set(identity_key(name)),
        brand_key: Set(identity_key(brand)),
        description: Set(attributes.description.clone()),
        notes: Set(notes_to_json(attributes.notes.as_ref())?),
        image_url: Set(attributes.image_url.clone()),
        concentration: Set(attributes.concentration.clone()),
        gender_affinity: Set(attributes.gender_affinity.clone()),
        launch_year: Set(attributes.launch_year),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    perfume.insert(db).await.map_err(Into::into)
}

/// Overwrites the attributes a source provided and leaves the rest alone.
/// Name and brand are the identity and are never rewritten.
///
/// # Errors
/// Returns an error if the notes cannot be serialized or the update fails.
pub async fn merge_attributes<C>(
    db: &C,
    existing: perfume::Model,
    attributes: &PerfumeAttributes,
) -> Result<perfume::Model>
where
    C: ConnectionTrait,
{
    let mut perfume: perfume::ActiveModel = existing.into();

    if let Some(description) = &attributes.description {
        perfume.description = Set(Some(description.clone()));
    }
    if let Some(notes) = notes_to_json(attributes.notes.as_ref())? {
        perfume.notes = Set(Some(notes));
    }
    if let Some(image_url) = &attributes.image_url {
        perfume.image_url = Set(Some(image_url.clone()));
    }
    if let Some(concentration) = &attributes.concentration {
        perfume.concentration = Set(Some(concentration.clone()));
    }
    if let Some(gender) = &attributes.gender_affinity {
        perfume.gender_affinity = Set(Some(gender.clone()));
    }
    if let Some(year) = attributes.launch_year {
        perfume.launch_year = Set(Some(year));
    }
    perfume.updated_at = Set(chrono::Utc::now());

    perfume.update(db).await.map_err(Into::into)
}

/// Finds the perfume for (name, brand) and merges `attributes` into it, or
/// creates it. Returns the row and whether it was created.
///
/// # Errors
/// Returns an error if validation or any database operation fails.
pub async fn upsert_perfume<C>(
    db: &C,
    name: &str,
    brand: &str,
    attributes: &PerfumeAttributes,
) -> Result<(perfume::Model, bool)>
where
    C: ConnectionTrait,
{
    match find_by_name_and_brand(db, name, brand).await? {
        Some(existing) => Ok((merge_attributes(db, existing, attributes).await?, false)),
        None => Ok((create_perfume(db, name, brand, attributes).await?, true)),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_lookup_ignores_case_and_whitespace() -> Result<()> {
        let db = setup_test_db().await?;
        let created =
            create_perfume(&db, "Black Orchid", "Tom Ford", &PerfumeAttributes::default()).await?;

        let found = find_by_name_and_brand(&db, "  BLACK orchid", "tom ford ")
            .await?
            .unwrap();
        assert_eq!(found.id, created.id);

        assert!(
            find_by_name_and_brand(&db, "Black Orchid", "Tom Fordd")
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_folds_non_ascii_capitals() -> Result<()> {
        let db = setup_test_db().await?;
        let created =
            create_perfume(&db, "Éclat d'Arpège", "Lanvin", &PerfumeAttributes::default()).await?;
        assert_eq!(created.name_key, "éclat d'arpège");

        let found = find_by_name_and_brand(&db, "ÉCLAT D'ARPÈGE", "LANVIN")
            .await?
            .unwrap();
        assert_eq!(found.id, created.id);

        let (same, was_created) =
            upsert_perfume(&db, "Éclat d'Arpège", "Lanvin", &PerfumeAttributes::default()).await?;
        assert!(!was_created);
        assert_eq!(same.id, created.id);
        assert_eq!(Perfume::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_identity_is_unique_in_storage() -> Result<()> {
        let db = setup_test_db().await?;
        create_perfume(&db, "Éclat d'Arpège", "Lanvin", &PerfumeAttributes::default()).await?;
        let duplicate =
            create_perfume(&db, "éclat d'arpège ", "LANVIN", &PerfumeAttributes::default()).await;
        assert!(matches!(duplicate, Err(Error::Database(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_requires_name_and_brand() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_perfume(&db, " ", "Tom Ford", &PerfumeAttributes::default()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_merge_keeps_existing_values_for_missing_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let original = create_perfume(
            &db,
            "La Nuit de L'Homme",
            "Yves Saint Laurent",
            &PerfumeAttributes {
                description: Some("Intense and seductive".to_string()),
                concentration: Some("Eau de Toilette".to_string()),
                launch_year: Some(2009),
                ..PerfumeAttributes::default()
            },
        )
        .await?;

        let (merged, created) = upsert_perfume(
            &db,
            "la nuit de l'homme",
            "YVES SAINT LAURENT",
            &PerfumeAttributes {
                image_url: Some("la_nuit.jpg".to_string()),
                notes: Notes::parse("Top: Cardamom; Base: Vetiver"),
                ..PerfumeAttributes::default()
            },
        )
        .await?;

        assert!(!created);
        assert_eq!(merged.id, original.id);
        assert_eq!(merged.name, "La Nuit de L'Homme");
        assert_eq!(merged.description.as_deref(), Some("Intense and seductive"));
        assert_eq!(merged.concentration.as_deref(), Some("Eau de Toilette"));
        assert_eq!(merged.launch_year, Some(2009));
        assert_eq!(merged.image_url.as_deref(), Some("la_nuit.jpg"));

        let notes: Notes = serde_json::from_value(merged.notes.unwrap())?;
        assert_eq!(notes.top, vec!["Cardamom"]);
        assert_eq!(notes.base, vec!["Vetiver"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_creates_when_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let (perfume, created) =
            upsert_perfume(&db, "Aventus", "Creed", &PerfumeAttributes::default()).await?;
        assert!(created);
        assert_eq!(perfume.brand, "Creed");
        assert_eq!(Perfume::find().count(&db).await?, 1);
        Ok(())
    }
}
