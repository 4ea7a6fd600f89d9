//! Source parsers - turn a seller's file into structured perfume packets.
//!
//! Every format implements [`SourceParser`]. Parsers know nothing about
//! production ids; they only validate the sheet layout, coerce cell values
//! and collect row-level problems as warnings. A missing required header or
//! an unreadable file fails the whole parse; a bad row is skipped.

use crate::config::IngestionSettings;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub mod columns;
pub mod delimited;
pub mod spreadsheet;

pub use delimited::DelimitedParser;
pub use spreadsheet::WorkbookParser;

/// One perfume as read from a source, with its price entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPerfume {
    /// Perfume name
    pub perfume_name: Option<String>,
    /// Brand or house
    pub brand: Option<String>,
    /// Marketing description
    pub description: Option<String>,
    /// Free-text notes, structured later by the staging writer
    pub notes: Option<String>,
    /// Image reference
    pub image_url: Option<String>,
    /// Concentration, e.g. "Eau de Parfum"
    pub concentration: Option<String>,
    /// Gender affinity, e.g. "Unisex"
    pub gender_affinity: Option<String>,
    /// Release year
    pub launch_year: Option<i32>,
    /// Representative size in millilitres; backfilled from the first price
    pub size_ml: Option<i32>,
    /// Columns the parser does not recognise, keyed by lowercased header
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    /// Price entries for this perfume
    pub prices: Vec<ParsedPrice>,
}

/// One price entry nested under a [`ParsedPerfume`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrice {
    /// Asking price
    pub price: Option<Decimal>,
    /// Currency code, uppercased
    pub currency: Option<String>,
    /// Size in millilitres
    pub size_ml: Option<i32>,
    /// Normalized stock token
    pub stock_status: Option<String>,
    /// Listing URL
    pub product_url: Option<String>,
    /// Normalized item type token
    pub item_type: Option<String>,
    /// Promotion text
    pub offer_details: Option<String>,
}

/// Defaults applied to optional columns left blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Stock status for rows without one
    pub default_stock_status: String,
    /// Item type for rows without one
    pub default_item_type: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::from(&IngestionSettings::default())
    }
}

impl From<&IngestionSettings> for ParserOptions {
    fn from(settings: &IngestionSettings) -> Self {
        Self {
            default_stock_status: settings.default_stock_status.clone(),
            default_item_type: settings.default_item_type.clone(),
        }
    }
}

/// A pluggable reader for one source format.
pub trait SourceParser {
    /// Parses the file at `path`. Warnings from the previous call are
    /// discarded first.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or decoded, or when a
    /// required header column is missing. No packets are returned then.
    fn parse(&mut self, path: &Path) -> Result<Vec<ParsedPerfume>>;

    /// Stable name of the format, stored on every staged record.
    fn source_identifier(&self) -> &str;

    /// Row-level warnings collected by the last [`SourceParser::parse`].
    fn errors(&self) -> &[String];
}

/// Chooses a parser from the file extension.
///
/// # Errors
/// Returns [`Error::Parser`] for extensions no parser handles.
pub fn parser_for_path(path: &Path, options: ParserOptions) -> Result<Box<dyn SourceParser>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(WorkbookParser::new(options))),
        "csv" => Ok(Box::new(DelimitedParser::new(options, b','))),
        "tsv" => Ok(Box::new(DelimitedParser::new(options, b'\t'))),
        _ => Err(Error::Parser {
            message: format!("Unsupported file type: {}", path.display()),
        }),
    }
}

/// Fails unless `path` names a readable regular file.
pub(crate) fn ensure_readable(path: &Path) -> Result<()> {
    let readable = std::fs::metadata(path).is_ok_and(|meta| meta.is_file())
        && std::fs::File::open(path).is_ok();
    if readable {
        Ok(())
    } else {
        Err(Error::Parser {
            message: format!(
                "Invalid or unreadable file path provided: {}",
                path.display()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_path_by_extension() {
        let options = ParserOptions::default();
        let workbook = parser_for_path(Path::new("sheet.XLSX"), options.clone());
        assert_eq!(
            workbook.map(|p| p.source_identifier().to_string()).ok(),
            Some(spreadsheet::SOURCE_IDENTIFIER.to_string())
        );

        let csv = parser_for_path(Path::new("sheet.csv"), options.clone());
        assert_eq!(
            csv.map(|p| p.source_identifier().to_string()).ok(),
            Some(delimited::SOURCE_IDENTIFIER.to_string())
        );

        assert!(matches!(
            parser_for_path(Path::new("sheet.pdf"), options),
            Err(Error::Parser { .. })
        ));
    }

    #[test]
    fn test_ensure_readable_rejects_missing_file() {
        assert!(matches!(
            ensure_readable(Path::new("/no/such/file.xlsx")),
            Err(Error::Parser { .. })
        ));
    }
}
