//! The standard seller sheet layout shared by every tabular format.
//!
//! Row 1 holds the headers, matched case-insensitively. Each later row
//! becomes one [`ParsedPerfume`] with exactly one [`ParsedPrice`].

use super::{ParsedPerfume, ParsedPrice, ParserOptions};
use crate::core::price::normalize_token;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::str::FromStr;

/// A recognised column of the standard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// `perfume name` (required)
    PerfumeName,
    /// `brand` (required)
    Brand,
    /// `size (ml)` (required)
    SizeMl,
    /// `price` (required)
    Price,
    /// `currency` (required)
    Currency,
    /// `stock status`
    StockStatus,
    /// `product url`
    ProductUrl,
    /// `item type`
    ItemType,
    /// `concentration`
    Concentration,
    /// `gender affinity`
    GenderAffinity,
    /// `description`
    Description,
    /// `notes`
    Notes,
    /// `image url`
    ImageUrl,
    /// `launch year`
    LaunchYear,
    /// `offer details`
    OfferDetails,
}

impl Column {
    /// Every column in sheet-validation order.
    pub const ALL: [Self; 15] = [
        Self::PerfumeName,
        Self::Brand,
        Self::SizeMl,
        Self::Price,
        Self::Currency,
        Self::StockStatus,
        Self::ProductUrl,
        Self::ItemType,
        Self::Concentration,
        Self::GenderAffinity,
        Self::Description,
        Self::Notes,
        Self::ImageUrl,
        Self::LaunchYear,
        Self::OfferDetails,
    ];

    /// Lowercase header text.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::PerfumeName => "perfume name",
            Self::Brand => "brand",
            Self::SizeMl => "size (ml)",
            Self::Price => "price",
            Self::Currency => "currency",
            Self::StockStatus => "stock status",
            Self::ProductUrl => "product url",
            Self::ItemType => "item type",
            Self::Concentration => "concentration",
            Self::GenderAffinity => "gender affinity",
            Self::Description => "description",
            Self::Notes => "notes",
            Self::ImageUrl => "image url",
            Self::LaunchYear => "launch year",
            Self::OfferDetails => "offer details",
        }
    }

    /// Whether a row without this value is skipped.
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Self::PerfumeName | Self::Brand | Self::SizeMl | Self::Price | Self::Currency
        )
    }
}

/// Positions of the recognised columns, plus any extra headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    positions: HashMap<Column, usize>,
    extras: Vec<(usize, String)>,
}

impl HeaderMap {
    /// Maps a header row. The first occurrence of a repeated header wins.
    ///
    /// # Errors
    /// Returns [`Error::MissingHeaders`] naming every absent required column.
    pub fn from_header_row(cells: &[String]) -> Result<Self> {
        let normalized: Vec<String> = cells.iter().map(|c| c.trim().to_lowercase()).collect();
        let mut map = Self::default();
        let mut missing = Vec::new();

        for column in Column::ALL {
            match normalized.iter().position(|h| h == column.header()) {
                Some(index) => {
                    map.positions.insert(column, index);
                }
                None if column.is_required() => missing.push(column.header().to_string()),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingHeaders { columns: missing });
        }

        for (index, header) in normalized.into_iter().enumerate() {
            let known = Column::ALL.iter().any(|c| c.header() == header);
            if !known && !header.is_empty() {
                map.extras.push((index, header));
            }
        }
        Ok(map)
    }

    /// Position of `column`, if the sheet has it.
    #[must_use]
    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }
}

fn integral(text: &str) -> Option<i32> {
    let value = Decimal::from_str(text.trim()).ok()?;
    if value.fract().is_zero() {
        value.to_i32()
    } else {
        None
    }
}

/// Parses a size cell: `"100"`, `"100.0"`, `"100ml"`, `"100 ML"`.
#[must_use]
pub fn parse_size(text: &str) -> Option<i32> {
    let lowered = text.trim().to_lowercase();
    let digits = lowered.strip_suffix("ml").unwrap_or(&lowered);
    integral(digits).filter(|size| *size > 0)
}

/// Parses a price cell, ignoring thousands separators.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}

/// Parses a launch year cell.
#[must_use]
pub fn parse_year(text: &str) -> Option<i32> {
    integral(text)
}

/// Maps data rows onto packets for one sheet.
#[derive(Debug)]
pub struct RowMapper<'a> {
    headers: &'a HeaderMap,
    options: &'a ParserOptions,
}

impl<'a> RowMapper<'a> {
    /// Creates a mapper over a validated header row.
    #[must_use]
    pub const fn new(headers: &'a HeaderMap, options: &'a ParserOptions) -> Self {
        Self { headers, options }
    }

    fn cell<'c>(&self, cells: &'c [String], column: Column) -> Option<&'c str> {
        self.headers
            .position(column)
            .and_then(|index| cells.get(index))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Maps one data row. Returns `None` and appends warnings when a
    /// required cell is empty or a numeric cell does not parse.
    pub fn map_row(
        &self,
        row_number: usize,
        cells: &[String],
        warnings: &mut Vec<String>,
    ) -> Option<ParsedPerfume> {
        let mut valid = true;

        for column in Column::ALL {
            if column.is_required() && self.cell(cells, column).is_none() {
                warnings.push(format!(
                    "Row {row_number}: Required value for '{}' is missing.",
                    column.header()
                ));
                valid = false;
            }
        }

        let mut numeric = |column: Column, parse: &dyn Fn(&str) -> bool| {
            if let Some(value) = self.cell(cells, column) {
                if !parse(value) {
                    warnings.push(format!(
                        "Row {row_number}: Invalid number '{value}' for '{}'.",
                        column.header()
                    ));
                    valid = false;
                }
            }
        };
        numeric(Column::SizeMl, &|v| parse_size(v).is_some());
        numeric(Column::Price, &|v| parse_price(v).is_some());
        numeric(Column::LaunchYear, &|v| parse_year(v).is_some());

        if !valid {
            warnings.push(format!(
                "Row {row_number}: Skipped due to missing or invalid required information."
            ));
            return None;
        }

        let text = |column: Column| self.cell(cells, column).map(ToString::to_string);
        let price = ParsedPrice {
            price: self.cell(cells, Column::Price).and_then(parse_price),
            currency: self
                .cell(cells, Column::Currency)
                .map(str::to_uppercase),
            size_ml: self.cell(cells, Column::SizeMl).and_then(parse_size),
            stock_status: Some(normalize_token(
                self.cell(cells, Column::StockStatus)
                    .unwrap_or(self.options.default_stock_status.as_str()),
            )),
            product_url: text(Column::ProductUrl),
            item_type: Some(normalize_token(
                self.cell(cells, Column::ItemType)
                    .unwrap_or(self.options.default_item_type.as_str()),
            )),
            offer_details: text(Column::OfferDetails),
        };

        let extra = self
            .headers
            .extras
            .iter()
            .filter_map(|(index, header)| {
                cells
                    .get(*index)
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(|value| (header.clone(), value.to_string()))
            })
            .collect();

        Some(ParsedPerfume {
            perfume_name: text(Column::PerfumeName),
            brand: text(Column::Brand),
            description: text(Column::Description),
            notes: text(Column::Notes),
            image_url: text(Column::ImageUrl),
            concentration: text(Column::Concentration),
            gender_affinity: text(Column::GenderAffinity),
            launch_year: self.cell(cells, Column::LaunchYear).and_then(parse_year),
            size_ml: None,
            extra,
            prices: vec![price],
        })
    }
}

/// Structures a whole sheet. The first row is the header row; `rows` pairs
/// each row with its 1-based sheet row number.
///
/// # Errors
/// Returns [`Error::MissingHeaders`] when a required header is absent.
pub fn structure_rows<I>(
    rows: I,
    options: &ParserOptions,
    warnings: &mut Vec<String>,
) -> Result<Vec<ParsedPerfume>>
where
    I: IntoIterator<Item = (usize, Vec<String>)>,
{
    let mut rows = rows.into_iter().peekable();
    let Some((_, header_row)) = rows.next() else {
        warnings.push("The sheet is empty or contains only a header row.".to_string());
        return Ok(Vec::new());
    };
    if rows.peek().is_none() {
        warnings.push("The sheet is empty or contains only a header row.".to_string());
        return Ok(Vec::new());
    }

    let headers = HeaderMap::from_header_row(&header_row)?;
    let mapper = RowMapper::new(&headers, options);
    let mut packets = Vec::new();
    let mut saw_data = false;

    for (row_number, cells) in rows {
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        saw_data = true;
        if let Some(packet) = mapper.map_row(row_number, &cells, warnings) {
            packets.push(packet);
        }
    }

    if !saw_data {
        warnings.push("The sheet contains no data rows.".to_string());
    }
    Ok(packets)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    fn header() -> Vec<String> {
        row(&[
            "Perfume Name",
            "Brand",
            "Size (ml)",
            "Price",
            "Currency",
            "Stock Status",
            "Item Type",
            "Launch Year",
            "Batch Code",
        ])
    }

    #[test]
    fn test_missing_required_headers_listed() {
        let err = HeaderMap::from_header_row(&row(&["Perfume Name", "Price"])).unwrap_err();
        match err {
            Error::MissingHeaders { columns } => {
                assert_eq!(columns, vec!["brand", "size (ml)", "currency"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_structure_rows_maps_and_defaults() {
        let rows = vec![
            (1, header()),
            (
                2,
                row(&["Black Orchid", "Tom Ford", "50ml", "9,900.00", "inr", "", "", "2006", "B-17"]),
            ),
        ];
        let mut warnings = Vec::new();
        let packets = structure_rows(rows, &ParserOptions::default(), &mut warnings).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(packets.len(), 1);
        let packet = &packets[0];
        assert_eq!(packet.perfume_name.as_deref(), Some("Black Orchid"));
        assert_eq!(packet.launch_year, Some(2006));
        assert_eq!(packet.size_ml, None);
        assert_eq!(packet.extra.get("batch code").map(String::as_str), Some("B-17"));

        let price = &packet.prices[0];
        assert_eq!(price.price, Some(Decimal::new(9900, 0)));
        assert_eq!(price.currency.as_deref(), Some("INR"));
        assert_eq!(price.size_ml, Some(50));
        assert_eq!(price.stock_status.as_deref(), Some("in_stock"));
        assert_eq!(price.item_type.as_deref(), Some("full_bottle"));
    }

    #[test]
    fn test_bad_rows_are_skipped_with_warnings() {
        let rows = vec![
            (1, header()),
            (2, row(&["Aventus", "Creed", "100", "", "EUR", "", "", "", ""])),
            (3, row(&["Aventus", "Creed", "lots", "350", "EUR", "", "", "", ""])),
            (4, row(&["", "", "", "", "", "", "", "", ""])),
            (5, row(&["Aventus", "Creed", "50", "250", "EUR", "Pre-Order", "Decant", "", ""])),
        ];
        let mut warnings = Vec::new();
        let packets = structure_rows(rows, &ParserOptions::default(), &mut warnings).unwrap();

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].prices[0].stock_status.as_deref(), Some("pre_order"));
        assert_eq!(packets[0].prices[0].item_type.as_deref(), Some("decant"));
        assert_eq!(
            warnings,
            vec![
                "Row 2: Required value for 'price' is missing.".to_string(),
                "Row 2: Skipped due to missing or invalid required information.".to_string(),
                "Row 3: Invalid number 'lots' for 'size (ml)'.".to_string(),
                "Row 3: Skipped due to missing or invalid required information.".to_string(),
            ]
        );
    }

    #[test]
    fn test_header_only_sheet_is_a_warning() {
        let mut warnings = Vec::new();
        let packets =
            structure_rows(vec![(1, header())], &ParserOptions::default(), &mut warnings).unwrap();
        assert!(packets.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(parse_size("100"), Some(100));
        assert_eq!(parse_size("100.0"), Some(100));
        assert_eq!(parse_size(" 75 ML"), Some(75));
        assert_eq!(parse_size("7.5"), None);
        assert_eq!(parse_size("0"), None);
        assert_eq!(parse_price("1,250.50"), Some(Decimal::new(125_050, 2)));
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_year("2009"), Some(2009));
        assert_eq!(parse_year("2009.5"), None);
    }
}
