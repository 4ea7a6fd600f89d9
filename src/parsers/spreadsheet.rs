//! Workbook parser (xlsx, xlsm, xlsb, xls, ods) backed by calamine.
//!
//! Only the first worksheet is read, and its header must sit on row 1. Cells are rendered to text before the
//! shared column mapping runs, so numbers stored as numbers and numbers
//! stored as text are treated alike.

use super::columns::structure_rows;
use super::{ParsedPerfume, ParserOptions, SourceParser, ensure_readable};
use crate::errors::{Error, Result};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use std::path::Path;

/// Identifier stored on records staged from workbooks
pub const SOURCE_IDENTIFIER: &str = "excel_import_standard_v1";

/// Parses the standard seller layout from a workbook.
#[derive(Debug, Default)]
pub struct WorkbookParser {
    options: ParserOptions,
    errors: Vec<String>,
}

impl WorkbookParser {
    /// Creates a parser with the given column defaults.
    #[must_use]
    pub const fn new(options: ParserOptions) -> Self {
        Self {
            options,
            errors: Vec::new(),
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl SourceParser for WorkbookParser {
    fn parse(&mut self, path: &Path) -> Result<Vec<ParsedPerfume>> {
        self.errors.clear();
        ensure_readable(path)?;

        let mut workbook: Sheets<_> = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::Parser {
                message: format!("Workbook {} contains no sheets", path.display()),
            })??;

        // calamine trims leading blank rows, which would promote a lower row to header
        if let Some((row, _)) = range.start().filter(|(row, _)| *row != 0) {
            return Err(Error::Parser {
                message: format!(
                    "Header row must be row 1 of {}, but row 1 is blank (first content on row {})",
                    path.display(),
                    row + 1
                ),
            });
        }

        let rows: Vec<(usize, Vec<String>)> = range
            .rows()
            .enumerate()
            .map(|(offset, cells)| (offset + 1, cells.iter().map(cell_text).collect()))
            .collect();

        tracing::debug!(path = %path.display(), rows = rows.len(), "Read worksheet");
        structure_rows(rows, &self.options, &mut self.errors)
    }

    fn source_identifier(&self) -> &str {
        SOURCE_IDENTIFIER
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }
}
