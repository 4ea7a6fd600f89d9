//! Delimited text parser (CSV, TSV) for sellers who export plain text.

use super::columns::structure_rows;
use super::{ParsedPerfume, ParserOptions, SourceParser, ensure_readable};
use crate::errors::Result;
use std::path::Path;

/// Identifier stored on records staged from delimited files
pub const SOURCE_IDENTIFIER: &str = "csv_import_standard_v1";

/// Parses the standard seller layout from a delimited text file.
#[derive(Debug)]
pub struct DelimitedParser {
    options: ParserOptions,
    delimiter: u8,
    errors: Vec<String>,
}

impl DelimitedParser {
    /// Creates a parser splitting fields on `delimiter`.
    #[must_use]
    pub const fn new(options: ParserOptions, delimiter: u8) -> Self {
        Self {
            options,
            delimiter,
            errors: Vec::new(),
        }
    }
}

impl SourceParser for DelimitedParser {
    fn parse(&mut self, path: &Path) -> Result<Vec<ParsedPerfume>> {
        self.errors.clear();
        ensure_readable(path)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_path(path)?;

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            rows.push((index + 1, record.iter().map(ToString::to_string).collect()));
        }

        structure_rows(rows, &self.options, &mut self.errors)
    }

    fn source_identifier(&self) -> &str {
        SOURCE_IDENTIFIER
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }
}
