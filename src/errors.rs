//! Unified error type for the ingestion pipeline.
//!
//! Structural failures (unreadable files, missing header columns, database
//! outages) surface as variants of [`Error`]. Row-level parse problems are not
//! errors; parsers collect them as warnings instead.

use thiserror::Error;

/// Every failure the crate can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source file could not be parsed at all
    #[error("Parser error: {message}")]
    Parser {
        /// Human-readable description of the problem
        message: String,
    },

    /// The header row lacks one or more required columns
    #[error("Missing required header columns: {}", columns.join(", "))]
    MissingHeaders {
        /// Expected header names that were not found
        columns: Vec<String>,
    },

    /// Workbook could not be opened or decoded
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Delimited file could not be decoded
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No seller is registered under the staged seller code
    #[error("Seller with code '{code}' not found.")]
    SellerNotFound {
        /// The unresolved seller code
        code: String,
    },

    /// A staged record failed business validation
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// JSON (de)serialization of a payload failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
