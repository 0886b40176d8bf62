//! Error handling for the report updater
//!
//! Defines the typed error taxonomy for upload/grid failures and
//! establishes a unified Result type using anyhow for context chaining.

use thiserror::Error;

/// Core error types for report update operations
#[derive(Error, Debug)]
pub enum ReportError {
    /// A required column is absent from an upload. Aborts that category's
    /// action only; other categories are unaffected.
    #[error("column '{column}' not found in the uploaded {category} file. Please check the column names.")]
    ColumnMissing { category: String, column: String },

    /// A multi-layout category (tires, alignment) matched none of the
    /// known layouts. Carries the reason from every attempted layout.
    #[error("{category} file does not match any known format: {details}")]
    FormatNotRecognized { category: String, details: String },

    /// The selected day-of-month is missing from the grid's header row.
    /// Aborts the run before any write.
    #[error("date {label} not found in the sheet")]
    DateNotFound { label: String },

    /// A non-empty cell in a numeric column failed to parse after
    /// currency cleaning.
    #[error("could not parse '{value}' in column '{column}' as a number")]
    BadNumber { column: String, value: String },

    /// The batched grid write failed. Reported, not retried; completed
    /// writes from earlier actions stand.
    #[error("sheet update failed: {0}")]
    RemoteWrite(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn column_missing(category: &str, column: &str) -> Self {
        ReportError::ColumnMissing {
            category: category.to_string(),
            column: column.to_string(),
        }
    }
}

/// Result type alias for report operations
pub type Result<T> = anyhow::Result<T>;
