//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Start date after end date.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Date range longer than allowed.
    #[error("Date range of {days} days exceeds the maximum of {max} days")]
    RangeTooLong {
        /// Requested length in days (inclusive).
        days: i64,
        /// Maximum length in days.
        max: i64,
    },

    /// Unknown report kind in the URL.
    #[error("Unknown report type: {0}")]
    UnknownKind(String),

    /// Category filter sent to a report that mixes product and expense
    /// categories.
    #[error("categoryId is not supported for the {0} report")]
    CategoryNotSupported(&'static str),

    /// PDF rendering failed.
    #[error("Failed to render report: {0}")]
    Render(String),
}
