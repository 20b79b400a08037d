//! Business reports.
//!
//! Reports are computed in three steps: the API resolves a [`ReportQuery`]
//! into a [`ReportFilter`], the database layer loads the matching rows, and
//! [`ReportService`] folds those rows into one of the report structs. A
//! finished [`ReportDocument`] can be returned as JSON or rendered with
//! [`render_pdf`].

pub mod error;
pub mod filter;
pub mod pdf;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use filter::{ReportFilter, ReportKind, ReportQuery};
pub use pdf::{PdfHeader, format_money, render_pdf};
pub use service::ReportService;
pub use types::*;
