//!
//! Common types and utilities shared by the stock query server and the table client.
//!
//! This crate aggregates:
//! - `error`: unified error type `StockError` used across the workspace.
//! - `result`: handy `Result<T, StockError>` alias.
//! - `columns`: the static column configuration (`ColumnKey`, `COLUMNS`).
//! - `format`: grouped and magnitude-suffixed number formatting.
//! - `record`: typed `RawRecord` / `DisplayRecord` schema and cell access.
//! - `page`: query parameters, page results and wire error bodies.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod columns;
pub mod error;
pub mod format;
pub mod net;
pub mod page;
pub mod record;
pub mod result;

pub use columns::{COLUMNS, Column, ColumnKey};
pub use error::StockError;
pub use page::{ErrorBody, ErrorCode, PageResult, QueryParams, SortOrder};
pub use record::{Cell, DisplayRecord, RawRecord};
pub use result::Result;
