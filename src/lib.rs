//! Employee record ingestion with one normalized record shape.
//!
//! - Decoding: spreadsheet (`xlsx`/`xls`), CSV, JSON array, YAML sequence.
//! - Normalization: trimmed column names, date columns rewritten to `YYYY/MM/DD` or `--`.
//! - Store: explicit in-memory employee list with filtering, persisted as one key-value blob.
//!
//! Data shape:
//! - `Record` maps column label to text; `RecordCollection` keeps source order.
//! - Decoding never fails past its boundary: see [`Decoded`] and [`DecodeReport`].
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
pub mod config;
pub mod date;
mod decode;
pub mod field;
mod io;
pub mod loader;
pub mod normalize;
pub mod record;
pub mod storage;
pub mod store;
pub mod template;

pub use crate::config::IngestConfig;
pub use crate::date::{canonical_date_text, parse_flexible_date, ABSENT_DATE};
pub use crate::decode::{decode, decode_csv_stream, try_decode, DecodeReport, Decoded, SourceFormat};
pub use crate::field::Field;
pub use crate::io::{build_source_reader, read_source, reader_from_path, SourceMeta};
pub use crate::normalize::normalize;
pub use crate::record::{Record, RecordCollection};
pub use crate::store::{EmployeeStore, Filter, Statistics};

use thiserror::Error;

/// Error type returned by this crate when not using `anyhow`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: String,
    },
    #[error("content is not valid {0} text")]
    Encoding(&'static str),
    #[error("workbook has no worksheet")]
    NoWorksheet,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("employee number already in use: {0}")]
    DuplicateEmployee(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),
    #[error(transparent)]
    Template(#[from] rust_xlsxwriter::XlsxError),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
