//! Delimited-text persistence for result tables, leaf counts and the review ledger.
//!
//! All files are UTF-8, comma separated, with fields quoted only when needed.
//! Readers trim whitespace around header and numeric fields so tables written
//! with `", "` separators by earlier tooling still load. Filename fields are
//! taken verbatim.

mod ledger;
mod table;


use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use ledger::{
    read_leaf_numbers, read_ledger, write_area_summary, write_leaf_numbers, write_ledger,
    AreaSummary, LeafCount, LeafCountRecord, AREA_SUMMARY_HEADER, LEDGER_HEADER,
};
pub use table::{read_table, replace_table, write_table, TableHeader, TABLE_HEADER};

/// Errors raised while reading or writing result files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("CSV error in '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed '{path}' at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fixed-point formatting used for every numeric column.
pub(crate) fn format_value(value: f64) -> String {
    format!("{:.6}", value)
}

pub(crate) fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> StoreError + '_ {
    move |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn malformed(path: &Path, line: u64, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

pub(crate) fn writer(path: &Path) -> StoreResult<csv::Writer<File>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error(path))
}

pub(crate) fn reader(path: &Path, has_headers: bool) -> StoreResult<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error(path))
}

pub(crate) fn finish(mut writer: csv::Writer<File>, path: &Path) -> StoreResult<()> {
    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |position| position.line())
}
