//! Per-scan particle tables (`res_<stem>.csv`).

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    csv_error, finish, format_value, line_of, malformed, reader, writer, StoreError, StoreResult,
};
use crate::descriptor::{Morphometrics, ShapeDescriptor};

/// Column names written for new tables.
pub const TABLE_HEADER: [&str; 7] = [
    "Filename", "Area", "Perim.", "Circ", "AR", "Round", "Solidity",
];

/// Header row of a result table, kept as read so rewrites reproduce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader(Vec<String>);

impl TableHeader {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }
}

impl Default for TableHeader {
    fn default() -> Self {
        Self(TABLE_HEADER.iter().map(|column| column.to_string()).collect())
    }
}

/// Writes one header row and one row per descriptor, in the given order.
pub fn write_table(
    path: &Path,
    header: &TableHeader,
    descriptors: &[ShapeDescriptor],
) -> StoreResult<()> {
    let mut out = writer(path)?;
    out.write_record(header.columns()).map_err(csv_error(path))?;

    for descriptor in descriptors {
        let values = descriptor.metrics().to_array().map(format_value);
        out.write_record(std::iter::once(descriptor.filename()).chain(values.iter().map(String::as_str)))
            .map_err(csv_error(path))?;
    }

    finish(out, path)
}

/// Rewrites an existing table through a sibling staging file, so a failed
/// write leaves the previous table in place.
pub fn replace_table(
    path: &Path,
    header: &TableHeader,
    descriptors: &[ShapeDescriptor],
) -> StoreResult<()> {
    let staging = staging_path(path);
    if let Err(err) = write_table(&staging, header, descriptors) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    fs::rename(&staging, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `.<name>.tmp` next to `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Reads a table back, preserving row order.
pub fn read_table(path: &Path) -> StoreResult<(TableHeader, Vec<ShapeDescriptor>)> {
    let mut input = reader(path, true)?;

    let header = input.headers().map_err(csv_error(path))?.clone();
    if header.len() != TABLE_HEADER.len() {
        return Err(malformed(
            path,
            1,
            format!(
                "expected {} header columns, found {}",
                TABLE_HEADER.len(),
                header.len()
            ),
        ));
    }
    let header = TableHeader::new(header.iter().map(|column| column.trim().to_owned()).collect());

    let mut descriptors = Vec::new();
    for record in input.records() {
        let record = record.map_err(csv_error(path))?;
        let line = line_of(&record);
        if record.len() != TABLE_HEADER.len() {
            return Err(malformed(
                path,
                line,
                format!(
                    "expected {} fields, found {}",
                    TABLE_HEADER.len(),
                    record.len()
                ),
            ));
        }

        let mut values = [0.0; 6];
        for (value, field) in values.iter_mut().zip(record.iter().skip(1)) {
            let field = field.trim();
            *value = field
                .parse()
                .map_err(|_| malformed(path, line, format!("'{field}' is not a number")))?;
        }

        let descriptor = ShapeDescriptor::new(&record[0], Morphometrics::from_array(values))
            .ok_or_else(|| malformed(path, line, "negative or NaN particle area"))?;
        descriptors.push(descriptor);
    }

    Ok((header, descriptors))
}
