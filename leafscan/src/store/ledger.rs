//! Run-level files: `leafnumbers.csv`, the review ledger and the area summary.

use std::path::Path;

use super::{csv_error, finish, format_value, line_of, malformed, reader, writer, StoreResult};

/// Header of the review ledger.
pub const LEDGER_HEADER: [&str; 4] = ["filename", "n1", "n2", "needRemeasure"];

/// Header of the per-scan area summary.
pub const AREA_SUMMARY_HEADER: [&str; 3] = ["filename", "count", "totalArea"];

/// Automatic particle count of one scan, as listed in `leafnumbers.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCount {
    pub filename: String,
    pub count: usize,
}

/// Outcome of reviewing one scan.
///
/// `accepted_count <= auto_count` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCountRecord {
    pub filename: String,
    /// Count produced by measurement (`n1`).
    pub auto_count: usize,
    /// Count confirmed by the operator (`n2`).
    pub accepted_count: usize,
    pub needs_remeasure: bool,
}

/// Total leaf area of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub filename: String,
    pub count: usize,
    pub total_area: f64,
}

fn format_flag(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

fn parse_flag(field: &str) -> Option<bool> {
    match field {
        "True" | "true" | "1" => Some(true),
        "False" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Writes `filename,count` lines without a header.
pub fn write_leaf_numbers(path: &Path, counts: &[LeafCount]) -> StoreResult<()> {
    let mut out = writer(path)?;
    for entry in counts {
        let count = entry.count.to_string();
        out.write_record([entry.filename.as_str(), count.as_str()])
            .map_err(csv_error(path))?;
    }
    finish(out, path)?;
    tracing::info!(path = %path.display(), scans = counts.len(), "Leaf numbers saved");
    Ok(())
}

/// Reads `filename,count` lines. Quoted filenames and spaces after the comma
/// are accepted.
pub fn read_leaf_numbers(path: &Path) -> StoreResult<Vec<LeafCount>> {
    let mut input = reader(path, false)?;
    let mut counts = Vec::new();

    for record in input.records() {
        let record = record.map_err(csv_error(path))?;
        let line = line_of(&record);
        if record.len() != 2 {
            return Err(malformed(
                path,
                line,
                format!("expected filename and count, found {} fields", record.len()),
            ));
        }
        let field = record[1].trim();
        let count = field
            .parse()
            .map_err(|_| malformed(path, line, format!("'{field}' is not a count")))?;
        counts.push(LeafCount {
            filename: record[0].to_owned(),
            count,
        });
    }

    Ok(counts)
}

/// Writes the ledger header followed by one row per record.
pub fn write_ledger(path: &Path, records: &[LeafCountRecord]) -> StoreResult<()> {
    let mut out = writer(path)?;
    out.write_record(LEDGER_HEADER).map_err(csv_error(path))?;
    for record in records {
        let n1 = record.auto_count.to_string();
        let n2 = record.accepted_count.to_string();
        out.write_record([
            record.filename.as_str(),
            n1.as_str(),
            n2.as_str(),
            format_flag(record.needs_remeasure),
        ])
        .map_err(csv_error(path))?;
    }
    finish(out, path)?;
    tracing::info!(path = %path.display(), records = records.len(), "Ledger saved");
    Ok(())
}

pub fn read_ledger(path: &Path) -> StoreResult<Vec<LeafCountRecord>> {
    let mut input = reader(path, true)?;
    let mut records = Vec::new();

    for record in input.records() {
        let record = record.map_err(csv_error(path))?;
        let line = line_of(&record);
        if record.len() != LEDGER_HEADER.len() {
            return Err(malformed(
                path,
                line,
                format!("expected {} fields, found {}", LEDGER_HEADER.len(), record.len()),
            ));
        }
        let count = |field: &str| {
            let field = field.trim();
            field
                .parse::<usize>()
                .map_err(|_| malformed(path, line, format!("'{field}' is not a count")))
        };
        let flag = record[3].trim();
        let needs_remeasure = parse_flag(flag)
            .ok_or_else(|| malformed(path, line, format!("'{flag}' is not a flag")))?;

        records.push(LeafCountRecord {
            filename: record[0].to_owned(),
            auto_count: count(&record[1])?,
            accepted_count: count(&record[2])?,
            needs_remeasure,
        });
    }

    Ok(records)
}

pub fn write_area_summary(path: &Path, rows: &[AreaSummary]) -> StoreResult<()> {
    let mut out = writer(path)?;
    out.write_record(AREA_SUMMARY_HEADER).map_err(csv_error(path))?;
    for row in rows {
        let count = row.count.to_string();
        let total_area = format_value(row.total_area);
        out.write_record([row.filename.as_str(), count.as_str(), total_area.as_str()])
            .map_err(csv_error(path))?;
    }
    finish(out, path)?;
    tracing::info!(path = %path.display(), scans = rows.len(), "Area summary saved");
    Ok(())
}
