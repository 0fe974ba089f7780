//! CSV text to [`Table`].
//!
//! Exports of the ledgers often carry a title row above the real header.
//! The header position is a per-table setting; when it is not configured it
//! is detected from the first row.

use crate::error::AuditError;
use crate::model::Table;

/// Share of empty-like cells in the first row above which that row is
/// treated as a title banner rather than the header.
const BANNER_EMPTY_RATIO: f64 = 0.7;

/// Guess the zero-based header row: 1 when the first row is mostly empty
/// (a merged title cell), else 0.
pub fn detect_header_row(rows: &[Vec<String>]) -> usize {
    let Some(first) = rows.first() else { return 0 };
    if first.is_empty() {
        return 0;
    }
    let empty_like = first
        .iter()
        .filter(|c| c.trim().is_empty() || c.starts_with("Unnamed"))
        .count();
    if empty_like as f64 / first.len() as f64 >= BANNER_EMPTY_RATIO {
        1
    } else {
        0
    }
}

/// Parse CSV text into a table. Rows above the header are dropped; data
/// rows are padded or cut to the header width.
pub fn load_csv_table(name: &str, csv_data: &str, header_row: Option<usize>) -> Result<Table, AuditError> {
    let data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AuditError::Csv {
            table: name.to_string(),
            message: e.to_string(),
        })?;
        raw.push(record.iter().map(|s| s.to_string()).collect());
    }

    let header_idx = header_row.unwrap_or_else(|| detect_header_row(&raw));
    if header_idx >= raw.len() {
        return Err(AuditError::EmptyTable(name.to_string()));
    }

    let mut rows = raw.split_off(header_idx + 1);
    let headers: Vec<String> = raw.swap_remove(header_idx).into_iter().map(|h| h.trim().to_string()).collect();

    let width = headers.len();
    for row in &mut rows {
        row.resize(width, String::new());
    }

    log::debug!(
        "table '{}': header row {}, {} column(s), {} row(s)",
        name,
        header_idx,
        width,
        rows.len()
    );

    Ok(Table::new(name, headers, rows))
}
