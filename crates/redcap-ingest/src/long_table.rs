use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Column carrying the participant identifier.
pub const RECORD_ID: &str = "record_id";
/// Column carrying the raw visit-event label.
pub const EVENT_NAME: &str = "redcap_event_name";

/// A REDCap long-format export held in memory: one row per
/// participant-visit, all cells as trimmed strings, empty string = missing.
#[derive(Debug, Clone)]
pub struct LongTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LongTable {
    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell value, with missing cells and short rows both reading as "".
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Non-empty cell value by column name.
    pub fn value_by_name(&self, row: usize, name: &str) -> Option<&str> {
        let index = self.column_index(name)?;
        let value = self.value(row, index);
        if value.is_empty() { None } else { Some(value) }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Indices of the two required columns, or which one is missing.
    pub fn required_columns(&self) -> Result<(usize, usize)> {
        let record = self
            .column_index(RECORD_ID)
            .ok_or_else(|| IngestError::MissingColumn(RECORD_ID.to_string()))?;
        let event = self
            .column_index(EVENT_NAME)
            .ok_or_else(|| IngestError::MissingColumn(EVENT_NAME.to_string()))?;
        Ok((record, event))
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a long-format export. The first row is the header (REDCap exports
/// are regular, unlike hand-edited EDC extracts); headers and cells are
/// trimmed and BOM-stripped, fully blank rows are skipped, and short rows
/// are padded so every row has one cell per header.
pub fn read_long_table(path: &Path) -> Result<LongTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if headers.is_empty() {
            headers = record.iter().map(normalize_header).collect();
            continue;
        }
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let mut row = Vec::with_capacity(headers.len());
        for index in 0..headers.len() {
            let value = record.get(index).unwrap_or("");
            row.push(normalize_cell(value));
        }
        rows.push(row);
    }
    if headers.is_empty() || rows.is_empty() {
        return Err(IngestError::Empty);
    }
    debug!(
        path = %path.display(),
        rows = rows.len(),
        columns = headers.len(),
        "long table read"
    );
    Ok(LongTable { headers, rows })
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

/// Formats a floating-point number without trailing zeros ("10.50" -> "10.5",
/// "10.0" -> "10").
pub fn format_numeric(value: f64) -> String {
    let rendered = format!("{value}");
    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_f64_rejects_blank_and_garbage() {
        assert_eq!(parse_f64(" 3.5 "), Some(3.5));
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("n/a"), None);
    }

    #[test]
    fn format_numeric_strips_trailing_zeros() {
        assert_eq!(format_numeric(9.0), "9");
        assert_eq!(format_numeric(7.25), "7.25");
        assert_eq!(format_numeric(2.50), "2.5");
    }

    #[test]
    fn value_reads_short_rows_as_missing() {
        let table = LongTable {
            headers: vec!["record_id".into(), "redcap_event_name".into(), "phq9_1".into()],
            rows: vec![vec!["1".into(), "timepoint_1_arm_1".into()]],
        };
        assert_eq!(table.value(0, 2), "");
        assert_eq!(table.value_by_name(0, "record_id"), Some("1"));
        assert_eq!(table.value_by_name(0, "phq9_1"), None);
    }
}
