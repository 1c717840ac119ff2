//! Header detection and record extraction over a worksheet table.

use serde_json::{Map, Value};
use xlrows::{Row, Table};

/// Rules for turning table rows into records.
#[derive(Debug, Clone)]
pub struct ExtractRules {
    /// Text the first cell of the header row contains
    pub header: String,
    /// Rows whose first cell contains this text are dropped
    pub exclude: Option<String>,
    /// Output field names; the header row's cells when empty
    pub columns: Vec<String>,
    /// Fewest cells a row needs to become a record
    pub min_cells: usize,
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self {
            header: "Precinct".to_string(),
            exclude: Some("Total".to_string()),
            columns: Vec::new(),
            min_cells: 3,
        }
    }
}

/// Index of the header row: the first row whose first cell contains `marker`.
pub fn find_header(table: &Table, marker: &str) -> Option<usize> {
    table.position(|row| row.first().is_some_and(|cell| cell.contains(marker)))
}

/// Field names for the output records.
fn field_names(header: &Row, rules: &ExtractRules) -> Vec<String> {
    if !rules.columns.is_empty() {
        return rules.columns.clone();
    }
    header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if name.trim().is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.clone()
            }
        })
        .collect()
}

/// Extract records from the rows below the header.
///
/// A row becomes a record when it has at least `min_cells` cells, its first
/// cell is non-empty and that cell does not contain the exclude marker. Fields
/// the row is too short to fill are empty strings. With no header row the
/// result is empty.
pub fn extract_records(table: &Table, rules: &ExtractRules) -> Vec<Map<String, Value>> {
    let Some(header_idx) = find_header(table, &rules.header) else {
        log::warn!("no row starts with {:?}", rules.header);
        return Vec::new();
    };
    log::debug!("header found at row {}", header_idx + 1);

    let names = field_names(&table.rows()[header_idx], rules);

    table.rows()[header_idx + 1..]
        .iter()
        .filter(|row| !row.is_empty() && row.len() >= rules.min_cells)
        .filter(|row| {
            let first = &row[0];
            !first.is_empty()
                && rules
                    .exclude
                    .as_deref()
                    .is_none_or(|marker| !first.contains(marker))
        })
        .map(|row| {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row.get(i).cloned().unwrap_or_default();
                    (name.clone(), Value::String(value))
                })
                .collect()
        })
        .collect()
}
