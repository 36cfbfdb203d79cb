// Spreadsheet context extraction
//
// Snapshots the active sheet's used region into a row-object sample the
// model can read, capped to a fixed row count. The sample is derived
// data, built once per request and never mutated.

use serde_json::{Map, Value};

use gridpilot_core::{col_to_letter, CellValue};
use gridpilot_host::{HostDocument, HostError};

/// Maximum rows included in the context sample. Truncation is top-left
/// anchored; there is no sampling strategy beyond cutting the tail.
pub const MAX_SAMPLE_ROWS: usize = 50;

/// Snapshot of the document at request time.
#[derive(Debug, Clone)]
pub struct SheetContext {
    /// Row objects keyed by inferred header text or generated column
    /// letter. Key order follows column order.
    pub sample_rows: Vec<Map<String, Value>>,
    /// Address of the full used region (may exceed the sample).
    pub used_range_address: String,
    /// Address of the current selection anchor.
    pub active_cell_address: String,
    /// All sheet names, when cross-sheet reasoning is enabled.
    pub sheet_names: Vec<String>,
}

impl SheetContext {
    /// The sample as a JSON string for embedding in the prompt.
    pub fn sample_json(&self) -> String {
        serde_json::to_string(&self.sample_rows).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Read the document and build the context for one request.
///
/// `include_sheets` enables the sheet-name listing used for cross-sheet
/// formula synthesis; everything else is always read.
pub fn extract_context(
    host: &dyn HostDocument,
    include_sheets: bool,
) -> Result<SheetContext, HostError> {
    let used = host.used_range()?;
    let active_cell_address = host.active_cell()?;
    let sheet_names = if include_sheets {
        host.sheet_names()?
    } else {
        Vec::new()
    };

    Ok(SheetContext {
        sample_rows: build_sample(&used.values),
        used_range_address: used.address,
        active_cell_address,
        sheet_names,
    })
}

/// Turn raw row-major values into keyed row objects.
///
/// Row 0 is treated as a header row only if every cell in it is
/// non-empty text. With headers, each following row is keyed by header
/// text; without, every row (including row 0) is keyed by column letter.
fn build_sample(values: &[Vec<CellValue>]) -> Vec<Map<String, Value>> {
    if values.is_empty() {
        return Vec::new();
    }
    let limited = &values[..values.len().min(MAX_SAMPLE_ROWS)];

    let first = &limited[0];
    let has_headers = !first.is_empty() && first.iter().all(CellValue::is_nonempty_text);

    if has_headers && limited.len() > 1 {
        let headers: Vec<String> = first
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let text = cell.to_string();
                if text.is_empty() {
                    format!("Column{}", i)
                } else {
                    text
                }
            })
            .collect();
        limited[1..]
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (i, header) in headers.iter().enumerate() {
                    let value = row.get(i).map(CellValue::to_json).unwrap_or(Value::Null);
                    obj.insert(header.clone(), value);
                }
                obj
            })
            .collect()
    } else {
        limited
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (i, cell) in row.iter().enumerate() {
                    obj.insert(col_to_letter(i), cell.to_json());
                }
                obj
            })
            .collect()
    }
}
