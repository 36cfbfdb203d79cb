// CSV workbook load/save for the CLI front end
//
// A front-end convenience, not an owned on-disk format: rows go in and
// out as display strings; typed values are inferred on the way in.

use std::path::Path;

use gridpilot_core::CellValue;
use gridpilot_host::MemoryWorkbook;

use crate::exit_codes;
use crate::CliError;

/// Load a CSV file into the currently active sheet of the workbook.
pub fn load_csv_into_active(
    wb: &mut MemoryWorkbook,
    path: &Path,
    delimiter: char,
) -> Result<(), CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CliError {
            code: exit_codes::EXIT_USAGE,
            message: format!("cannot read {}: {}", path.display(), e),
            hint: None,
        })?;

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CliError {
            code: exit_codes::EXIT_ERROR,
            message: format!("CSV parse error in {}: {}", path.display(), e),
            hint: None,
        })?;
        for (col, field) in record.iter().enumerate() {
            let value = CellValue::from_field(field);
            if !matches!(value, CellValue::Empty) {
                wb.set_cell(row, col, value);
            }
        }
    }
    Ok(())
}

/// Save a named sheet's used region as CSV.
pub fn save_sheet_csv(
    wb: &MemoryWorkbook,
    sheet: &str,
    path: &Path,
    delimiter: char,
) -> Result<(), CliError> {
    let rows = wb.sheet_values(sheet).ok_or_else(|| CliError {
        code: exit_codes::EXIT_HOST_READ,
        message: format!("no sheet named {:?}", sheet),
        hint: None,
    })?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| CliError {
            code: exit_codes::EXIT_ERROR,
            message: format!("cannot create {}: {}", path.display(), e),
            hint: None,
        })?;

    for row in rows {
        let record: Vec<String> = row.iter().map(CellValue::to_string).collect();
        writer.write_record(&record).map_err(|e| CliError {
            code: exit_codes::EXIT_ERROR,
            message: format!("CSV write error: {}", e),
            hint: None,
        })?;
    }
    writer.flush().map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: format!("CSV flush error: {}", e),
        hint: None,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_infers_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "Region,Sales,Active\nNorth,1200,TRUE\nSouth,900,FALSE\n")
            .unwrap();

        let mut wb = MemoryWorkbook::new();
        load_csv_into_active(&mut wb, &path, ',').unwrap();

        assert_eq!(wb.cell(0, 0), CellValue::Text("Region".into()));
        assert_eq!(wb.cell(1, 1), CellValue::Number(1200.0));
        assert_eq!(wb.cell(2, 2), CellValue::Bool(false));
    }

    #[test]
    fn test_load_missing_file_is_usage_error() {
        let mut wb = MemoryWorkbook::new();
        let err =
            load_csv_into_active(&mut wb, Path::new("/nonexistent.csv"), ',').unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_USAGE);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut wb = MemoryWorkbook::new();
        wb.set_cell(0, 0, CellValue::Text("A".into()));
        wb.set_cell(0, 1, CellValue::Number(1.5));
        wb.set_cell(1, 0, CellValue::Bool(true));
        save_sheet_csv(&wb, "Sheet1", &path, ',').unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "A,1.5\nTRUE,\n");
    }

    #[test]
    fn test_save_unknown_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let wb = MemoryWorkbook::new();
        let err = save_sheet_csv(&wb, "Nope", &path, ',').unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_HOST_READ);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a;b\n1;2\n").unwrap();

        let mut wb = MemoryWorkbook::new();
        load_csv_into_active(&mut wb, &path, ';').unwrap();
        assert_eq!(wb.cell(1, 1), CellValue::Number(2.0));
    }
}
