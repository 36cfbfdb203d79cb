// In-memory workbook host
//
// Values-only, multi-sheet. Formulas are stored as their raw '=' text and
// never evaluated. Backs the CLI front end and the test suite; a real
// host adapter implements the same trait against a live document.

use std::collections::HashMap;

use gridpilot_core::addr::{cell_ref, parse_cell_ref, range_ref};
use gridpilot_core::CellValue;

use crate::{ChartSpec, HostDocument, HostError, UsedRange, WriteMode};

struct MemSheet {
    name: String,
    cells: HashMap<(usize, usize), CellValue>,
    charts: Vec<ChartSpec>,
}

impl MemSheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: HashMap::new(),
            charts: Vec::new(),
        }
    }

    /// Bounding box of all non-empty cells, 0-indexed inclusive.
    fn used_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (&(row, col), value) in &self.cells {
            if value.is_empty() {
                continue;
            }
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((min_r, min_c, max_r, max_c)) => (
                    min_r.min(row),
                    min_c.min(col),
                    max_r.max(row),
                    max_c.max(col),
                ),
            });
        }
        bounds
    }
}

pub struct MemoryWorkbook {
    sheets: Vec<MemSheet>,
    active: usize,
    cursor: (usize, usize),
    protected: bool,
}

impl Default for MemoryWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorkbook {
    /// A workbook with a single empty "Sheet1", cursor at A1.
    pub fn new() -> Self {
        Self {
            sheets: vec![MemSheet::new("Sheet1")],
            active: 0,
            cursor: (0, 0),
            protected: false,
        }
    }

    /// A workbook with no sheets at all (read paths fail with Access).
    pub fn without_sheets() -> Self {
        Self {
            sheets: Vec::new(),
            active: 0,
            cursor: (0, 0),
            protected: false,
        }
    }

    /// Simulate host-side write protection: all mutations are rejected.
    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    /// Add a named sheet; fails on duplicate names.
    pub fn add_sheet(&mut self, name: &str) -> Result<(), HostError> {
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(HostError::Write(format!("sheet {:?} already exists", name)));
        }
        self.sheets.push(MemSheet::new(name));
        Ok(())
    }

    /// Rename the active sheet. Returns false when the name is taken or
    /// there is no active sheet.
    pub fn rename_active_sheet(&mut self, name: &str) -> bool {
        if self.sheets.iter().any(|s| s.name == name) {
            return false;
        }
        match self.sheets.get_mut(self.active) {
            Some(sheet) => {
                sheet.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Make the named sheet active. Returns false if it does not exist.
    pub fn set_active_sheet(&mut self, name: &str) -> bool {
        match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => {
                self.active = idx;
                true
            }
            None => false,
        }
    }

    /// Move the selection anchor to an A1 address.
    pub fn set_cursor(&mut self, addr: &str) -> Result<(), HostError> {
        let (row, col) = parse_cell_ref(addr)
            .ok_or_else(|| HostError::Access(format!("invalid cell address {:?}", addr)))?;
        self.cursor = (row, col);
        Ok(())
    }

    /// Set a cell on the active sheet (fixture/loader helper).
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(sheet) = self.sheets.get_mut(self.active) {
            sheet.cells.insert((row, col), value);
        }
    }

    /// Read a cell of the active sheet (test helper).
    pub fn cell(&self, row: usize, col: usize) -> CellValue {
        self.sheets
            .get(self.active)
            .and_then(|s| s.cells.get(&(row, col)).cloned())
            .unwrap_or(CellValue::Empty)
    }

    /// Charts created on the named sheet (test helper).
    pub fn charts(&self, sheet: &str) -> &[ChartSpec] {
        self.sheets
            .iter()
            .find(|s| s.name == sheet)
            .map(|s| s.charts.as_slice())
            .unwrap_or(&[])
    }

    /// Name of the active sheet.
    pub fn active_sheet_name(&self) -> Option<&str> {
        self.sheets.get(self.active).map(|s| s.name.as_str())
    }

    /// Row-major dump of the named sheet's used region (export helper).
    pub fn sheet_values(&self, name: &str) -> Option<Vec<Vec<CellValue>>> {
        let sheet = self.sheets.iter().find(|s| s.name == name)?;
        let Some((min_r, min_c, max_r, max_c)) = sheet.used_bounds() else {
            return Some(Vec::new());
        };
        let mut rows = Vec::with_capacity(max_r - min_r + 1);
        for row in min_r..=max_r {
            let mut out = Vec::with_capacity(max_c - min_c + 1);
            for col in min_c..=max_c {
                out.push(sheet.cells.get(&(row, col)).cloned().unwrap_or(CellValue::Empty));
            }
            rows.push(out);
        }
        Some(rows)
    }

    fn active_sheet(&self) -> Result<&MemSheet, HostError> {
        self.sheets
            .get(self.active)
            .ok_or_else(|| HostError::Access("no active sheet".into()))
    }

    fn active_sheet_mut(&mut self) -> Result<&mut MemSheet, HostError> {
        self.sheets
            .get_mut(self.active)
            .ok_or_else(|| HostError::Access("no active sheet".into()))
    }

    fn check_writable(&self) -> Result<(), HostError> {
        if self.protected {
            return Err(HostError::Write("sheet is protected".into()));
        }
        Ok(())
    }

    fn store(sheet: &mut MemSheet, row: usize, col: usize, value: &str, mode: WriteMode) {
        let stored = match mode {
            // Formula mode keeps the raw text, '=' and all
            WriteMode::Formulas => CellValue::Text(value.to_string()),
            WriteMode::Values => CellValue::from_field(value),
        };
        sheet.cells.insert((row, col), stored);
    }
}

/// Sheet-qualify a range address, quoting names that need it.
fn qualified(sheet: &str, range: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{}!{}", sheet, range)
    } else {
        format!("'{}'!{}", sheet, range)
    }
}

impl HostDocument for MemoryWorkbook {
    fn used_range(&self) -> Result<UsedRange, HostError> {
        let sheet = self.active_sheet()?;
        let Some((min_r, min_c, max_r, max_c)) = sheet.used_bounds() else {
            return Ok(UsedRange {
                address: "A1".to_string(),
                values: Vec::new(),
            });
        };
        let mut values = Vec::with_capacity(max_r - min_r + 1);
        for row in min_r..=max_r {
            let mut out = Vec::with_capacity(max_c - min_c + 1);
            for col in min_c..=max_c {
                out.push(sheet.cells.get(&(row, col)).cloned().unwrap_or(CellValue::Empty));
            }
            values.push(out);
        }
        Ok(UsedRange {
            address: range_ref(min_r, min_c, max_r, max_c),
            values,
        })
    }

    fn active_cell(&self) -> Result<String, HostError> {
        self.active_sheet()?;
        Ok(cell_ref(self.cursor.0, self.cursor.1))
    }

    fn sheet_names(&self) -> Result<Vec<String>, HostError> {
        if self.sheets.is_empty() {
            return Err(HostError::Access("document has no sheets".into()));
        }
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn write_active_cell(&mut self, value: &str, mode: WriteMode) -> Result<(), HostError> {
        self.check_writable()?;
        let (row, col) = self.cursor;
        let sheet = self.active_sheet_mut()?;
        Self::store(sheet, row, col, value, mode);
        Ok(())
    }

    fn write_column(&mut self, values: &[String], mode: WriteMode) -> Result<String, HostError> {
        self.check_writable()?;
        if values.is_empty() {
            return Err(HostError::Write("empty block".into()));
        }
        let (row, col) = self.cursor;
        let sheet = self.active_sheet_mut()?;
        for (i, value) in values.iter().enumerate() {
            Self::store(sheet, row + i, col, value, mode);
        }
        Ok(range_ref(row, col, row + values.len() - 1, col))
    }

    fn write_table(&mut self, name: &str, rows: &[Vec<String>]) -> Result<String, HostError> {
        self.check_writable()?;
        if rows.is_empty() {
            return Err(HostError::Write("empty table".into()));
        }
        if !self.sheets.iter().any(|s| s.name == name) {
            self.sheets.push(MemSheet::new(name));
        }
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.name == name)
            .expect("sheet just ensured");
        sheet.cells.clear();

        let mut max_cols = 0;
        for (r, row) in rows.iter().enumerate() {
            max_cols = max_cols.max(row.len());
            for (c, value) in row.iter().enumerate() {
                let mode = if value.starts_with('=') {
                    WriteMode::Formulas
                } else {
                    WriteMode::Values
                };
                Self::store(sheet, r, c, value, mode);
            }
        }
        if max_cols == 0 {
            return Err(HostError::Write("empty table".into()));
        }
        Ok(qualified(name, &range_ref(0, 0, rows.len() - 1, max_cols - 1)))
    }

    fn read_cell(&self, sheet: &str, addr: &str) -> Result<CellValue, HostError> {
        let sheet = self
            .sheets
            .iter()
            .find(|s| s.name == sheet)
            .ok_or_else(|| HostError::Access(format!("no sheet named {:?}", sheet)))?;
        let (row, col) = parse_cell_ref(addr)
            .ok_or_else(|| HostError::Access(format!("invalid cell address {:?}", addr)))?;
        Ok(sheet.cells.get(&(row, col)).cloned().unwrap_or(CellValue::Empty))
    }

    fn add_chart(&mut self, chart: &ChartSpec) -> Result<(), HostError> {
        self.check_writable()?;
        let sheet = self.active_sheet_mut()?;
        sheet.charts.push(chart.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpilot_core::ChartKind;
    use crate::Legend;

    fn sample() -> MemoryWorkbook {
        let mut wb = MemoryWorkbook::new();
        wb.set_cell(0, 0, CellValue::Text("Name".into()));
        wb.set_cell(0, 1, CellValue::Text("Amount".into()));
        wb.set_cell(1, 0, CellValue::Text("Widgets".into()));
        wb.set_cell(1, 1, CellValue::Number(120.0));
        wb.set_cell(2, 0, CellValue::Text("Gadgets".into()));
        wb.set_cell(2, 1, CellValue::Number(80.0));
        wb
    }

    #[test]
    fn test_used_range() {
        let wb = sample();
        let used = wb.used_range().unwrap();
        assert_eq!(used.address, "A1:B3");
        assert_eq!(used.values.len(), 3);
        assert_eq!(used.values[1][1], CellValue::Number(120.0));
    }

    #[test]
    fn test_used_range_empty_sheet() {
        let wb = MemoryWorkbook::new();
        let used = wb.used_range().unwrap();
        assert_eq!(used.address, "A1");
        assert!(used.values.is_empty());
    }

    #[test]
    fn test_no_sheets_is_access_error() {
        let wb = MemoryWorkbook::without_sheets();
        assert!(matches!(wb.used_range(), Err(HostError::Access(_))));
        assert!(matches!(wb.active_cell(), Err(HostError::Access(_))));
        assert!(matches!(wb.sheet_names(), Err(HostError::Access(_))));
    }

    #[test]
    fn test_write_active_cell_formula_kept_raw() {
        let mut wb = MemoryWorkbook::new();
        wb.set_cursor("B2").unwrap();
        wb.write_active_cell("=SUM(A1:A10)", WriteMode::Formulas).unwrap();
        assert_eq!(wb.cell(1, 1), CellValue::Text("=SUM(A1:A10)".into()));
    }

    #[test]
    fn test_write_column_returns_range() {
        let mut wb = MemoryWorkbook::new();
        wb.set_cursor("C1").unwrap();
        let values = vec!["=A1".to_string(), "x".to_string(), "=A2".to_string()];
        let range = wb.write_column(&values, WriteMode::Formulas).unwrap();
        assert_eq!(range, "C1:C3");
        assert_eq!(wb.cell(1, 2), CellValue::Text("x".into()));
        assert_eq!(wb.cell(2, 2), CellValue::Text("=A2".into()));
    }

    #[test]
    fn test_write_table_creates_and_clears_sheet() {
        let mut wb = MemoryWorkbook::new();
        let rows = vec![
            vec!["Sheet".to_string(), "Value".to_string()],
            vec!["North".to_string(), "12".to_string()],
        ];
        let range = wb.write_table("AI_Results", &rows).unwrap();
        assert_eq!(range, "AI_Results!A1:B2");

        // Writing again replaces prior content entirely
        let rows2 = vec![vec!["Only".to_string()]];
        let range2 = wb.write_table("AI_Results", &rows2).unwrap();
        assert_eq!(range2, "AI_Results!A1");
        assert_eq!(
            wb.read_cell("AI_Results", "B2").unwrap(),
            CellValue::Empty
        );
    }

    #[test]
    fn test_write_table_quotes_spaced_names() {
        let mut wb = MemoryWorkbook::new();
        let rows = vec![vec!["x".to_string()]];
        let range = wb.write_table("My Report", &rows).unwrap();
        assert_eq!(range, "'My Report'!A1");
    }

    #[test]
    fn test_rename_active_sheet() {
        let mut wb = MemoryWorkbook::new();
        assert!(wb.rename_active_sheet("January"));
        assert_eq!(wb.active_sheet_name(), Some("January"));
        wb.add_sheet("February").unwrap();
        // Taken names are refused
        assert!(!wb.rename_active_sheet("February"));
    }

    #[test]
    fn test_read_cell_unknown_sheet() {
        let wb = MemoryWorkbook::new();
        assert!(matches!(
            wb.read_cell("Nope", "A1"),
            Err(HostError::Access(_))
        ));
    }

    #[test]
    fn test_protected_rejects_writes() {
        let mut wb = sample();
        wb.set_protected(true);
        assert!(matches!(
            wb.write_active_cell("x", WriteMode::Values),
            Err(HostError::Write(_))
        ));
        assert!(matches!(
            wb.write_column(&["a".to_string()], WriteMode::Values),
            Err(HostError::Write(_))
        ));
        let chart = ChartSpec {
            kind: ChartKind::Pie,
            source_range: "A1:B3".into(),
            title: "T".into(),
            legend: Legend::Right,
        };
        assert!(matches!(wb.add_chart(&chart), Err(HostError::Write(_))));
    }

    #[test]
    fn test_add_chart_recorded_on_active_sheet() {
        let mut wb = sample();
        let chart = ChartSpec {
            kind: ChartKind::Line,
            source_range: "A1:B3".into(),
            title: "Trend".into(),
            legend: Legend::Right,
        };
        wb.add_chart(&chart).unwrap();
        assert_eq!(wb.charts("Sheet1"), &[chart]);
    }
}
