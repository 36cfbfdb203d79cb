// Applying interpreted results to the host document
//
// Each ModelResult is consumed exactly once. Write modes are uniform per
// block: if any element of an array is a formula, the whole block is
// written in formula mode (hosts don't mix modes inside one write).

use gridpilot_core::{CellValue, ChartKind};
use gridpilot_host::{ChartSpec, HostDocument, HostError, Legend, WriteMode};

use crate::interpret::{ChartPlan, ChartSource, ModelResult};

/// Dedicated sheet hosting generated summary tables before charting.
/// Created on demand, reused (and cleared) on every table write.
pub const RESULTS_SHEET: &str = "AI_Results";

/// Apply one result to the document. Returns the human-readable summary
/// recorded in session history.
pub fn apply(host: &mut dyn HostDocument, result: &ModelResult) -> Result<String, HostError> {
    match result {
        ModelResult::Single(value) => {
            host.write_active_cell(value, mode_for(std::slice::from_ref(value)))?;
            Ok(value.clone())
        }
        ModelResult::Array(values) => {
            let range = host.write_column(values, mode_for(values))?;
            Ok(format!("[{} values] written to {}", values.len(), range))
        }
        ModelResult::Chart(plan) => apply_chart(host, plan),
    }
}

/// Formula mode when any element leads with '='. Blanks ride along as
/// empty strings in whatever mode the block gets.
fn mode_for(values: &[String]) -> WriteMode {
    if values.iter().any(|v| v.starts_with('=')) {
        WriteMode::Formulas
    } else {
        WriteMode::Values
    }
}

fn apply_chart(host: &mut dyn HostDocument, plan: &ChartPlan) -> Result<String, HostError> {
    let source_range = match &plan.source {
        ChartSource::Table(rows) => host.write_table(RESULTS_SHEET, rows)?,
        ChartSource::Range(range) => range.clone(),
    };
    host.add_chart(&ChartSpec {
        kind: plan.kind,
        source_range: source_range.clone(),
        title: plan.title.clone(),
        legend: Legend::Right,
    })?;
    Ok(format!("Created {} chart over {}", plan.kind, source_range))
}

/// Read one fixed cell from every sheet except the results sheet.
///
/// Strictly sequential: one host round-trip per sheet, in document
/// order. A host adapter that can batch reads may do so behind the
/// trait; correctness doesn't depend on it.
pub fn consolidate_sheets(
    host: &dyn HostDocument,
    cell_addr: &str,
) -> Result<Vec<(String, CellValue)>, HostError> {
    let mut rows = Vec::new();
    for name in host.sheet_names()? {
        if name == RESULTS_SHEET {
            continue;
        }
        let value = host.read_cell(&name, cell_addr)?;
        rows.push((name, value));
    }
    Ok(rows)
}

/// Consolidation variant: assemble the two-column (sheet, value) table,
/// write it to the results sheet, and chart it.
pub fn chart_consolidated(
    host: &mut dyn HostDocument,
    cell_addr: &str,
    kind: ChartKind,
    title: &str,
) -> Result<String, HostError> {
    let rows = consolidate_sheets(host, cell_addr)?;
    let mut table = vec![vec!["Sheet".to_string(), "Value".to_string()]];
    for (name, value) in rows {
        table.push(vec![name, value.to_string()]);
    }
    apply_chart(
        host,
        &ChartPlan {
            kind,
            title: title.to_string(),
            source: ChartSource::Table(table),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::DEFAULT_CHART_TITLE;
    use gridpilot_host::MemoryWorkbook;

    #[test]
    fn test_single_literal_written_to_active_cell() {
        let mut wb = MemoryWorkbook::new();
        wb.set_cursor("B2").unwrap();
        let summary = apply(&mut wb, &ModelResult::Single("Grand Total".into())).unwrap();
        assert_eq!(summary, "Grand Total");
        assert_eq!(wb.cell(1, 1), CellValue::Text("Grand Total".into()));
    }

    #[test]
    fn test_single_number_stored_as_number() {
        let mut wb = MemoryWorkbook::new();
        apply(&mut wb, &ModelResult::Single("42".into())).unwrap();
        assert_eq!(wb.cell(0, 0), CellValue::Number(42.0));
    }

    #[test]
    fn test_single_formula_written_in_formula_mode() {
        let mut wb = MemoryWorkbook::new();
        apply(&mut wb, &ModelResult::Single("=SUM(A1:A10)".into())).unwrap();
        assert_eq!(wb.cell(0, 0), CellValue::Text("=SUM(A1:A10)".into()));
    }

    #[test]
    fn test_mixed_array_collapses_to_all_formula() {
        let mut wb = MemoryWorkbook::new();
        wb.set_cursor("C1").unwrap();
        let values = vec!["=A1".to_string(), "x".to_string(), "=A2".to_string()];
        let summary = apply(&mut wb, &ModelResult::Array(values)).unwrap();
        assert_eq!(summary, "[3 values] written to C1:C3");
        // The whole block went through formula mode; the literal element
        // stays raw text rather than being value-coerced
        assert_eq!(wb.cell(0, 2), CellValue::Text("=A1".into()));
        assert_eq!(wb.cell(1, 2), CellValue::Text("x".into()));
        assert_eq!(wb.cell(2, 2), CellValue::Text("=A2".into()));
    }

    #[test]
    fn test_literal_array_written_as_values() {
        let mut wb = MemoryWorkbook::new();
        let values = vec!["10".to_string(), "20".to_string()];
        apply(&mut wb, &ModelResult::Array(values)).unwrap();
        assert_eq!(wb.cell(0, 0), CellValue::Number(10.0));
        assert_eq!(wb.cell(1, 0), CellValue::Number(20.0));
    }

    #[test]
    fn test_chart_over_range() {
        let mut wb = MemoryWorkbook::new();
        let plan = ChartPlan {
            kind: ChartKind::Pie,
            title: "T".into(),
            source: ChartSource::Range("A1:B5".into()),
        };
        let summary = apply(&mut wb, &ModelResult::Chart(plan)).unwrap();
        assert_eq!(summary, "Created pie chart over A1:B5");
        let charts = wb.charts("Sheet1");
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].source_range, "A1:B5");
        assert_eq!(charts[0].title, "T");
        assert_eq!(charts[0].legend, Legend::Right);
    }

    #[test]
    fn test_chart_with_table_writes_results_sheet_first() {
        let mut wb = MemoryWorkbook::new();
        let plan = ChartPlan {
            kind: ChartKind::Column,
            title: DEFAULT_CHART_TITLE.into(),
            source: ChartSource::Table(vec![
                vec!["Region".into(), "Total".into()],
                vec!["North".into(), "=SUM(B2:B9)".into()],
                vec!["South".into(), "120".into()],
            ]),
        };
        let summary = apply(&mut wb, &ModelResult::Chart(plan)).unwrap();
        assert_eq!(summary, "Created column chart over AI_Results!A1:B3");

        assert_eq!(
            wb.read_cell(RESULTS_SHEET, "A1").unwrap(),
            CellValue::Text("Region".into())
        );
        // Formula cell kept raw, literal number coerced
        assert_eq!(
            wb.read_cell(RESULTS_SHEET, "B2").unwrap(),
            CellValue::Text("=SUM(B2:B9)".into())
        );
        assert_eq!(
            wb.read_cell(RESULTS_SHEET, "B3").unwrap(),
            CellValue::Number(120.0)
        );
        let charts = wb.charts("Sheet1");
        assert_eq!(charts[0].source_range, "AI_Results!A1:B3");
    }

    #[test]
    fn test_write_error_propagates() {
        let mut wb = MemoryWorkbook::new();
        wb.set_protected(true);
        let err = apply(&mut wb, &ModelResult::Single("x".into())).unwrap_err();
        assert!(matches!(err, HostError::Write(_)));
    }

    #[test]
    fn test_consolidate_reads_every_sheet_in_order() {
        let mut wb = MemoryWorkbook::new();
        wb.set_cell(1, 1, CellValue::Number(10.0)); // Sheet1!B2
        wb.add_sheet("Q2").unwrap();
        wb.set_active_sheet("Q2");
        wb.set_cell(1, 1, CellValue::Number(20.0));
        wb.add_sheet(RESULTS_SHEET).unwrap();
        wb.set_active_sheet("Sheet1");

        let rows = consolidate_sheets(&wb, "B2").unwrap();
        assert_eq!(
            rows,
            vec![
                ("Sheet1".to_string(), CellValue::Number(10.0)),
                ("Q2".to_string(), CellValue::Number(20.0)),
            ]
        );
    }

    #[test]
    fn test_chart_consolidated_builds_two_column_table() {
        let mut wb = MemoryWorkbook::new();
        wb.set_cell(0, 0, CellValue::Number(5.0)); // Sheet1!A1
        wb.add_sheet("Q2").unwrap();
        wb.set_active_sheet("Q2");
        wb.set_cell(0, 0, CellValue::Number(7.0));
        wb.set_active_sheet("Sheet1");

        let summary = chart_consolidated(&mut wb, "A1", ChartKind::Line, "Totals").unwrap();
        assert_eq!(summary, "Created line chart over AI_Results!A1:B3");

        assert_eq!(
            wb.read_cell(RESULTS_SHEET, "A1").unwrap(),
            CellValue::Text("Sheet".into())
        );
        assert_eq!(
            wb.read_cell(RESULTS_SHEET, "A2").unwrap(),
            CellValue::Text("Sheet1".into())
        );
        assert_eq!(
            wb.read_cell(RESULTS_SHEET, "B3").unwrap(),
            CellValue::Number(7.0)
        );
        assert_eq!(wb.charts("Sheet1")[0].title, "Totals");
    }

    #[test]
    fn test_consolidate_missing_cell_reads_empty() {
        let wb = MemoryWorkbook::new();
        let rows = consolidate_sheets(&wb, "Z99").unwrap();
        assert_eq!(rows, vec![("Sheet1".to_string(), CellValue::Empty)]);
    }
}
