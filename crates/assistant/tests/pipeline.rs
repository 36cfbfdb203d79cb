// End-to-end pipeline tests: extract → invoke (mock server) →
// interpret → apply against an in-memory workbook.

use httpmock::prelude::*;

use gridpilot_assistant::{apply, extract_context, ModelGateway, Session, RESULTS_SHEET};
use gridpilot_core::CellValue;
use gridpilot_host::{HostDocument, MemoryWorkbook};

fn sample_workbook() -> MemoryWorkbook {
    let mut wb = MemoryWorkbook::new();
    wb.set_cell(0, 0, CellValue::Text("Region".into()));
    wb.set_cell(0, 1, CellValue::Text("Sales".into()));
    wb.set_cell(1, 0, CellValue::Text("North".into()));
    wb.set_cell(1, 1, CellValue::Number(1200.0));
    wb.set_cell(2, 0, CellValue::Text("South".into()));
    wb.set_cell(2, 1, CellValue::Number(900.0));
    wb
}

fn model_reply(server: &MockServer, text: &str) {
    let reply = text.to_string();
    server.mock(move |when, then| {
        when.method(POST).path_includes("generateContent");
        then.status(200).json_body(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": reply}]}}]
        }));
    });
}

#[test]
fn formula_request_lands_in_active_cell() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path_includes("generateContent");
        then.status(200).json_body(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "=SUM(B2:B3)"}]}}]
        }));
    });

    let mut wb = sample_workbook();
    wb.set_cursor("B4").unwrap();

    let mut session = Session::new();
    session.set_prompt("total the sales column");
    session.begin_request();

    let ctx = extract_context(&wb, true).unwrap();
    assert_eq!(ctx.sample_rows.len(), 2); // header row consumed as keys

    let gateway = ModelGateway::with_base_url(server.base_url());
    let result = gateway
        .invoke("key-1", session.prompt(), &ctx, None)
        .unwrap();
    let summary = apply(&mut wb, &result).unwrap();
    session.complete(&summary);

    assert_eq!(wb.cell(3, 1), CellValue::Text("=SUM(B2:B3)".into()));
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].result_summary, "=SUM(B2:B3)");
    assert!(!session.is_loading());
    mock.assert_calls(1);
}

#[test]
fn fenced_array_reply_fills_a_column() {
    let server = MockServer::start();
    model_reply(&server, "```json\n[\"=B2*0.1\",\"=B3*0.1\"]\n```");

    let mut wb = sample_workbook();
    wb.set_cursor("C2").unwrap();

    let ctx = extract_context(&wb, false).unwrap();
    let gateway = ModelGateway::with_base_url(server.base_url());
    let result = gateway.invoke("key-1", "10% commission", &ctx, None).unwrap();
    let summary = apply(&mut wb, &result).unwrap();

    assert_eq!(summary, "[2 values] written to C2:C3");
    assert_eq!(wb.cell(1, 2), CellValue::Text("=B2*0.1".into()));
    assert_eq!(wb.cell(2, 2), CellValue::Text("=B3*0.1".into()));
}

#[test]
fn chart_reply_writes_table_then_chart() {
    let server = MockServer::start();
    model_reply(
        &server,
        r#"{"type":"chart","chartType":"pie","title":"Sales by region",
            "table":[["Region","Sales"],["North","=Sheet1!B2"],["South","=Sheet1!B3"]]}"#,
    );

    let mut wb = sample_workbook();
    let ctx = extract_context(&wb, true).unwrap();
    let gateway = ModelGateway::with_base_url(server.base_url());
    let result = gateway
        .invoke("key-1", "pie chart of sales", &ctx, Some("CREATE_CHART"))
        .unwrap();
    let summary = apply(&mut wb, &result).unwrap();

    assert_eq!(summary, "Created pie chart over AI_Results!A1:B3");
    assert_eq!(
        wb.read_cell(RESULTS_SHEET, "A2").unwrap(),
        CellValue::Text("North".into())
    );
    let charts = wb.charts("Sheet1");
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].title, "Sales by region");
}

#[test]
fn gateway_failure_leaves_session_retryable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_includes("generateContent");
        then.status(403)
            .json_body(serde_json::json!({"error": {"message": "forbidden"}}));
    });

    let wb = sample_workbook();
    let mut session = Session::new();
    session.set_prompt("anything");
    session.begin_request();

    let ctx = extract_context(&wb, false).unwrap();
    let gateway = ModelGateway::with_base_url(server.base_url());
    let err = gateway
        .invoke("bad-key", session.prompt(), &ctx, None)
        .unwrap_err();
    session.fail(&err.to_string());

    assert_eq!(session.error(), Some("model API error (403): forbidden"));
    assert_eq!(session.prompt(), "anything");
    assert!(session.history().is_empty());
    assert!(!session.is_loading());
}

#[test]
fn prose_reply_still_produces_a_result() {
    let server = MockServer::start();
    model_reply(&server, "Sorry, I can only answer with formulas.");

    let mut wb = sample_workbook();
    let ctx = extract_context(&wb, false).unwrap();
    let gateway = ModelGateway::with_base_url(server.base_url());
    // Interpreter never fails: the prose lands as a literal value
    let result = gateway.invoke("k", "??", &ctx, None).unwrap();
    let summary = apply(&mut wb, &result).unwrap();
    assert_eq!(summary, "Sorry, I can only answer with formulas.");
    assert_eq!(
        wb.cell(0, 0),
        CellValue::Text("Sorry, I can only answer with formulas.".into())
    );
}
