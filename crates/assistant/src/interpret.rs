//! Model response interpretation.
//!
//! The model is not a trusted structured-output source: it may answer
//! with a bare formula, a JSON array, fenced JSON, raw JSON, or prose
//! around any of those. Interpretation is an ordered chain of shape
//! probes, most specific first, and always lands somewhere — the final
//! fallback treats the whole reply as a literal cell entry, so a parse
//! failure can never strand the user without a result.

use serde_json::{Map, Value};

use gridpilot_core::ChartKind;

/// Title used when the model names none.
pub const DEFAULT_CHART_TITLE: &str = "Generated Chart";

/// The normalized outcome of one inference call. Exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResult {
    /// One literal value or formula string.
    Single(String),
    /// Applied vertically starting at the current selection.
    Array(Vec<String>),
    /// A chart to create, possibly after writing a summary table.
    Chart(ChartPlan),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub title: String,
    pub source: ChartSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSource {
    /// Chart over an existing range.
    Range(String),
    /// Header + data/formula rows to write first, then chart.
    Table(Vec<Vec<String>>),
}

/// Interpret raw model output. Never fails.
pub fn interpret(raw: &str) -> ModelResult {
    let trimmed = raw.trim();

    let candidate = extract_fenced(trimmed).or_else(|| extract_bracketed(trimmed));
    if let Some(candidate) = candidate {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if let Some(result) = normalize(&value) {
                return result;
            }
        }
    }

    // Plain-formula answers ("=SUM(A1:A10)") and everything unparseable
    // land here.
    ModelResult::Single(trimmed.to_string())
}

/// Inner content of the first triple-backtick block, tag line dropped.
fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // The rest of the fence line is a tag ("json") or empty; skip it
    let body = &after[after.find('\n')? + 1..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Slice from the first opening brace/bracket to the last matching
/// closing one, across the whole text.
fn extract_bracketed(text: &str) -> Option<&str> {
    let brace = text.find('{');
    let bracket = text.find('[');
    let (open, close) = match (brace, bracket) {
        (Some(b), Some(k)) => {
            if k < b {
                (k, ']')
            } else {
                (b, '}')
            }
        }
        (Some(b), None) => (b, '}'),
        (None, Some(k)) => (k, ']'),
        (None, None) => return None,
    };
    let end = text.rfind(close)?;
    if end <= open {
        return None;
    }
    Some(&text[open..=end])
}

/// Ordered shape probes over parsed JSON. `None` means "valid JSON but
/// no recognizable shape" and defers to the literal fallback.
fn normalize(value: &Value) -> Option<ModelResult> {
    if let Some(items) = value.as_array() {
        return Some(ModelResult::Array(items.iter().map(stringify).collect()));
    }

    let obj = value.as_object()?;

    if obj.get("type").and_then(Value::as_str) == Some("chart") {
        return chart_plan(obj).map(ModelResult::Chart);
    }

    if let Some(items) = obj.get("values").and_then(Value::as_array) {
        return Some(ModelResult::Array(items.iter().map(stringify).collect()));
    }

    if let Some(value) = obj.get("value") {
        return Some(ModelResult::Single(stringify(value)));
    }

    None
}

/// Build a chart plan from a chart-typed object. Nested `chartData.*`
/// fields win over top-level ones. A plan without any source (range or
/// table) is unusable and defers to the literal fallback.
fn chart_plan(obj: &Map<String, Value>) -> Option<ChartPlan> {
    let nested = obj.get("chartData").and_then(Value::as_object);
    let pick = |key: &str| nested.and_then(|n| n.get(key)).or_else(|| obj.get(key));

    // The envelope's own "type" is "chart"; the kind lives in the nested
    // "type" or a top-level "chartType".
    let kind = nested
        .and_then(|n| n.get("type"))
        .or_else(|| nested.and_then(|n| n.get("chartType")))
        .or_else(|| obj.get("chartType"))
        .and_then(Value::as_str)
        .map(ChartKind::parse)
        .unwrap_or_default();

    let title = pick("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_CHART_TITLE.to_string());

    let source = if let Some(table) = pick("table").and_then(Value::as_array) {
        ChartSource::Table(
            table
                .iter()
                .map(|row| match row.as_array() {
                    Some(cells) => cells.iter().map(stringify).collect(),
                    None => vec![stringify(row)],
                })
                .collect(),
        )
    } else if let Some(range) = pick("range").and_then(Value::as_str) {
        ChartSource::Range(range.to_string())
    } else {
        return None;
    };

    Some(ChartPlan { kind, title, source })
}

/// JSON scalar to cell-entry string. Strings pass through unquoted.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
