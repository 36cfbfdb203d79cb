//! Model gateway.
//!
//! Builds one inference request from the fixed system instruction, the
//! extracted context, an optional intent hint, and the user prompt, then
//! POSTs it to the generateContent endpoint with the credential as a
//! query parameter. Blocking reqwest, no Tokio runtime required.
//!
//! Retry policy: 3 attempts total, retrying only HTTP 404 and 429 with a
//! linear backoff of attempt * 3000 ms. Everything else fails on first
//! sight. No request timeout is applied beyond the retry policy.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::SheetContext;
use crate::interpret::{interpret, ModelResult};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_UNIT_MS: u64 = 3000;

const SYSTEM_INSTRUCTION: &str = r#"You are a spreadsheet expert. Return ONLY a formula or JSON data, NO explanations.

OUTPUT CONTRACT (mandatory):
1. FORMULA ONLY: if the answer is a single formula, return it directly. Example: =SUM(A1:A10)
2. JSON ARRAY: if the request has several parts or the answer spans several rows, return a JSON array of strings. Example: ["=FILTER(A1:B10,(A1:A10>10))", "", "=SUM(B1:B10)"]. Each element is written downward into consecutive cells.
3. CHART: if the user asks for a chart, return a JSON object: {"type":"chart","chartType":"pie|column|line","range":"A1:B5","title":"..."}. When the chart needs a summary table first, replace "range" with "table": [["Header1","Header2"],["Label","=FORMULA_OR_VALUE"]].

FORMULA RULES:
1. Use concrete ranges (A1:A10), NEVER whole columns (A:A).
2. FILTER: =FILTER(range_to_return, condition). Always add (condition_range<>"") to skip blank cells.
3. NO COMMENTARY: never prepend text like "Here is the formula". Extra text breaks the result.

Read the data sample carefully to pick exact cell addresses."#;

/// Error type for gateway operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Non-retryable HTTP failure, message from the body when present
    Http { status: u16, message: String },
    /// All attempts exhausted on retryable statuses (404/429)
    Exhausted,
    /// 2xx response with no model text at the expected path
    EmptyResponse,
    /// Transport failure (DNS, TLS, connection reset)
    Network(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::Http { status, message } => {
                write!(f, "model API error ({}): {}", status, message)
            }
            GatewayError::Exhausted => {
                write!(f, "could not reach the model API after {} attempts", MAX_ATTEMPTS)
            }
            GatewayError::EmptyResponse => write!(f, "the model returned no text"),
            GatewayError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

// ── Gateway ─────────────────────────────────────────────────────────

/// Model API client. No state is retained between calls.
pub struct ModelGateway {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    backoff_unit: Duration,
}

impl Default for ModelGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGateway {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a different endpoint (tests, regional proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            backoff_unit: Duration::from_millis(BACKOFF_UNIT_MS),
        }
    }

    /// Override the model id (empty keeps the default).
    pub fn with_model(mut self, model: &str) -> Self {
        if !model.trim().is_empty() {
            self.model = model.trim().to_string();
        }
        self
    }

    /// One inference call: compose, send with retry, extract, interpret.
    pub fn invoke(
        &self,
        api_key: &str,
        prompt: &str,
        context: &SheetContext,
        intent_hint: Option<&str>,
    ) -> Result<ModelResult, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: compose_prompt(prompt, context, intent_hint),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 2048,
                // Intent-hinted requests expect a structured reply shape
                response_mime_type: intent_hint.map(|_| "application/json".to_string()),
            },
        };

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .http
                .post(&url)
                .json(&body)
                .send()
                .map_err(|e| GatewayError::Network(e.to_string()))?;

            let status = response.status().as_u16();

            if !(200..300).contains(&status) {
                if status == 404 || status == 429 {
                    if attempt < MAX_ATTEMPTS {
                        thread::sleep(self.backoff_delay(attempt));
                        continue;
                    }
                    return Err(GatewayError::Exhausted);
                }
                let body: Value = response.json().unwrap_or(Value::Null);
                let message = body
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status));
                return Err(GatewayError::Http { status, message });
            }

            // Fixed response path: candidates[0].content.parts[0].text.
            // Anything that doesn't deserialize has no text there either.
            let parsed: GenerateResponse = match response.json() {
                Ok(parsed) => parsed,
                Err(_) => return Err(GatewayError::EmptyResponse),
            };
            let text = parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .and_then(|c| c.parts.into_iter().next())
                .and_then(|p| p.text)
                .unwrap_or_default();
            if text.trim().is_empty() {
                return Err(GatewayError::EmptyResponse);
            }
            return Ok(interpret(&text));
        }

        Err(GatewayError::Exhausted)
    }

    /// Linear backoff: attempt 1 waits one unit, attempt 2 waits two.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Compose the single request text: instruction, context, hint, request.
fn compose_prompt(prompt: &str, context: &SheetContext, intent_hint: Option<&str>) -> String {
    let mut text = String::with_capacity(SYSTEM_INSTRUCTION.len() + 512);
    text.push_str(SYSTEM_INSTRUCTION);
    text.push_str("\n\nCONTEXT:\n");
    text.push_str(&format!("- Used range: {}\n", context.used_range_address));
    text.push_str(&format!("- Active cell: {}\n", context.active_cell_address));
    if !context.sheet_names.is_empty() {
        text.push_str(&format!("- Sheets: {}\n", context.sheet_names.join(", ")));
    }
    text.push_str(&format!("- Data sample (JSON): {}\n", context.sample_json()));
    if let Some(hint) = intent_hint {
        text.push_str(&format!("\nINTENT: {}\n", hint));
    }
    text.push_str(&format!("\nREQUEST: {}", prompt));
    text
}
