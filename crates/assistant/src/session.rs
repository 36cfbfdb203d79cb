// Session state
//
// One explicit object per assistant session, passed by reference into
// handlers — no process-wide singleton. Lifecycle: init on load, clear
// on explicit reset. Nothing here is persisted; the credential's
// durable storage lives in gridpilot-config.

use chrono::{DateTime, Utc};

/// One completed request, kept for the session lifetime.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub prompt: String,
    pub result_summary: String,
    pub timestamp: DateTime<Utc>,
}

/// Transient UI state for one assistant session.
#[derive(Debug, Default)]
pub struct Session {
    prompt: String,
    loading: bool,
    error: Option<String>,
    history: Vec<HistoryEntry>,
    credential: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Set the in-memory credential. Non-empty is the only validation.
    /// Returns false (and leaves state untouched) for a blank key.
    pub fn set_credential(&mut self, key: &str) -> bool {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.credential = Some(trimmed.to_string());
        true
    }

    pub fn eject_credential(&mut self) {
        self.credential = None;
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// A request is going out: raise the loading flag, clear stale error.
    pub fn begin_request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Request succeeded: record history, drop the loading flag. The
    /// prompt stays so the user can refine it.
    pub fn complete(&mut self, result_summary: &str) {
        self.history.push(HistoryEntry {
            prompt: self.prompt.clone(),
            result_summary: result_summary.to_string(),
            timestamp: Utc::now(),
        });
        self.loading = false;
    }

    /// Request failed: surface the message, drop the loading flag.
    /// Prompt and history stay untouched so the user can retry.
    pub fn fail(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.loading = false;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Explicit reset: everything except the credential.
    pub fn reset(&mut self) {
        self.prompt.clear();
        self.loading = false;
        self.error = None;
        self.history.clear();
    }
}
