//! Assistant core: context extraction → model gateway → response
//! interpretation → result application, plus per-session UI state.
//!
//! The flow for one request:
//! 1. [`context::extract_context`] snapshots the document.
//! 2. [`gateway::ModelGateway::invoke`] sends instruction + context +
//!    prompt and retries transient failures.
//! 3. [`interpret::interpret`] normalizes whatever came back.
//! 4. [`apply::apply`] writes the result into the document.
//! 5. [`session::Session`] records the outcome.

pub mod apply;
pub mod context;
pub mod gateway;
pub mod interpret;
pub mod session;

pub use apply::{apply, chart_consolidated, consolidate_sheets, RESULTS_SHEET};
pub use context::{extract_context, SheetContext, MAX_SAMPLE_ROWS};
pub use gateway::{GatewayError, ModelGateway};
pub use interpret::{interpret, ChartPlan, ChartSource, ModelResult};
pub use session::{HistoryEntry, Session};
