//! Host document seam.
//!
//! The assistant core never talks to a spreadsheet application directly;
//! it goes through [`HostDocument`]. A host adapter (Office add-in
//! bridge, session server, ...) implements the trait; [`MemoryWorkbook`]
//! is the in-memory implementation used by the CLI and the test suite.

pub mod memory;

pub use memory::MemoryWorkbook;

use gridpilot_core::{CellValue, ChartKind};

/// Error type for host document operations.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// Document state could not be read (no active sheet, no used range)
    Access(String),
    /// A mutation was rejected by the host (bad address, protected sheet)
    Write(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Access(msg) => write!(f, "cannot read document: {}", msg),
            HostError::Write(msg) => write!(f, "write rejected: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

/// How a block of strings is written: as literal values or as formulas.
///
/// Hosts write a block uniformly in one mode; per-cell mixing is not part
/// of the contract. The caller decides the mode for the whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Values,
    Formulas,
}

/// Legend placement on a created chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Legend {
    #[default]
    Right,
    Bottom,
    Hidden,
}

/// A chart creation request handed to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Source range address, possibly sheet-qualified ("AI_Results!A1:B5")
    pub source_range: String,
    pub title: String,
    pub legend: Legend,
}

/// Snapshot of the active sheet's used region.
#[derive(Debug, Clone)]
pub struct UsedRange {
    /// A1 address of the full used region ("A1" for an empty sheet)
    pub address: String,
    /// Row-major values; empty when the sheet has no content
    pub values: Vec<Vec<CellValue>>,
}

/// The operations the assistant needs from a host spreadsheet.
///
/// Every method is one document round-trip on a real host. Reads are kept
/// separate and sequential on purpose: round-trip ordering matters for
/// some hosts, and batching belongs in the adapter, not the core.
pub trait HostDocument {
    /// Used region of the active sheet: values plus address.
    fn used_range(&self) -> Result<UsedRange, HostError>;

    /// A1 address of the current selection anchor.
    fn active_cell(&self) -> Result<String, HostError>;

    /// All sheet names, in document order.
    fn sheet_names(&self) -> Result<Vec<String>, HostError>;

    /// Write one value into the currently selected cell.
    fn write_active_cell(&mut self, value: &str, mode: WriteMode) -> Result<(), HostError>;

    /// Write a vertical block anchored at the current selection,
    /// expanding it downward to fit. Returns the written range address.
    fn write_column(&mut self, values: &[String], mode: WriteMode) -> Result<String, HostError>;

    /// Write a 2-D table into the named sheet (created if missing,
    /// cleared first), anchored at A1. Cells beginning with '=' are
    /// written as formulas. Returns the sheet-qualified range address.
    fn write_table(&mut self, sheet: &str, rows: &[Vec<String>]) -> Result<String, HostError>;

    /// Read a single cell of a named sheet.
    fn read_cell(&self, sheet: &str, addr: &str) -> Result<CellValue, HostError>;

    /// Create a chart over the given source range.
    fn add_chart(&mut self, chart: &ChartSpec) -> Result<(), HostError>;
}
