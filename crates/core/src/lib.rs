pub mod addr;
pub mod chart;
pub mod value;

pub use addr::{cell_ref, col_to_letter, letter_to_col, parse_cell_ref, parse_range_ref, range_ref};
pub use chart::ChartKind;
pub use value::CellValue;
