//! Workbook and worksheet models.
//!
//! This is the engine's view of a decoded spreadsheet: an ordered list of
//! named sheets, each a 2-D grid of [`CellValue`]s. Rows may be ragged.

use serde::{Deserialize, Serialize};

use super::CellValue;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A single worksheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    /// The worksheet name as shown on its tab.
    pub name: String,
    /// Cell grid, row-major, zero-based.
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Creates a sheet from a name and a row grid.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Returns the cell at `(row, col)`, or an empty cell outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// An ordered collection of worksheets.
///
/// # Example
///
/// ```
/// use bonus_recon::models::{CellValue, Sheet, Workbook};
///
/// let workbook = Workbook::new(vec![Sheet::new(
///     "Nov-24",
///     vec![vec![CellValue::from("Code"), CellValue::from("Gross")]],
/// )]);
/// assert_eq!(workbook.sheet_names(), vec!["Nov-24"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    /// Sheets in tab order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Creates a workbook from its sheets.
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Returns the sheet names in tab order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Helpers for building cell grids in tests and benchmarks.
#[cfg(test)]
pub(crate) fn text_row(cells: &[&str]) -> Vec<CellValue> {
    cells.iter().map(|c| CellValue::from(*c)).collect()
}
