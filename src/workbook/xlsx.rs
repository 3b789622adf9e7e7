//! Spreadsheet decoding with calamine.

use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{CellValue, Sheet, Workbook};

use super::WorkbookSource;

/// Decodes `.xlsx`, `.xls`, `.xlsb` and `.ods` files.
///
/// Cells keep their absolute positions: when a sheet's used range starts
/// below or right of A1, the grid is padded so row and column indices match
/// the spreadsheet. Dates arrive as Excel serial numbers, formulas as their
/// cached values.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxSource;

fn convert(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

impl WorkbookSource for XlsxSource {
    fn load(&self, path: &Path) -> EngineResult<Workbook> {
        let path_str = path.display().to_string();
        let read_error = |message: String| EngineError::WorkbookRead {
            path: path_str.clone(),
            message,
        };

        let mut workbook: Sheets<_> =
            open_workbook_auto(path).map_err(|e| read_error(e.to_string()))?;
        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in &sheet_names {
            let range = workbook
                .worksheet_range(sheet_name)
                .map_err(|e| read_error(format!("sheet '{}': {}", sheet_name, e)))?;

            // Range start offset (data may not begin at A1)
            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
            for row in range.rows() {
                let mut cells = vec![CellValue::Empty; start_col as usize];
                cells.extend(row.iter().map(convert));
                rows.push(cells);
            }

            debug!(sheet = %sheet_name, rows = rows.len(), "Decoded worksheet");
            sheets.push(Sheet::new(sheet_name.clone(), rows));
        }

        Ok(Workbook::new(sheets))
    }
}
