//! Sheets keyed by an employee-code column.
//!
//! The HR workbook, the ledgers and the override workbook share one shape:
//! a header row holding an employee-code column, then one row per entry.

use crate::calculation::{find_column, find_header_row, resolve_column};
use crate::config::ColumnRef;
use crate::models::{CellValue, EmployeeKey, Sheet};

/// A sheet whose header row and code column were found.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyedSheet<'a> {
    pub name: &'a str,
    pub header_row: usize,
    pub code_column: usize,
    pub name_column: Option<usize>,
    rows: &'a [Vec<CellValue>],
}

impl<'a> KeyedSheet<'a> {
    /// Locates the header row: a code label plus at least one of the
    /// companion labels. Without companions the code label alone is enough.
    pub fn locate(
        sheet: &'a Sheet,
        code_labels: &[String],
        companions: &[&str],
        name: Option<&ColumnRef>,
        scan_rows: usize,
    ) -> Option<Self> {
        let candidate_sets: Vec<Vec<String>> = if companions.is_empty() {
            code_labels.iter().map(|label| vec![label.clone()]).collect()
        } else {
            code_labels
                .iter()
                .flat_map(|code| {
                    companions
                        .iter()
                        .map(move |companion| vec![code.clone(), companion.to_string()])
                })
                .collect()
        };
        let header_row = find_header_row(&sheet.rows, &candidate_sets, scan_rows)?;
        let header = &sheet.rows[header_row];
        let code_column = find_column(header, code_labels)?;

        Some(Self {
            name: &sheet.name,
            header_row,
            code_column,
            name_column: name.and_then(|column| resolve_column(header, column)),
            rows: &sheet.rows,
        })
    }

    /// The header row cells.
    pub fn header(&self) -> &'a [CellValue] {
        &self.rows[self.header_row]
    }

    /// Resolves another column against the header row.
    pub fn column(&self, column: &ColumnRef) -> Option<usize> {
        resolve_column(self.header(), column)
    }

    /// Data rows with their employee key and display name.
    ///
    /// Rows with neither a code nor a name, and total rows, are skipped.
    pub fn records(self) -> impl Iterator<Item = (EmployeeKey, String, &'a [CellValue])> {
        self.rows
            .iter()
            .skip(self.header_row + 1)
            .filter_map(move |row| {
                let text = |col: Option<usize>| {
                    col.and_then(|c| row.get(c))
                        .map(|cell| cell.text().trim().to_string())
                        .unwrap_or_default()
                };
                let code = text(Some(self.code_column));
                let name = text(self.name_column);
                if code.to_uppercase().contains("TOTAL") || name.to_uppercase().contains("TOTAL") {
                    return None;
                }
                let key = EmployeeKey::from_code_or_name(&code, &name)?;
                Some((key, name, row.as_slice()))
            })
    }
}

/// Reads a cell of `row`, or an empty cell when the column is absent.
pub(crate) fn cell_at(row: &[CellValue], column: Option<usize>) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    column.and_then(|c| row.get(c)).unwrap_or(&EMPTY)
}
