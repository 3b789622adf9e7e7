//! HR-side figure aggregation.
//!
//! The HR workbook holds one or more sheets (typically one per population)
//! with a figure column per pipeline stage. Each sheet is read with the
//! first [`HrSheetLayout`] whose name patterns match it.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::calculation::normalize_label;
use crate::config::{ColumnRef, HrLayout, HrSheetLayout};
use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeKey, HrFigure, RunWarning, Sheet, Stage};

use super::keyed::{KeyedSheet, cell_at};

/// Every HR figure for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrRecord {
    /// The employee key.
    pub employee_id: EmployeeKey,
    /// Name from the first row that had one.
    pub name: String,
    /// Rows summed into this record.
    pub rows: u32,
    /// Summed figure per stage; stages the matched layouts lack are absent.
    pub figures: BTreeMap<Stage, HrFigure>,
}

impl HrRecord {
    /// The figure at `stage`, if any sheet carried that stage.
    pub fn figure(&self, stage: Stage) -> Option<&HrFigure> {
        self.figures.get(&stage)
    }
}

/// The outcome of aggregating the HR workbook.
#[derive(Debug, Clone, Default)]
pub struct HrAggregation {
    /// One record per employee key.
    pub records: BTreeMap<EmployeeKey, HrRecord>,
    /// Skipped sheets and duplicate rows.
    pub warnings: Vec<RunWarning>,
    /// Names of the sheets that were read.
    pub sheets_used: Vec<String>,
}

/// Picks the layout for a sheet name: first matching specific layout, then
/// the default.
pub fn layout_for<'a>(sheet_name: &str, layout: &'a HrLayout) -> Option<&'a HrSheetLayout> {
    let name = normalize_label(sheet_name);
    layout
        .sheets
        .iter()
        .find(|candidate| {
            candidate.name_contains.iter().any(|pattern| {
                let pattern = normalize_label(pattern);
                !pattern.is_empty() && name.contains(&pattern)
            })
        })
        .or(layout.default.as_ref())
}

/// Aggregates every usable HR sheet.
///
/// Rows repeating an employee key, within a sheet or across sheets, are
/// summed and counted; each such employee yields a `duplicate_hr_rows`
/// warning. Blank figure cells count as zero.
///
/// # Errors
///
/// Returns [`EngineError::NoUsableSheets`] when no sheet could be read.
pub fn aggregate_hr(
    sheets: &[Sheet],
    layout: &HrLayout,
    scan_rows: usize,
) -> EngineResult<HrAggregation> {
    let mut aggregation = HrAggregation::default();

    for sheet in sheets {
        let Some(sheet_layout) = layout_for(&sheet.name, layout) else {
            let reason = format!("HR sheet '{}' matches no configured layout", sheet.name);
            warn!(sheet = %sheet.name, "Skipping HR sheet with no layout");
            aggregation
                .warnings
                .push(RunWarning::new("sheet_skipped", reason, "medium"));
            continue;
        };

        let stage_labels: Vec<&str> = sheet_layout
            .columns
            .values()
            .flat_map(ColumnRef::labels)
            .collect();
        let Some(keyed) = KeyedSheet::locate(
            sheet,
            &sheet_layout.code,
            &stage_labels,
            sheet_layout.name.as_ref(),
            scan_rows,
        ) else {
            let reason = format!(
                "HR sheet '{}' has no employee-code column in its first {} rows",
                sheet.name, scan_rows
            );
            warn!(sheet = %sheet.name, "Skipping HR sheet without code column");
            aggregation
                .warnings
                .push(RunWarning::new("sheet_skipped", reason, "medium"));
            continue;
        };

        let columns: Vec<(Stage, Option<usize>)> = sheet_layout
            .columns
            .iter()
            .map(|(stage, column)| (*stage, keyed.column(column)))
            .collect();
        for (stage, column) in &columns {
            if column.is_none() {
                debug!(sheet = %sheet.name, stage = %stage, "HR stage column not found");
            }
        }

        for (key, name, row) in keyed.records() {
            let record = aggregation
                .records
                .entry(key.clone())
                .or_insert_with(|| HrRecord {
                    employee_id: key.clone(),
                    name: String::new(),
                    rows: 0,
                    figures: BTreeMap::new(),
                });
            record.rows += 1;
            if record.name.is_empty() {
                record.name = name;
            }

            for (stage, column) in &columns {
                let Some(column) = column else { continue };
                let amount = cell_at(row, Some(*column)).amount().unwrap_or_default();
                record
                    .figures
                    .entry(*stage)
                    .and_modify(|figure| figure.add(amount))
                    .or_insert_with(|| HrFigure::new(key.clone(), amount));
            }
        }

        aggregation.sheets_used.push(sheet.name.clone());
    }

    if aggregation.sheets_used.is_empty() {
        return Err(EngineError::NoUsableSheets {
            role: "hr".to_string(),
            message: format!("none of {} sheet(s) could be read", sheets.len()),
        });
    }

    for record in aggregation.records.values().filter(|r| r.rows > 1) {
        warn!(
            employee_id = %record.employee_id,
            rows = record.rows,
            "Duplicate HR rows summed"
        );
        aggregation.warnings.push(RunWarning::new(
            "duplicate_hr_rows",
            format!(
                "{} HR rows for '{}' were summed",
                record.rows, record.employee_id
            ),
            "medium",
        ));
    }

    Ok(aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnRef;
    use crate::models::text_row;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn key(s: &str) -> EmployeeKey {
        EmployeeKey::new(s).unwrap()
    }

    fn layout() -> HrLayout {
        let staff = HrSheetLayout {
            name_contains: vec!["staff".to_string()],
            code: vec!["Emp Code".to_string(), "Code".to_string()],
            name: Some(ColumnRef::Label("Name".to_string())),
            columns: BTreeMap::from([
                (Stage::Gross, ColumnRef::Header(vec!["Gross Salary".to_string()])),
                (Stage::Register, ColumnRef::Label("Register".to_string())),
            ]),
        };
        let worker = HrSheetLayout {
            name_contains: vec!["worker".to_string()],
            code: vec!["Code".to_string()],
            name: Some(ColumnRef::Index(1)),
            columns: BTreeMap::from([(Stage::Register, ColumnRef::Index(2))]),
        };
        HrLayout {
            sheets: vec![staff, worker],
            default: None,
        }
    }

    fn staff_sheet() -> Sheet {
        Sheet::new(
            "STAFF BONUS 24-25",
            vec![
                text_row(&["Emp Code", "Name", "Gross Salary", "Register"]),
                text_row(&["S1", "Meera", "100000", "8330"]),
                text_row(&["S1", "Meera", "20000", "1666"]),
                text_row(&["S2", "Ravi", "50000", "-"]),
            ],
        )
    }

    #[test]
    fn test_duplicate_rows_sum_and_count() {
        let result = aggregate_hr(&[staff_sheet()], &layout(), 15).unwrap();
        let s1 = &result.records[&key("S1")];
        assert_eq!(s1.rows, 2);
        let register = s1.figure(Stage::Register).unwrap();
        assert_eq!(register.amount, dec("9996"));
        assert_eq!(register.occurrences, 2);
        assert_eq!(s1.figure(Stage::Gross).unwrap().amount, dec("120000"));

        let duplicates: Vec<_> = result
            .warnings
            .iter()
            .filter(|w| w.code == "duplicate_hr_rows")
            .collect();
        assert_eq!(duplicates.len(), 1);
    }

    #[test]
    fn test_blank_figure_counts_as_zero() {
        let result = aggregate_hr(&[staff_sheet()], &layout(), 15).unwrap();
        let s2 = &result.records[&key("S2")];
        assert_eq!(s2.figure(Stage::Register).unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn test_index_columns_and_layout_matching() {
        let worker = Sheet::new(
            "Workers",
            vec![
                text_row(&["Code", "Worker", "Bonus"]),
                text_row(&["W1", "Asha", "4200"]),
            ],
        );
        let result = aggregate_hr(&[staff_sheet(), worker], &layout(), 15).unwrap();
        let w1 = &result.records[&key("W1")];
        assert_eq!(w1.name, "Asha");
        assert_eq!(w1.figure(Stage::Register).unwrap().amount, dec("4200"));
        assert!(w1.figure(Stage::Gross).is_none());
        assert_eq!(result.sheets_used.len(), 2);
    }

    #[test]
    fn test_cross_sheet_duplicates_are_summed() {
        let worker = Sheet::new(
            "Worker Bonus",
            vec![text_row(&["Code", "Name", "Bonus"]), text_row(&["S1", "Meera", "4"])],
        );
        let result = aggregate_hr(&[staff_sheet(), worker], &layout(), 15).unwrap();
        let register = result.records[&key("S1")].figure(Stage::Register).unwrap();
        assert_eq!(register.amount, dec("10000"));
        assert_eq!(register.occurrences, 3);
    }

    #[test]
    fn test_header_found_below_title_naming_the_code() {
        let sheet = Sheet::new(
            "Staff Bonus",
            vec![
                text_row(&["Employee code wise bonus statement"]),
                text_row(&["Emp Code", "Name", "Gross Salary", "Register"]),
                text_row(&["S1", "Meera", "120000", "9996"]),
            ],
        );
        let result = aggregate_hr(&[sheet], &layout(), 15).unwrap();
        let s1 = &result.records[&key("S1")];
        assert_eq!(s1.rows, 1);
        assert_eq!(s1.figure(Stage::Register).unwrap().amount, dec("9996"));
        assert!(!result.records.contains_key(&key("EMP CODE")));
    }

    #[test]
    fn test_unmatched_sheet_skipped_without_default() {
        let notes = Sheet::new("Notes", vec![text_row(&["Code"])]);
        let result = aggregate_hr(&[staff_sheet(), notes], &layout(), 15).unwrap();
        assert!(result.warnings.iter().any(|w| w.message.contains("Notes")));
    }

    #[test]
    fn test_default_layout_used_when_nothing_matches() {
        let mut layout = layout();
        layout.default = layout.sheets.first().cloned();
        let sheet = Sheet::new(
            "Sheet1",
            vec![text_row(&["Code", "Name", "Gross Salary", "Register"]), text_row(&["S9", "X", "1", "2"])],
        );
        let result = aggregate_hr(&[sheet], &layout, 15).unwrap();
        assert!(result.records.contains_key(&key("S9")));
    }

    #[test]
    fn test_no_usable_sheet_is_an_error() {
        let notes = Sheet::new("Notes", vec![text_row(&["Remarks"])]);
        match aggregate_hr(&[notes], &layout(), 15) {
            Err(EngineError::NoUsableSheets { role, .. }) => assert_eq!(role, "hr"),
            other => panic!("Expected NoUsableSheets, got {:?}", other),
        }
    }
}
