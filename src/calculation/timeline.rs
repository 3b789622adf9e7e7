//! Employee timeline construction.
//!
//! Folds the month sheets of a salary workbook into one [`MonthlyTimeline`]
//! per employee. Sheets are located first (month from the tab name, header
//! row, columns), then reduced one at a time by [`fold_sheet`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::config::SalaryLayout;
use crate::models::{
    CellValue, EmployeeKey, MonthKey, MonthWindow, MonthlyTimeline, RunWarning, Sheet,
};

use super::sheet_locator::{find_column, find_header_row, month_key_from_sheet_name};

/// Column positions of a located salary sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryColumns {
    /// Employee code, when the sheet has one.
    pub code: Option<usize>,
    /// Employee name.
    pub name: usize,
    /// Department code.
    pub department: Option<usize>,
    /// Joining date.
    pub date_of_joining: Option<usize>,
    /// Monthly salary.
    pub amount: usize,
}

/// A salary sheet whose month, header row and columns are known.
#[derive(Debug, Clone)]
pub struct LocatedSheet<'a> {
    /// The tab name.
    pub name: &'a str,
    /// The month the sheet covers.
    pub month: MonthKey,
    /// Index of the header row; data starts on the next row.
    pub header_row: usize,
    /// Column positions.
    pub columns: SalaryColumns,
    /// The full row grid.
    pub rows: &'a [Vec<CellValue>],
    /// Normalized department codes whose rows are dropped.
    pub excluded_departments: &'a BTreeSet<String>,
}

/// The outcome of building timelines for one salary workbook.
#[derive(Debug, Clone, Default)]
pub struct TimelineBuild {
    /// One timeline per employee key.
    pub timelines: BTreeMap<EmployeeKey, MonthlyTimeline>,
    /// Skipped sheets.
    pub warnings: Vec<RunWarning>,
    /// Names of the sheets that were folded, in order.
    pub sheets_used: Vec<String>,
}

/// Why a sheet was not folded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SheetSkip {
    /// Expected and silent: the sheet is outside the averaging window.
    OutOfWindow(MonthKey),
    /// Reported: the sheet should have been usable.
    Unusable(String),
}

fn cell_text(row: &[CellValue], col: Option<usize>) -> String {
    col.and_then(|c| row.get(c))
        .map(|cell| cell.text().trim().to_string())
        .unwrap_or_default()
}

fn locate_sheet<'a>(
    sheet: &'a Sheet,
    layout: &SalaryLayout,
    window: &MonthWindow,
    excluded_months: &[MonthKey],
    excluded_departments: &'a BTreeSet<String>,
    scan_rows: usize,
) -> Result<LocatedSheet<'a>, SheetSkip> {
    let month = month_key_from_sheet_name(&sheet.name).ok_or_else(|| {
        SheetSkip::Unusable(format!("no month could be read from sheet name '{}'", sheet.name))
    })?;

    if !window.contains(month) || excluded_months.contains(&month) {
        return Err(SheetSkip::OutOfWindow(month));
    }

    let header_row = find_header_row(&sheet.rows, &layout.header_labels, scan_rows)
        .ok_or_else(|| {
            SheetSkip::Unusable(format!(
                "no header row in the first {} rows of sheet '{}'",
                scan_rows, sheet.name
            ))
        })?;
    let header = &sheet.rows[header_row];

    let missing = |what: &str| {
        SheetSkip::Unusable(format!("sheet '{}' has no {} column", sheet.name, what))
    };
    let columns = SalaryColumns {
        code: find_column(header, &layout.code),
        name: find_column(header, &layout.name).ok_or_else(|| missing("name"))?,
        department: find_column(header, &layout.department),
        date_of_joining: find_column(header, &layout.date_of_joining),
        amount: find_column(header, &layout.amount).ok_or_else(|| missing("amount"))?,
    };

    Ok(LocatedSheet {
        name: &sheet.name,
        month,
        header_row,
        columns,
        rows: &sheet.rows,
        excluded_departments,
    })
}

/// Folds one located sheet into the timelines.
///
/// Rows with no amount, a blank name, or a name containing `TOTAL` are
/// ignored, as are rows from an excluded department. Repeated rows for the
/// same employee and month are summed, so the result does not depend on the
/// order sheets or rows are folded in.
pub fn fold_sheet(
    mut timelines: BTreeMap<EmployeeKey, MonthlyTimeline>,
    sheet: &LocatedSheet<'_>,
) -> BTreeMap<EmployeeKey, MonthlyTimeline> {
    let columns = sheet.columns;

    for row in sheet.rows.iter().skip(sheet.header_row + 1) {
        let name = cell_text(row, Some(columns.name));
        if name.is_empty() || name.to_uppercase().contains("TOTAL") {
            continue;
        }
        let Some(amount) = row.get(columns.amount).and_then(CellValue::amount) else {
            continue;
        };

        let department = cell_text(row, columns.department);
        if sheet
            .excluded_departments
            .contains(&department.to_uppercase())
        {
            continue;
        }

        let code = cell_text(row, columns.code);
        let Some(key) = EmployeeKey::from_code_or_name(&code, &name) else {
            continue;
        };

        let timeline = timelines
            .entry(key.clone())
            .or_insert_with(|| MonthlyTimeline::new(key));
        if timeline.name.is_empty() {
            timeline.name = name;
        }
        if timeline.department.is_empty() {
            timeline.department = department;
        }
        if timeline.date_of_joining.is_blank() {
            if let Some(doj) = columns.date_of_joining.and_then(|c| row.get(c)) {
                timeline.date_of_joining = doj.clone();
            }
        }
        let total = timeline.months.entry(sheet.month).or_default();
        *total = total.saturating_add(amount);
    }

    timelines
}

/// Builds the timelines of one salary workbook.
///
/// Only sheets whose month falls inside `window` and is not in
/// `excluded_months` are folded; the projected month is never read. Sheets
/// whose month or header cannot be located are skipped and reported.
pub fn build_timelines(
    sheets: &[Sheet],
    layout: &SalaryLayout,
    window: &MonthWindow,
    excluded_months: &[MonthKey],
    excluded_departments: &BTreeSet<String>,
    scan_rows: usize,
) -> TimelineBuild {
    let mut build = TimelineBuild::default();

    for sheet in sheets {
        match locate_sheet(
            sheet,
            layout,
            window,
            excluded_months,
            excluded_departments,
            scan_rows,
        ) {
            Ok(located) => {
                debug!(sheet = %sheet.name, month = %located.month, "Folding salary sheet");
                let timelines = std::mem::take(&mut build.timelines);
                build.timelines = fold_sheet(timelines, &located);
                build.sheets_used.push(sheet.name.clone());
            }
            Err(SheetSkip::OutOfWindow(month)) => {
                debug!(sheet = %sheet.name, month = %month, "Sheet outside averaging window");
            }
            Err(SheetSkip::Unusable(reason)) => {
                warn!(sheet = %sheet.name, reason = %reason, "Skipping salary sheet");
                build
                    .warnings
                    .push(RunWarning::new("sheet_skipped", reason, "medium"));
            }
        }
    }

    build
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::text_row;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn layout() -> SalaryLayout {
        let labels = |l: &[&str]| l.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        SalaryLayout {
            header_labels: vec![labels(&["Code", "Name"])],
            code: labels(&["Emp Code", "Code"]),
            name: labels(&["Employee Name", "Name"]),
            department: labels(&["Department"]),
            date_of_joining: labels(&["Date of Joining"]),
            amount: labels(&["Gross Salary", "Gross"]),
        }
    }

    fn window() -> MonthWindow {
        MonthWindow::new(month("2024-11"), 11)
    }

    fn salary_sheet(name: &str, rows: &[&[&str]]) -> Sheet {
        let mut grid = vec![
            text_row(&["ACME Industries"]),
            text_row(&["Emp Code", "Employee Name", "Department", "Date of Joining", "Gross Salary"]),
        ];
        grid.extend(rows.iter().map(|r| text_row(r)));
        Sheet::new(name, grid)
    }

    fn build(sheets: &[Sheet], excluded: &BTreeSet<String>) -> TimelineBuild {
        build_timelines(sheets, &layout(), &window(), &[], excluded, 15)
    }

    #[test]
    fn test_duplicate_rows_in_a_month_are_summed() {
        let sheets = vec![salary_sheet(
            "Nov-24",
            &[
                &["S1", "Meera", "ACC", "2020-01-01", "30,000"],
                &["s1", "Meera", "ACC", "", "5000"],
            ],
        )];

        let result = build(&sheets, &BTreeSet::new());
        let timeline = &result.timelines[&EmployeeKey::new("S1").unwrap()];
        assert_eq!(timeline.amount(month("2024-11")), Some(dec("35000")));
        assert_eq!(timeline.department, "ACC");
        assert_eq!(timeline.date_of_joining, CellValue::from("2020-01-01"));
    }

    #[test]
    fn test_total_blank_name_and_absent_amount_rows_are_ignored() {
        let sheets = vec![salary_sheet(
            "Dec-24",
            &[
                &["S1", "Meera", "ACC", "", "30000"],
                &["S2", "", "ACC", "", "1000"],
                &["S3", "Ravi", "ACC", "", "-"],
                &["", "Grand Total", "", "", "31000"],
            ],
        )];

        let result = build(&sheets, &BTreeSet::new());
        assert_eq!(result.timelines.len(), 1);
        assert!(result.timelines.contains_key(&EmployeeKey::new("S1").unwrap()));
    }

    #[test]
    fn test_name_used_when_code_is_blank() {
        let sheets = vec![salary_sheet("Jan-25", &[&["", " asha rao ", "PACK", "", "900"]])];
        let result = build(&sheets, &BTreeSet::new());
        assert!(result.timelines.contains_key(&EmployeeKey::new("ASHA RAO").unwrap()));
    }

    #[test]
    fn test_excluded_department_rows_are_dropped() {
        let sheets = vec![salary_sheet(
            "Jan-25",
            &[&["W1", "Ravi", "contract", "", "900"], &["W2", "Asha", "PACK", "", "900"]],
        )];
        let excluded = BTreeSet::from(["CONTRACT".to_string()]);

        let result = build(&sheets, &excluded);
        assert_eq!(result.timelines.len(), 1);
        assert!(result.timelines.contains_key(&EmployeeKey::new("W2").unwrap()));
    }

    #[test]
    fn test_projected_and_unnamed_sheets_are_not_read() {
        let sheets = vec![
            salary_sheet("Sep-25", &[&["S1", "Meera", "ACC", "", "100"]]),
            salary_sheet("Oct-25", &[&["S1", "Meera", "ACC", "", "999"]]),
            salary_sheet("Summary", &[&["S1", "Meera", "ACC", "", "999"]]),
        ];

        let result = build(&sheets, &BTreeSet::new());
        let timeline = &result.timelines[&EmployeeKey::new("S1").unwrap()];
        assert_eq!(timeline.months.len(), 1);
        assert_eq!(timeline.amount(month("2025-09")), Some(dec("100")));
        assert_eq!(result.sheets_used, vec!["Sep-25".to_string()]);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, "sheet_skipped");
    }

    #[test]
    fn test_sheet_without_header_is_skipped_not_zeroed() {
        let sheets = vec![
            Sheet::new("Feb-25", vec![text_row(&["nothing", "useful"])]),
            salary_sheet("Mar-25", &[&["S1", "Meera", "ACC", "", "100"]]),
        ];

        let result = build(&sheets, &BTreeSet::new());
        let timeline = &result.timelines[&EmployeeKey::new("S1").unwrap()];
        assert_eq!(timeline.amount(month("2025-02")), None);
        assert!(result.warnings[0].message.contains("Feb-25"));
    }

    #[test]
    fn test_fold_order_does_not_change_totals() {
        let a = salary_sheet("Nov-24", &[&["S1", "Meera", "ACC", "", "100"]]);
        let b = salary_sheet("Nov 2024 (2)", &[&["S1", "Meera", "ACC", "", "50"]]);

        let forward = build(&[a.clone(), b.clone()], &BTreeSet::new());
        let backward = build(&[b, a], &BTreeSet::new());
        assert_eq!(forward.timelines, backward.timelines);
    }
}
