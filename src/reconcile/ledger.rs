//! External ledgers and the override workbook.
//!
//! The due ledger supplies unpaid amounts, payment statuses and the
//! percentage actually applied; the loan ledger supplies deductions; an
//! optional ledger supplies amounts already paid. The override workbook
//! supplies custom percentages and averaging start months.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::calculation::{PaymentStatus, month_key_from_sheet_name};
use crate::config::{ColumnRef, LedgerLayout, OverrideSheetLayout, OverrideTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{CellValue, EmployeeKey, MonthKey, RunWarning, Sheet};

use super::keyed::{KeyedSheet, cell_at};

/// One employee's entries on a ledger, summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// The employee key.
    pub employee_id: EmployeeKey,
    /// Sum of the amount column.
    pub amount: Decimal,
    /// Rows summed.
    pub occurrences: u32,
    /// First non-empty payment status.
    pub status: Option<PaymentStatus>,
    /// First non-empty applied percentage.
    pub percentage: Option<Decimal>,
    /// Sum of the already-paid column, when the ledger has one.
    pub already_paid: Decimal,
}

impl LedgerEntry {
    fn new(employee_id: EmployeeKey) -> Self {
        Self {
            employee_id,
            amount: Decimal::ZERO,
            occurrences: 0,
            status: None,
            percentage: None,
            already_paid: Decimal::ZERO,
        }
    }
}

/// The outcome of aggregating one ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerAggregation {
    /// One entry per employee key.
    pub entries: BTreeMap<EmployeeKey, LedgerEntry>,
    /// Skipped sheets.
    pub warnings: Vec<RunWarning>,
}

impl LedgerAggregation {
    /// The entry for `key`, if the employee is on the ledger.
    pub fn entry(&self, key: &EmployeeKey) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// The summed amount for `key`, zero when absent.
    pub fn amount(&self, key: &EmployeeKey) -> Decimal {
        self.entry(key).map(|e| e.amount).unwrap_or_default()
    }
}

/// Reads a percentage cell.
///
/// Accepts `12`, `"12%"`, and spreadsheet fractions such as `0.12`. A value
/// of 1 or less without a `%` sign is taken as a fraction.
///
/// # Example
///
/// ```
/// use bonus_recon::models::CellValue;
/// use bonus_recon::reconcile::parse_percentage;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_percentage(&CellValue::from("8.33%")), Some(Decimal::new(833, 2)));
/// assert_eq!(parse_percentage(&CellValue::Number(0.12)), Some(Decimal::new(12, 0)));
/// assert_eq!(parse_percentage(&CellValue::Empty), None);
/// ```
pub fn parse_percentage(cell: &CellValue) -> Option<Decimal> {
    let (value, explicit) = match cell.amount() {
        Some(value) => (value, false),
        None => {
            let text = cell.text();
            let bare = text.trim().strip_suffix('%')?;
            (CellValue::from(bare).amount()?, true)
        }
    };
    let value = if !explicit && value.abs() <= Decimal::ONE {
        value * Decimal::ONE_HUNDRED
    } else {
        value
    };
    Some(value.normalize())
}

/// Aggregates one ledger workbook.
///
/// # Errors
///
/// Returns [`EngineError::NoUsableSheets`] for `role` when no sheet has both
/// the code and the amount column.
pub fn aggregate_ledger(
    sheets: &[Sheet],
    layout: &LedgerLayout,
    role: &str,
    scan_rows: usize,
) -> EngineResult<LedgerAggregation> {
    let mut aggregation = LedgerAggregation::default();
    let mut used = 0usize;

    for sheet in sheets {
        let located = KeyedSheet::locate(
            sheet,
            &layout.code,
            &layout.amount.labels(),
            layout.name.as_ref(),
            scan_rows,
        )
            .and_then(|keyed| keyed.column(&layout.amount).map(|amount| (keyed, amount)));
        let Some((keyed, amount_column)) = located else {
            warn!(role = role, sheet = %sheet.name, "Skipping ledger sheet without code or amount column");
            aggregation.warnings.push(RunWarning::new(
                "sheet_skipped",
                format!("{} sheet '{}' has no code or amount column", role, sheet.name),
                "medium",
            ));
            continue;
        };

        let status_column = layout.status.as_ref().and_then(|c| keyed.column(c));
        let percentage_column = layout.percentage.as_ref().and_then(|c| keyed.column(c));
        let paid_column = layout.already_paid.as_ref().and_then(|c| keyed.column(c));

        for (key, _, row) in keyed.records() {
            let entry = aggregation
                .entries
                .entry(key.clone())
                .or_insert_with(|| LedgerEntry::new(key));
            entry.occurrences += 1;
            entry.amount = entry
                .amount
                .saturating_add(cell_at(row, Some(amount_column)).amount().unwrap_or_default());
            entry.already_paid = entry
                .already_paid
                .saturating_add(cell_at(row, paid_column).amount().unwrap_or_default());
            if entry.status.is_none() {
                entry.status = PaymentStatus::parse(&cell_at(row, status_column).text());
            }
            if entry.percentage.is_none() {
                entry.percentage = parse_percentage(cell_at(row, percentage_column));
            }
        }

        debug!(role = role, sheet = %sheet.name, "Ledger sheet read");
        used += 1;
    }

    if used == 0 {
        return Err(EngineError::NoUsableSheets {
            role: role.to_string(),
            message: format!("none of {} sheet(s) could be read", sheets.len()),
        });
    }

    Ok(aggregation)
}

fn parse_start_month(cell: &CellValue) -> Option<MonthKey> {
    if let Some(date) = cell.as_date() {
        return MonthKey::new(date.year(), date.month());
    }
    let text = cell.text();
    let text = text.trim();
    text.parse::<MonthKey>()
        .ok()
        .or_else(|| month_key_from_sheet_name(text))
}

/// Merges an override workbook over the YAML override table.
///
/// Entries from the workbook win. Cells that cannot be read are reported
/// and left out.
///
/// # Errors
///
/// Returns [`EngineError::NoUsableSheets`] when no sheet has the code column.
pub fn apply_override_workbook(
    table: &OverrideTable,
    sheets: &[Sheet],
    layout: &OverrideSheetLayout,
    scan_rows: usize,
) -> EngineResult<(OverrideTable, Vec<RunWarning>)> {
    let mut merged = table.clone();
    let mut warnings = Vec::new();
    let mut used = 0usize;

    let companions: Vec<&str> = layout
        .percentage
        .iter()
        .chain(layout.start_month.iter())
        .flat_map(ColumnRef::labels)
        .collect();

    for sheet in sheets {
        let Some(keyed) = KeyedSheet::locate(sheet, &layout.code, &companions, None, scan_rows) else {
            warn!(sheet = %sheet.name, "Skipping override sheet without code column");
            warnings.push(RunWarning::new(
                "sheet_skipped",
                format!("override sheet '{}' has no code column", sheet.name),
                "medium",
            ));
            continue;
        };
        used += 1;

        let percentage_column = layout.percentage.as_ref().and_then(|c| keyed.column(c));
        let start_column = layout.start_month.as_ref().and_then(|c| keyed.column(c));

        for (key, _, row) in keyed.records() {
            let percentage_cell = cell_at(row, percentage_column);
            if !percentage_cell.is_blank() {
                match parse_percentage(percentage_cell) {
                    Some(percentage) => {
                        merged.custom_percentages.insert(key.clone(), percentage);
                    }
                    None => warnings.push(RunWarning::new(
                        "override_unreadable",
                        format!(
                            "custom percentage '{}' for '{}' is not a number",
                            percentage_cell.text(),
                            key
                        ),
                        "low",
                    )),
                }
            }

            let start_cell = cell_at(row, start_column);
            if !start_cell.is_blank() {
                match parse_start_month(start_cell) {
                    Some(month) => {
                        merged.custom_start_months.insert(key.clone(), month);
                    }
                    None => warnings.push(RunWarning::new(
                        "override_unreadable",
                        format!(
                            "start month '{}' for '{}' is not a month",
                            start_cell.text(),
                            key
                        ),
                        "low",
                    )),
                }
            }
        }
    }

    if used == 0 {
        return Err(EngineError::NoUsableSheets {
            role: "overrides".to_string(),
            message: format!("none of {} sheet(s) could be read", sheets.len()),
        });
    }

    info!(
        custom_percentages = merged.custom_percentages.len(),
        custom_start_months = merged.custom_start_months.len(),
        "Override workbook merged"
    );
    Ok((merged, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnRef;
    use crate::models::text_row;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn key(s: &str) -> EmployeeKey {
        EmployeeKey::new(s).unwrap()
    }

    fn due_layout() -> LedgerLayout {
        LedgerLayout {
            code: vec!["Code".to_string()],
            name: Some(ColumnRef::Label("Name".to_string())),
            amount: ColumnRef::Header(vec!["Unpaid Amount".to_string(), "Due".to_string()]),
            status: Some(ColumnRef::Label("Status".to_string())),
            percentage: Some(ColumnRef::Label("Paid Percentage".to_string())),
            already_paid: None,
        }
    }

    fn due_sheet() -> Sheet {
        Sheet::new(
            "Due",
            vec![
                text_row(&["Code", "Name", "Unpaid Amount", "Status", "Paid Percentage"]),
                text_row(&["S1", "Meera", "1,000", "", ""]),
                text_row(&["S1", "Meera", "500", "Unpaid", "10%"]),
                text_row(&["S2", "Ravi", "", "Paid", "8.33"]),
                text_row(&["", "Total", "1500", "", ""]),
            ],
        )
    }

    #[test]
    fn test_ledger_sums_amounts_and_keeps_first_status() {
        let result = aggregate_ledger(&[due_sheet()], &due_layout(), "due", 15).unwrap();
        let s1 = result.entry(&key("S1")).unwrap();
        assert_eq!(s1.amount, dec("1500"));
        assert_eq!(s1.occurrences, 2);
        assert_eq!(s1.status, Some(PaymentStatus::Unpaid));
        assert_eq!(s1.percentage, Some(dec("10")));

        let s2 = result.entry(&key("S2")).unwrap();
        assert_eq!(s2.amount, Decimal::ZERO);
        assert_eq!(s2.status, Some(PaymentStatus::Paid));
        assert_eq!(result.entries.len(), 2);
    }

    #[test]
    fn test_absent_employee_amount_is_zero() {
        let result = aggregate_ledger(&[due_sheet()], &due_layout(), "due", 15).unwrap();
        assert_eq!(result.amount(&key("S9")), Decimal::ZERO);
    }

    #[test]
    fn test_ledger_without_amount_column_is_unusable() {
        let sheet = Sheet::new("Due", vec![text_row(&["Code", "Name"])]);
        match aggregate_ledger(&[sheet], &due_layout(), "due", 15) {
            Err(EngineError::NoUsableSheets { role, .. }) => assert_eq!(role, "due"),
            other => panic!("Expected NoUsableSheets, got {:?}", other),
        }
    }

    #[test]
    fn test_already_paid_column_is_summed() {
        let mut layout = due_layout();
        layout.already_paid = Some(ColumnRef::Label("Advance Paid".to_string()));
        let sheet = Sheet::new(
            "Due",
            vec![
                text_row(&["Code", "Unpaid Amount", "Advance Paid"]),
                text_row(&["S1", "0", "250"]),
                text_row(&["S1", "0", "250"]),
            ],
        );
        let result = aggregate_ledger(&[sheet], &layout, "due", 15).unwrap();
        assert_eq!(result.entry(&key("S1")).unwrap().already_paid, dec("500"));
    }

    #[test]
    fn test_parse_percentage_forms() {
        assert_eq!(parse_percentage(&CellValue::from("12")), Some(dec("12")));
        assert_eq!(parse_percentage(&CellValue::Number(0.0833)), Some(dec("8.33")));
        assert_eq!(parse_percentage(&CellValue::from(" 8.33 % ")), Some(dec("8.33")));
        assert_eq!(parse_percentage(&CellValue::from("n/a")), None);
    }

    #[test]
    fn test_explicit_percent_sign_is_never_a_fraction() {
        assert_eq!(parse_percentage(&CellValue::from("0.5%")), Some(dec("0.5")));
        assert_eq!(parse_percentage(&CellValue::from("1%")), Some(dec("1")));
        assert_eq!(parse_percentage(&CellValue::from("50%")), Some(dec("50")));
        assert_eq!(parse_percentage(&CellValue::Number(0.5)), Some(dec("50")));
        assert_eq!(parse_percentage(&CellValue::from("0.5")), Some(dec("50")));
    }

    #[test]
    fn test_override_workbook_wins_over_yaml() {
        let mut table = OverrideTable::default();
        table.custom_percentages.insert(key("S1"), dec("10"));
        table.custom_percentages.insert(key("S2"), dec("12"));

        let layout = OverrideSheetLayout {
            code: vec!["Code".to_string()],
            percentage: Some(ColumnRef::Label("Custom Percentage".to_string())),
            start_month: Some(ColumnRef::Label("Start Month".to_string())),
        };
        let sheet = Sheet::new(
            "Overrides",
            vec![
                text_row(&["Code", "Custom Percentage", "Start Month"]),
                text_row(&["S1", "8.33", ""]),
                text_row(&["W7", "", "Apr-25"]),
                text_row(&["W8", "lots", "2025-06"]),
            ],
        );

        let (merged, warnings) = apply_override_workbook(&table, &[sheet], &layout, 15).unwrap();
        assert_eq!(merged.custom_percentages[&key("S1")], dec("8.33"));
        assert_eq!(merged.custom_percentages[&key("S2")], dec("12"));
        assert_eq!(
            merged.custom_start_months[&key("W7")],
            MonthKey::new(2025, 4).unwrap()
        );
        assert_eq!(
            merged.custom_start_months[&key("W8")],
            MonthKey::new(2025, 6).unwrap()
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "override_unreadable");
    }
}
