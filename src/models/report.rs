//! HR figures, run warnings, and the reconciliation report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ComparisonRow, EmployeeKey, MatchStatus, Stage};

/// An HR-side figure, summed over every row carrying the same employee code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrFigure {
    /// The employee key.
    pub employee_id: EmployeeKey,
    /// Sum of the amounts.
    pub amount: Decimal,
    /// Number of rows summed. Anything above 1 is reported.
    pub occurrences: u32,
}

impl HrFigure {
    /// Starts a figure from its first row.
    pub fn new(employee_id: EmployeeKey, amount: Decimal) -> Self {
        Self {
            employee_id,
            amount,
            occurrences: 1,
        }
    }

    /// Adds another row.
    pub fn add(&mut self, amount: Decimal) {
        self.amount = self.amount.saturating_add(amount);
        self.occurrences += 1;
    }
}

/// A non-fatal condition noticed during a run.
///
/// # Example
///
/// ```
/// use bonus_recon::models::RunWarning;
///
/// let warning = RunWarning::new("sheet_skipped", "Sheet 'Notes' has no month", "low");
/// assert_eq!(warning.code, "sheet_skipped");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWarning {
    /// A code identifying the kind of warning.
    pub code: String,
    /// A human-readable description.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

impl RunWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// Status counts for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageSummary {
    /// Rows within tolerance.
    pub matched: u32,
    /// Rows outside tolerance.
    pub mismatched: u32,
    /// Rows violating a business rule.
    pub errors: u32,
}

impl StageSummary {
    fn record(&mut self, status: MatchStatus) {
        match status {
            MatchStatus::Match => self.matched += 1,
            MatchStatus::Mismatch => self.mismatched += 1,
            MatchStatus::Error => self.errors += 1,
        }
    }
}

/// Aggregate counts over a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Distinct employees across Software and HR.
    pub employees: u32,
    /// Total rows.
    pub total_rows: u32,
    /// Totals over every stage.
    pub overall: StageSummary,
    /// Counts per stage.
    pub by_stage: BTreeMap<Stage, StageSummary>,
}

impl ReconciliationSummary {
    /// Tallies the rows of a run.
    pub fn from_rows(rows: &[ComparisonRow]) -> Self {
        let mut summary = ReconciliationSummary::default();
        let mut employees: Vec<&str> = Vec::new();

        for row in rows {
            summary.total_rows += 1;
            summary.overall.record(row.status);
            summary.by_stage.entry(row.stage).or_default().record(row.status);
            employees.push(&row.employee_id);
        }

        employees.sort_unstable();
        employees.dedup();
        summary.employees = employees.len() as u32;
        summary
    }
}

/// The complete, deterministic result of one reconciliation run.
///
/// Holds no timestamps or random identifiers: the same inputs and
/// configuration always serialize to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// The version of the engine that produced the report.
    pub engine_version: String,
    /// The bonus policy name from configuration.
    pub policy_name: String,
    /// The fixed date months of service are measured to.
    pub reference_date: NaiveDate,
    /// Absolute tolerance used by the comparator.
    pub tolerance: Decimal,
    /// SHA-256 over the serialized rows.
    pub run_signature: String,
    /// Status counts.
    pub summary: ReconciliationSummary,
    /// One row per employee per compared stage, stage-major.
    pub rows: Vec<ComparisonRow>,
    /// Non-fatal conditions, in the order they were found.
    pub warnings: Vec<RunWarning>,
}

impl ReconciliationReport {
    /// Rows for one stage.
    pub fn rows_for_stage(&self, stage: Stage) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(move |row| row.stage == stage)
    }

    /// The row for one employee at one stage.
    pub fn row(&self, stage: Stage, employee_id: &str) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .find(|row| row.stage == stage && row.employee_id == employee_id)
    }
}
