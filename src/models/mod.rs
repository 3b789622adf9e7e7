//! Core data models for the bonus reconciliation engine.
//!
//! This module contains the spreadsheet view the engine reads, the
//! per-employee records it builds, and the rows and report it emits.

mod cell;
mod comparison;
mod employee;
mod month_key;
mod report;
mod sheet;

pub use cell::{CellValue, FormulaCell};
pub use comparison::{ComparisonRow, MatchStatus, Stage, StageValues};
pub use employee::{EmployeeCategory, EmployeeKey, GrossRecord, MonthlyTimeline};
pub use month_key::{MonthKey, MonthWindow};
pub use report::{
    HrFigure, ReconciliationReport, ReconciliationSummary, RunWarning, StageSummary,
};
pub use sheet::{Sheet, Workbook};

#[cfg(test)]
pub(crate) use sheet::text_row;
