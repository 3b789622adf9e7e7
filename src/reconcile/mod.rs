//! Reconciliation of Software figures against HR figures.
//!
//! This module aggregates the HR workbook and the external ledgers, compares
//! each Software stage value with its HR counterpart, drives the whole run
//! through [`Reconciler`], and signs and audits the result.

mod audit;
mod comparator;
mod hr_aggregate;
mod keyed;
mod ledger;
mod pipeline;

pub use audit::{
    AuditLog, AuditSink, AuditSummary, MemoryAuditSink, TracingAuditSink, run_signature,
};
pub use comparator::{Comparison, compare};
pub use hr_aggregate::{HrAggregation, HrRecord, aggregate_hr, layout_for};
pub use ledger::{
    LedgerAggregation, LedgerEntry, aggregate_ledger, apply_override_workbook, parse_percentage,
};
pub use pipeline::{ReconciliationInputs, Reconciler};
