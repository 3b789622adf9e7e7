//! Run signatures and once-per-run audit submission.
//!
//! A run is identified by the SHA-256 of its serialized rows, so the same
//! inputs under the same configuration always carry the same signature.
//! [`AuditLog`] forwards a summary to an [`AuditSink`] the first time it sees
//! a signature and ignores repeats.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{ComparisonRow, ReconciliationReport};

/// Lowercase hex SHA-256 of the JSON-serialized rows.
pub fn run_signature(rows: &[ComparisonRow]) -> EngineResult<String> {
    let bytes = serde_json::to_vec(rows).map_err(|e| EngineError::Serialization {
        message: e.to_string(),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// What is submitted for each distinct run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// The run signature.
    pub run_signature: String,
    /// The policy the run was made under.
    pub policy_name: String,
    /// Distinct employees.
    pub employees: u32,
    /// Total rows.
    pub total_rows: u32,
    /// Rows within tolerance.
    pub matched: u32,
    /// Rows outside tolerance.
    pub mismatched: u32,
    /// Rows violating a business rule.
    pub errors: u32,
}

impl AuditSummary {
    /// Summarizes a report.
    pub fn from_report(report: &ReconciliationReport) -> Self {
        Self {
            run_signature: report.run_signature.clone(),
            policy_name: report.policy_name.clone(),
            employees: report.summary.employees,
            total_rows: report.summary.total_rows,
            matched: report.summary.overall.matched,
            mismatched: report.summary.overall.mismatched,
            errors: report.summary.overall.errors,
        }
    }
}

/// Receives audit summaries.
pub trait AuditSink: Send + Sync {
    /// Records one summary.
    fn submit(&self, summary: &AuditSummary) -> EngineResult<()>;
}

/// Emits each summary as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn submit(&self, summary: &AuditSummary) -> EngineResult<()> {
        info!(
            run_signature = %summary.run_signature,
            policy = %summary.policy_name,
            employees = summary.employees,
            total_rows = summary.total_rows,
            matched = summary.matched,
            mismatched = summary.mismatched,
            errors = summary.errors,
            "Reconciliation audit"
        );
        Ok(())
    }
}

/// Keeps summaries in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    submitted: Mutex<Vec<AuditSummary>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every summary received so far.
    pub fn submitted(&self) -> Vec<AuditSummary> {
        self.submitted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn submit(&self, summary: &AuditSummary) -> EngineResult<()> {
        let mut submitted = self.submitted.lock().map_err(|e| EngineError::AuditSink {
            message: e.to_string(),
        })?;
        submitted.push(summary.clone());
        Ok(())
    }
}

/// Remembers which run signatures have been submitted.
#[derive(Debug, Default)]
pub struct AuditLog {
    seen: BTreeSet<String>,
}

impl AuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits the report's summary unless its signature was already seen.
    ///
    /// Returns `true` when a submission was made. A failed submission is not
    /// remembered, so the same run can be retried.
    pub fn submit_once(
        &mut self,
        report: &ReconciliationReport,
        sink: &dyn AuditSink,
    ) -> EngineResult<bool> {
        if self.seen.contains(&report.run_signature) {
            debug!(run_signature = %report.run_signature, "Run already audited");
            return Ok(false);
        }
        sink.submit(&AuditSummary::from_report(report))?;
        self.seen.insert(report.run_signature.clone());
        Ok(true)
    }

    /// Number of distinct runs submitted.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True when nothing has been submitted.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
