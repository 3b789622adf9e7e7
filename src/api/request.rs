//! Request types for the reconciliation API.

use serde::{Deserialize, Serialize};

use crate::reconcile::ReconciliationInputs;

/// Request body for the `/reconcile` endpoint.
///
/// The workbooks sit at the top level of the body, keyed by role
/// (`staff`, `worker`, `hr`, `due_ledger`, `loan_ledger`, and the optional
/// `already_paid_ledger` and `override_workbook`). Each workbook is
/// `{"sheets": [{"name": ..., "rows": [[cell, ...], ...]}]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// The input workbooks.
    #[serde(flatten)]
    pub inputs: ReconciliationInputs,
    /// Whether to send the run to the audit sink. Defaults to `true`.
    #[serde(default = "default_submit_audit")]
    pub submit_audit: bool,
}

fn default_submit_audit() -> bool {
    true
}

impl From<ReconcileRequest> for ReconciliationInputs {
    fn from(req: ReconcileRequest) -> Self {
        req.inputs
    }
}
