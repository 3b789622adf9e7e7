//! The reconciliation pipeline.
//!
//! [`Reconciler::run`] takes the input workbooks through every stage:
//! overrides, timelines, projection, gross records, HR and ledger
//! aggregation, eligibility, tiers, formulas, and comparison. The run is
//! synchronous and owns every intermediate map; iteration is over
//! `BTreeMap`s so the report is identical for identical inputs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculation::{
    FormulaInputs, PaymentStatus, TierAssignment, TierKind, assess_eligibility,
    build_timelines, classify, evaluate, gross_record, is_saturated,
};
use crate::config::{BonusConfig, OverrideTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ComparisonRow, EmployeeCategory, EmployeeKey, GrossRecord, MatchStatus,
    ReconciliationReport, ReconciliationSummary, RunWarning, Stage, StageValues, Workbook,
};

use super::audit::run_signature;
use super::comparator::compare;
use super::hr_aggregate::{HrRecord, aggregate_hr};
use super::ledger::{LedgerAggregation, aggregate_ledger, apply_override_workbook};

/// The workbooks of one run, by role.
///
/// Every role is optional at the type level so that a request missing one
/// can be answered with [`EngineError::MissingInput`] naming it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationInputs {
    /// Staff monthly salary workbook (required).
    #[serde(default)]
    pub staff: Option<Workbook>,
    /// Worker monthly salary workbook (required).
    #[serde(default)]
    pub worker: Option<Workbook>,
    /// HR bonus workbook (required).
    #[serde(default)]
    pub hr: Option<Workbook>,
    /// Due/unpaid ledger (required).
    #[serde(default)]
    pub due_ledger: Option<Workbook>,
    /// Loan-deduction ledger (required).
    #[serde(default)]
    pub loan_ledger: Option<Workbook>,
    /// Already-paid ledger.
    #[serde(default)]
    pub already_paid_ledger: Option<Workbook>,
    /// Override workbook.
    #[serde(default)]
    pub override_workbook: Option<Workbook>,
}

fn required<'a>(workbook: &'a Option<Workbook>, role: &str) -> EngineResult<&'a Workbook> {
    workbook.as_ref().ok_or_else(|| EngineError::MissingInput {
        role: role.to_string(),
    })
}

fn layout_missing(field: &str) -> EngineError {
    EngineError::InvalidConfig {
        field: field.to_string(),
        message: "a workbook was supplied for this role but no layout is configured".to_string(),
    }
}

/// The ledgers an employee's formulas read from.
#[derive(Debug, Clone, Copy)]
struct Ledgers<'a> {
    due: &'a LedgerAggregation,
    loans: &'a LedgerAggregation,
    already_paid: Option<&'a LedgerAggregation>,
}

/// Software-side result for one employee.
#[derive(Debug, Clone)]
struct SoftwareEvaluation {
    record: GrossRecord,
    months_of_service: Option<u32>,
    eligible: bool,
    tier: TierAssignment,
    values: StageValues,
    payment_status: Option<PaymentStatus>,
    /// Stage values could not be computed within the decimal range.
    overflowed: bool,
    notes: Vec<String>,
}

/// Runs reconciliations under one configuration.
///
/// # Example
///
/// ```no_run
/// use bonus_recon::config::ConfigLoader;
/// use bonus_recon::reconcile::{ReconciliationInputs, Reconciler};
///
/// let loader = ConfigLoader::load("./config/bonus_2025")?;
/// let inputs: ReconciliationInputs = serde_json::from_str(
///     &std::fs::read_to_string("inputs.json").unwrap(),
/// ).unwrap();
///
/// let report = Reconciler::new(loader.config()).run(&inputs)?;
/// println!("{} mismatches", report.summary.overall.mismatched);
/// # Ok::<(), bonus_recon::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    config: &'a BonusConfig,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler for `config`.
    pub fn new(config: &'a BonusConfig) -> Self {
        Self { config }
    }

    /// Reconciles one set of input workbooks.
    ///
    /// # Errors
    ///
    /// - [`EngineError::MissingInput`] when a required workbook is absent
    /// - [`EngineError::NoUsableSheets`] when a supplied workbook has no
    ///   readable sheet
    /// - [`EngineError::InvalidConfig`] when an optional workbook is supplied
    ///   without a configured layout
    pub fn run(&self, inputs: &ReconciliationInputs) -> EngineResult<ReconciliationReport> {
        let policy = self.config.policy();
        let layouts = self.config.layouts();
        let scan_rows = policy.header_scan_rows;

        let staff = required(&inputs.staff, "staff")?;
        let worker = required(&inputs.worker, "worker")?;
        let hr = required(&inputs.hr, "hr")?;
        let due = required(&inputs.due_ledger, "due_ledger")?;
        let loans = required(&inputs.loan_ledger, "loan_ledger")?;

        info!(policy = %policy.name, "Starting reconciliation");
        let mut warnings = Vec::new();

        let overrides = match &inputs.override_workbook {
            Some(workbook) => {
                let layout = layouts
                    .override_workbook
                    .as_ref()
                    .ok_or_else(|| layout_missing("override_workbook"))?;
                let (merged, override_warnings) =
                    apply_override_workbook(self.config.overrides(), &workbook.sheets, layout, scan_rows)?;
                warnings.extend(override_warnings);
                merged
            }
            None => self.config.overrides().clone(),
        };

        let records = self.gross_records(
            &[(EmployeeCategory::Staff, staff), (EmployeeCategory::Worker, worker)],
            &overrides,
            &mut warnings,
        )?;

        let hr = aggregate_hr(&hr.sheets, &layouts.hr, scan_rows)?;
        warnings.extend(hr.warnings.iter().cloned());
        let due = aggregate_ledger(&due.sheets, &layouts.due_ledger, "due_ledger", scan_rows)?;
        warnings.extend(due.warnings.iter().cloned());
        let loans = aggregate_ledger(&loans.sheets, &layouts.loan_ledger, "loan_ledger", scan_rows)?;
        warnings.extend(loans.warnings.iter().cloned());
        let already_paid = match &inputs.already_paid_ledger {
            Some(workbook) => {
                let layout = layouts
                    .already_paid_ledger
                    .as_ref()
                    .ok_or_else(|| layout_missing("already_paid_ledger"))?;
                let ledger =
                    aggregate_ledger(&workbook.sheets, layout, "already_paid_ledger", scan_rows)?;
                warnings.extend(ledger.warnings.iter().cloned());
                Some(ledger)
            }
            None => None,
        };

        let ledgers = Ledgers {
            due: &due,
            loans: &loans,
            already_paid: already_paid.as_ref(),
        };
        let mut evaluations: BTreeMap<EmployeeKey, SoftwareEvaluation> = BTreeMap::new();
        for (key, record) in records {
            let evaluation = self.evaluate_employee(record, &overrides, ledgers, &mut warnings);
            evaluations.insert(key, evaluation);
        }

        let keys: BTreeSet<&EmployeeKey> = evaluations.keys().chain(hr.records.keys()).collect();
        let stages = layouts.hr.compared_stages();

        let mut rows = Vec::with_capacity(keys.len() * stages.len());
        for stage in &stages {
            for key in &keys {
                rows.push(self.row(
                    *stage,
                    key,
                    evaluations.get(*key),
                    hr.records.get(*key),
                ));
            }
        }

        let summary = ReconciliationSummary::from_rows(&rows);
        let signature = run_signature(&rows)?;

        info!(
            employees = summary.employees,
            rows = summary.total_rows,
            matched = summary.overall.matched,
            mismatched = summary.overall.mismatched,
            errors = summary.overall.errors,
            run_signature = %signature,
            "Reconciliation complete"
        );

        Ok(ReconciliationReport {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            policy_name: policy.name.clone(),
            reference_date: policy.reference_date,
            tolerance: policy.tolerance,
            run_signature: signature,
            summary,
            rows,
            warnings,
        })
    }

    /// Builds and folds the gross records of every salary workbook.
    ///
    /// An id present in more than one population is summed into the first
    /// population's record, logged, and reported.
    fn gross_records(
        &self,
        workbooks: &[(EmployeeCategory, &Workbook)],
        overrides: &OverrideTable,
        warnings: &mut Vec<RunWarning>,
    ) -> EngineResult<BTreeMap<EmployeeKey, GrossRecord>> {
        let policy = self.config.policy();
        let mut records: BTreeMap<EmployeeKey, GrossRecord> = BTreeMap::new();

        for (category, workbook) in workbooks {
            let build = build_timelines(
                &workbook.sheets,
                self.config.layouts().salary(*category),
                &policy.window,
                &policy.excluded_months,
                &overrides.excluded_departments_for(*category),
                policy.header_scan_rows,
            );
            warnings.extend(build.warnings);

            if build.sheets_used.is_empty() {
                return Err(EngineError::NoUsableSheets {
                    role: category.to_string(),
                    message: format!(
                        "no sheet maps to a month between {} and {}",
                        policy.window.first_month,
                        policy.window.last_month()
                    ),
                });
            }
            debug!(
                category = %category,
                sheets = build.sheets_used.len(),
                employees = build.timelines.len(),
                "Timelines built"
            );

            for timeline in build.timelines.values() {
                let (record, projection) =
                    gross_record(timeline, *category, &policy.window, overrides);
                debug!(
                    employee_id = %record.employee_id,
                    projected = %projection.amount,
                    basis = ?projection.basis,
                    "Projected partial month"
                );

                match records.get_mut(&record.employee_id) {
                    Some(existing) => {
                        warn!(
                            employee_id = %record.employee_id,
                            first = ?existing.primary_category(),
                            second = %category,
                            "Employee id present in more than one salary workbook; summing"
                        );
                        warnings.push(RunWarning::new(
                            "category_collision",
                            format!(
                                "'{}' appears in more than one salary workbook; gross was summed",
                                record.employee_id
                            ),
                            "high",
                        ));
                        existing.absorb(record);
                    }
                    None => {
                        records.insert(record.employee_id.clone(), record);
                    }
                }
            }
        }

        Ok(records)
    }

    fn evaluate_employee(
        &self,
        record: GrossRecord,
        overrides: &OverrideTable,
        ledgers: Ledgers<'_>,
        warnings: &mut Vec<RunWarning>,
    ) -> SoftwareEvaluation {
        let policy = self.config.policy();
        let key = &record.employee_id;
        let mut notes = Vec::new();

        if !record.date_of_joining.is_blank() && record.date_of_joining.as_date().is_none() {
            warn!(employee_id = %key, value = %record.date_of_joining.text(), "Unparseable joining date");
            warnings.push(RunWarning::new(
                "unparseable_date",
                format!(
                    "joining date '{}' for '{}' could not be read",
                    record.date_of_joining.text(),
                    key
                ),
                "medium",
            ));
        }

        let eligibility =
            assess_eligibility(&record.date_of_joining, record.primary_category(), policy);
        notes.extend(eligibility.note.clone());
        if record.categories.len() > 1 {
            notes.push("present in more than one salary workbook; gross summed".to_string());
        }

        let tier = classify(key, eligibility.months_of_service, overrides, policy);
        let due_entry = ledgers.due.entry(key);
        let payment_status = due_entry.and_then(|entry| entry.status.clone());
        let already_paid = due_entry
            .map(|e| e.already_paid)
            .unwrap_or_default()
            .saturating_add(
                ledgers
                    .already_paid
                    .map(|ledger| ledger.amount(key))
                    .unwrap_or_default(),
            );

        let inputs = FormulaInputs {
            gross: record.gross_salary,
            tier,
            eligible: eligibility.eligible,
            unpaid_ledger: due_entry.map(|entry| entry.amount),
            payment_status: payment_status.clone(),
            actual_percentage: due_entry.and_then(|entry| entry.percentage),
            loan_deduction: ledgers.loans.amount(key),
            already_paid,
        };
        let saturated_input = [
            inputs.gross,
            inputs.unpaid_ledger.unwrap_or_default(),
            inputs.loan_deduction,
            inputs.already_paid,
        ]
        .into_iter()
        .any(is_saturated);
        let evaluated = if saturated_input {
            None
        } else {
            evaluate(&inputs, policy)
        };
        let overflowed = evaluated.is_none();
        let values = evaluated.unwrap_or(StageValues {
            gross: record.gross_salary,
            ..StageValues::default()
        });
        if overflowed {
            warn!(employee_id = %key, gross = %record.gross_salary, "Stage values out of range");
            warnings.push(RunWarning::new(
                "arithmetic_overflow",
                format!(
                    "bonus stages for '{}' exceed the representable range and were not computed",
                    key
                ),
                "high",
            ));
            notes.push("amounts out of range; stage values not computed".to_string());
        }

        SoftwareEvaluation {
            months_of_service: eligibility.months_of_service,
            eligible: eligibility.eligible,
            tier,
            values,
            payment_status,
            overflowed,
            notes,
            record,
        }
    }

    fn row(
        &self,
        stage: Stage,
        key: &EmployeeKey,
        software: Option<&SoftwareEvaluation>,
        hr: Option<&HrRecord>,
    ) -> ComparisonRow {
        let tolerance = self.config.policy().tolerance;
        let figure = hr.and_then(|record| record.figure(stage));
        let hr_value = figure.map(|f| f.amount).unwrap_or_default();
        let hr_occurrences = figure.map(|f| f.occurrences).unwrap_or_default();

        let values = software.map(|s| s.values).unwrap_or_default();
        let software_value = values.value(stage);
        let comparison = compare(software_value, hr_value, tolerance);
        let mut status = comparison.status;

        let mut notes: Vec<String> = software.map(|s| s.notes.clone()).unwrap_or_default();
        match (software, hr, figure) {
            (None, _, _) => notes.push("no Software record; Software side taken as 0".to_string()),
            (Some(_), None, _) => notes.push("no HR row; HR side taken as 0".to_string()),
            (Some(_), Some(_), None) => notes.push(format!("HR has no {} figure; taken as 0", stage)),
            (Some(_), Some(_), Some(_)) => {}
        }
        if hr_occurrences > 1 {
            notes.push(format!("{} HR rows summed", hr_occurrences));
        }

        if let Some(evaluation) = software {
            if evaluation.overflowed {
                status = MatchStatus::Error;
            }
            match stage {
                Stage::Unpaid if !evaluation.eligible => {
                    notes.push("ineligible: unpaid forced to register".to_string());
                    if comparison.status == MatchStatus::Mismatch {
                        status = MatchStatus::Error;
                        notes.push(format!(
                            "HR unpaid deviates by {} for an ineligible employee",
                            comparison.difference
                        ));
                    }
                }
                Stage::Reimbursement => {
                    if let Some(payment) = evaluation
                        .payment_status
                        .as_ref()
                        .filter(|p| p.settles_reimbursement())
                    {
                        notes.push(format!("payment status '{}': reimbursement is 0", payment));
                    }
                }
                _ => {}
            }
        }

        let (name, department, categories) = match (software, hr) {
            (Some(s), _) => (
                s.record.name.clone(),
                s.record.department.clone(),
                s.record.categories.clone(),
            ),
            (None, Some(h)) => (h.name.clone(), String::new(), Vec::new()),
            (None, None) => (String::new(), String::new(), Vec::new()),
        };
        let tier = software.map(|s| s.tier);

        ComparisonRow {
            stage,
            employee_id: key.to_string(),
            name,
            department,
            categories,
            months_of_service: software.and_then(|s| s.months_of_service),
            eligible: software.is_none_or(|s| s.eligible),
            tier_percentage: tier.map(|t| t.percentage).unwrap_or_default(),
            special_tier: tier.is_some_and(|t| t.kind == TierKind::Special),
            software: values,
            software_value,
            hr_value,
            hr_occurrences,
            difference: comparison.difference,
            status,
            notes,
        }
    }
}
