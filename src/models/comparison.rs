//! Pipeline stages, stage values and comparison rows.
//!
//! A [`ComparisonRow`] is the terminal record of a run: one per employee per
//! compared stage, carrying every Software intermediate so any stage can be
//! reproduced from the row alone.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EmployeeCategory;

/// A stage of the bonus pipeline.
///
/// Stages are ordered as the pipeline evaluates them.
///
/// # Example
///
/// ```
/// use bonus_recon::models::Stage;
///
/// assert_eq!(Stage::Register.as_str(), "register");
/// assert!(Stage::Gross < Stage::FinalPayable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Gross salary over the bonus year (actual months plus projection).
    Gross,
    /// Gross after the special-tier adjustment.
    AdjustedGross,
    /// The bonus entitlement.
    Register,
    /// Part of the register not yet disbursed.
    Unpaid,
    /// Register minus the actual tier-adjusted entitlement.
    Reimbursement,
    /// Net transfer amount.
    FinalPayable,
}

impl Stage {
    /// Every stage in evaluation order.
    pub const ALL: [Stage; 6] = [
        Stage::Gross,
        Stage::AdjustedGross,
        Stage::Register,
        Stage::Unpaid,
        Stage::Reimbursement,
        Stage::FinalPayable,
    ];

    /// The snake_case name used in configuration and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Gross => "gross",
            Stage::AdjustedGross => "adjusted_gross",
            Stage::Register => "register",
            Stage::Unpaid => "unpaid",
            Stage::Reimbursement => "reimbursement",
            Stage::FinalPayable => "final_payable",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing one Software value with its HR counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Within tolerance.
    Match,
    /// Outside tolerance.
    Mismatch,
    /// A business rule is violated, whatever the numbers say.
    Error,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Match => f.write_str("match"),
            MatchStatus::Mismatch => f.write_str("mismatch"),
            MatchStatus::Error => f.write_str("error"),
        }
    }
}

/// Software-side values for every stage of one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageValues {
    /// Gross salary.
    pub gross: Decimal,
    /// Gross after the special-tier adjustment.
    pub adjusted_gross: Decimal,
    /// Bonus entitlement.
    pub register: Decimal,
    /// Actual tier-adjusted entitlement at the ledger's percentage.
    pub actual: Decimal,
    /// Amount not yet disbursed.
    pub unpaid: Decimal,
    /// Register minus actual, unless the payment status overrides it.
    pub reimbursement: Decimal,
    /// Register minus unpaid, loan deduction and already-paid amount.
    pub final_payable: Decimal,
}

impl StageValues {
    /// The Software value compared at `stage`.
    pub fn value(&self, stage: Stage) -> Decimal {
        match stage {
            Stage::Gross => self.gross,
            Stage::AdjustedGross => self.adjusted_gross,
            Stage::Register => self.register,
            Stage::Unpaid => self.unpaid,
            Stage::Reimbursement => self.reimbursement,
            Stage::FinalPayable => self.final_payable,
        }
    }
}

/// One employee at one stage: Software values, HR value, and the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// The compared stage.
    pub stage: Stage,
    /// The employee key.
    pub employee_id: String,
    /// Display name (from the salary workbooks, else from HR).
    pub name: String,
    /// Department code.
    pub department: String,
    /// Populations the Software record was folded from; empty for HR-only rows.
    pub categories: Vec<EmployeeCategory>,
    /// Whole months from joining to the reference date, if the date was readable.
    pub months_of_service: Option<u32>,
    /// Whether the employee qualifies for payout.
    pub eligible: bool,
    /// Applied bonus percentage.
    pub tier_percentage: Decimal,
    /// Whether the tier is above the base tier (gross adjusted).
    pub special_tier: bool,
    /// Every Software intermediate.
    #[serde(flatten)]
    pub software: StageValues,
    /// The Software value at this stage.
    pub software_value: Decimal,
    /// The HR value at this stage (0 when HR has no row).
    pub hr_value: Decimal,
    /// How many HR rows were summed into `hr_value`.
    pub hr_occurrences: u32,
    /// `software_value - hr_value`.
    pub difference: Decimal,
    /// The verdict.
    pub status: MatchStatus,
    /// Human-readable notes explaining forced values and violations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_stage_serialization_matches_as_str() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn test_stage_value_lookup() {
        let values = StageValues {
            gross: dec("100000"),
            adjusted_gross: dec("60000"),
            register: dec("7200"),
            actual: dec("8330"),
            unpaid: dec("1000"),
            reimbursement: dec("-1130"),
            final_payable: dec("6200"),
        };
        assert_eq!(values.value(Stage::AdjustedGross), dec("60000"));
        assert_eq!(values.value(Stage::Reimbursement), dec("-1130"));
        assert_eq!(values.value(Stage::FinalPayable), dec("6200"));
    }

    #[test]
    fn test_row_serializes_flat() {
        let row = ComparisonRow {
            stage: Stage::Register,
            employee_id: "S1".to_string(),
            name: "Meera".to_string(),
            department: "ACC".to_string(),
            categories: vec![EmployeeCategory::Staff],
            months_of_service: Some(30),
            eligible: true,
            tier_percentage: dec("8.33"),
            special_tier: false,
            software: StageValues::default(),
            software_value: dec("8330"),
            hr_value: dec("8330"),
            hr_occurrences: 1,
            difference: Decimal::ZERO,
            status: MatchStatus::Match,
            notes: vec![],
        };

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"stage\":\"register\""));
        assert!(json.contains("\"adjusted_gross\":\"0\""));
        assert!(json.contains("\"status\":\"match\""));
        assert!(!json.contains("\"software\""));
        assert!(!json.contains("\"notes\""));
    }
}
