//! Configuration types for bonus reconciliation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML files of a configuration directory.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeCategory, EmployeeKey, MonthKey, MonthWindow, Stage};

fn default_header_scan_rows() -> usize {
    15
}

/// A step of the months-of-service tier function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTier {
    /// The step applies when months of service are strictly below this.
    pub below_months: u32,
    /// The bonus percentage for the step.
    pub percentage: Decimal,
}

/// The bonus policy from `policy.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusPolicy {
    /// Human-readable policy name (e.g. "Bonus 2024-25").
    pub name: String,
    /// Fixed date months of service are measured to (end of the bonus period).
    pub reference_date: NaiveDate,
    /// The actual months feeding gross; the following month is projected.
    pub window: MonthWindow,
    /// Absolute comparator tolerance in currency units.
    pub tolerance: Decimal,
    /// The base tier percentage (8.33).
    pub base_percentage: Decimal,
    /// Multiplier applied to gross for tiers above the base (0.6).
    pub special_gross_factor: Decimal,
    /// Months-of-service steps, checked in order; past the last step the
    /// base percentage applies.
    pub service_tiers: Vec<ServiceTier>,
    /// Minimum months of service for the tenure-restricted category.
    pub minimum_tenure_months: u32,
    /// The category subject to the minimum tenure.
    pub tenure_restricted_category: EmployeeCategory,
    /// How many leading rows of a sheet are searched for a header row.
    #[serde(default = "default_header_scan_rows")]
    pub header_scan_rows: usize,
    /// Months never read even if a sheet for them exists inside the window.
    #[serde(default)]
    pub excluded_months: Vec<MonthKey>,
}

impl BonusPolicy {
    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> EngineResult<()> {
        if self.window.actual_months == 0 {
            return Err(invalid("window.actual_months", "must be at least 1"));
        }
        if self.tolerance < Decimal::ZERO {
            return Err(invalid("tolerance", "must not be negative"));
        }
        if self.base_percentage <= Decimal::ZERO {
            return Err(invalid("base_percentage", "must be positive"));
        }
        if self.special_gross_factor <= Decimal::ZERO {
            return Err(invalid("special_gross_factor", "must be positive"));
        }
        if self.header_scan_rows == 0 {
            return Err(invalid("header_scan_rows", "must be at least 1"));
        }
        let ascending = self
            .service_tiers
            .windows(2)
            .all(|pair| pair[0].below_months < pair[1].below_months);
        if !ascending {
            return Err(invalid(
                "service_tiers",
                "below_months must be strictly ascending",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> EngineError {
    EngineError::InvalidConfig {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Per-employee overrides from `overrides.yaml` and the override workbook.
///
/// Every list is keyed by [`EmployeeKey`], so codes are normalized on load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideTable {
    /// Explicit bonus percentages; these win over the service-length tiers.
    #[serde(default)]
    pub custom_percentages: BTreeMap<EmployeeKey, Decimal>,
    /// Employees whose projection averages every window month, absent ones as zero.
    #[serde(default)]
    pub include_zero_months: BTreeSet<EmployeeKey>,
    /// Employees whose projection averages present months including zeros.
    #[serde(default)]
    pub exclude_zero_in_average: BTreeSet<EmployeeKey>,
    /// Employees whose projection is forced to zero.
    #[serde(default)]
    pub exclude_from_projection: BTreeSet<EmployeeKey>,
    /// Employees whose averaging starts at a later month.
    #[serde(default)]
    pub custom_start_months: BTreeMap<EmployeeKey, MonthKey>,
    /// Department codes excluded from the bonus scheme, per category.
    #[serde(default)]
    pub excluded_departments: BTreeMap<EmployeeCategory, BTreeSet<String>>,
}

impl OverrideTable {
    /// Normalized excluded department codes for `category`.
    pub fn excluded_departments_for(&self, category: EmployeeCategory) -> BTreeSet<String> {
        self.excluded_departments
            .get(&category)
            .map(|set| set.iter().map(|d| d.trim().to_uppercase()).collect())
            .unwrap_or_default()
    }
}

/// Where a figure lives on a sheet.
///
/// In YAML: a zero-based column index (`7`), a header label (`"Net Bonus"`),
/// or a list of alternative header labels (`["Unpaid", "Due"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// A fixed zero-based column index.
    Index(usize),
    /// A single header label.
    Label(String),
    /// Alternative header labels, first match wins.
    Header(Vec<String>),
}

impl ColumnRef {
    /// The header labels to search for, or empty for a fixed index.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            ColumnRef::Index(_) => Vec::new(),
            ColumnRef::Label(label) => vec![label.as_str()],
            ColumnRef::Header(labels) => labels.iter().map(String::as_str).collect(),
        }
    }
}

/// Column layout of a monthly salary workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryLayout {
    /// Label sets identifying the header row; any set fully present matches.
    pub header_labels: Vec<Vec<String>>,
    /// Employee code column labels.
    #[serde(default)]
    pub code: Vec<String>,
    /// Employee name column labels.
    pub name: Vec<String>,
    /// Department column labels.
    #[serde(default)]
    pub department: Vec<String>,
    /// Joining date column labels.
    #[serde(default)]
    pub date_of_joining: Vec<String>,
    /// Monthly salary column labels.
    pub amount: Vec<String>,
}

/// Column layout of one kind of HR sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrSheetLayout {
    /// The layout applies to sheets whose name contains any of these.
    #[serde(default)]
    pub name_contains: Vec<String>,
    /// Employee code column labels; the header row must contain one.
    pub code: Vec<String>,
    /// Optional employee name column.
    #[serde(default)]
    pub name: Option<ColumnRef>,
    /// Figure columns per stage; stages without a column are not compared.
    pub columns: BTreeMap<Stage, ColumnRef>,
}

/// Layouts of the HR bonus workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrLayout {
    /// Sheet-specific layouts, first match wins.
    #[serde(default)]
    pub sheets: Vec<HrSheetLayout>,
    /// Layout for sheets no specific layout matched; those are skipped if unset.
    #[serde(default)]
    pub default: Option<HrSheetLayout>,
}

impl HrLayout {
    /// Every stage that at least one layout has a column for.
    pub fn compared_stages(&self) -> BTreeSet<Stage> {
        self.sheets
            .iter()
            .chain(self.default.iter())
            .flat_map(|layout| layout.columns.keys().copied())
            .collect()
    }
}

/// Column layout of an external ledger (due, loan, already-paid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLayout {
    /// Employee code column labels.
    pub code: Vec<String>,
    /// Optional employee name column.
    #[serde(default)]
    pub name: Option<ColumnRef>,
    /// The summed amount column.
    pub amount: ColumnRef,
    /// Optional payment status column.
    #[serde(default)]
    pub status: Option<ColumnRef>,
    /// Optional percentage actually applied.
    #[serde(default)]
    pub percentage: Option<ColumnRef>,
    /// Optional already-paid column, when the ledger carries it.
    #[serde(default)]
    pub already_paid: Option<ColumnRef>,
}

/// Column layout of the override workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideSheetLayout {
    /// Employee code column labels.
    pub code: Vec<String>,
    /// Custom percentage column.
    #[serde(default)]
    pub percentage: Option<ColumnRef>,
    /// Custom averaging start month column.
    #[serde(default)]
    pub start_month: Option<ColumnRef>,
}

/// Every sheet layout, from `layouts.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Staff salary workbook.
    pub staff: SalaryLayout,
    /// Worker salary workbook.
    pub worker: SalaryLayout,
    /// HR bonus workbook.
    pub hr: HrLayout,
    /// Due/unpaid ledger.
    pub due_ledger: LedgerLayout,
    /// Loan-deduction ledger.
    pub loan_ledger: LedgerLayout,
    /// Separate already-paid ledger, if one is supplied.
    #[serde(default)]
    pub already_paid_ledger: Option<LedgerLayout>,
    /// Override workbook, if one is supplied.
    #[serde(default)]
    pub override_workbook: Option<OverrideSheetLayout>,
}

impl LayoutConfig {
    /// The salary layout for a category.
    pub fn salary(&self, category: EmployeeCategory) -> &SalaryLayout {
        match category {
            EmployeeCategory::Staff => &self.staff,
            EmployeeCategory::Worker => &self.worker,
        }
    }
}

/// The complete configuration loaded from a configuration directory.
#[derive(Debug, Clone)]
pub struct BonusConfig {
    policy: BonusPolicy,
    overrides: OverrideTable,
    layouts: LayoutConfig,
}

impl BonusConfig {
    /// Creates a configuration from its parts, validating the policy.
    pub fn new(
        policy: BonusPolicy,
        overrides: OverrideTable,
        layouts: LayoutConfig,
    ) -> EngineResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            overrides,
            layouts,
        })
    }

    /// Returns the bonus policy.
    pub fn policy(&self) -> &BonusPolicy {
        &self.policy
    }

    /// Returns the override table.
    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Returns the sheet layouts.
    pub fn layouts(&self) -> &LayoutConfig {
        &self.layouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY_YAML: &str = r#"
name: "Bonus 2024-25"
reference_date: 2025-10-30
window:
  first_month: "2024-11"
  actual_months: 11
tolerance: 12
base_percentage: 8.33
special_gross_factor: 0.6
service_tiers:
  - below_months: 12
    percentage: 10
  - below_months: 24
    percentage: 12
minimum_tenure_months: 6
tenure_restricted_category: worker
"#;

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: BonusPolicy = serde_yaml::from_str(POLICY_YAML).unwrap();
        assert_eq!(policy.header_scan_rows, 15);
        assert!(policy.excluded_months.is_empty());
        assert_eq!(policy.base_percentage, Decimal::new(833, 2));
        assert_eq!(policy.window.last_month().to_string(), "2025-09");
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_policy_rejects_unordered_tiers() {
        let mut policy: BonusPolicy = serde_yaml::from_str(POLICY_YAML).unwrap();
        policy.service_tiers.reverse();
        match policy.validate() {
            Err(EngineError::InvalidConfig { field, .. }) => assert_eq!(field, "service_tiers"),
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_override_table_normalizes_codes() {
        let yaml = r#"
custom_percentages:
  " s101 ": 12
  2040: 10
exclude_from_projection: ["w7"]
custom_start_months:
  W9: "2025-03"
excluded_departments:
  worker: ["cas ", "CONTRACT"]
"#;
        let table: OverrideTable = serde_yaml::from_str(yaml).unwrap();
        let s101 = EmployeeKey::new("S101").unwrap();
        assert_eq!(table.custom_percentages[&s101], Decimal::new(12, 0));
        assert!(table
            .custom_percentages
            .contains_key(&EmployeeKey::new("2040").unwrap()));
        assert!(table
            .exclude_from_projection
            .contains(&EmployeeKey::new("W7").unwrap()));
        let excluded = table.excluded_departments_for(EmployeeCategory::Worker);
        assert!(excluded.contains("CAS"));
        assert!(table
            .excluded_departments_for(EmployeeCategory::Staff)
            .is_empty());
    }

    #[test]
    fn test_column_ref_forms() {
        let refs: Vec<ColumnRef> = serde_yaml::from_str(r#"[7, "Net Bonus", ["Unpaid", "Due"]]"#).unwrap();
        assert_eq!(refs[0], ColumnRef::Index(7));
        assert_eq!(refs[1].labels(), vec!["Net Bonus"]);
        assert_eq!(refs[2].labels(), vec!["Unpaid", "Due"]);
        assert!(refs[0].labels().is_empty());
    }
}
