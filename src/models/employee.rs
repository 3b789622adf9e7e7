//! Employee identity, salary timelines and gross records.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::{CellValue, MonthKey};

/// Identifies an employee across every input workbook.
///
/// The explicit employee code when the row has one, otherwise the trimmed,
/// upper-cased name.
///
/// # Example
///
/// ```
/// use bonus_recon::models::EmployeeKey;
///
/// let by_code = EmployeeKey::from_code_or_name(" w-104 ", "Asha Rao").unwrap();
/// assert_eq!(by_code.as_str(), "W-104");
///
/// let by_name = EmployeeKey::from_code_or_name("", "  Asha Rao ").unwrap();
/// assert_eq!(by_name.as_str(), "ASHA RAO");
///
/// assert!(EmployeeKey::from_code_or_name("", "  ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmployeeKey(String);

impl EmployeeKey {
    /// Normalizes a raw identifier.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        (!normalized.is_empty()).then_some(Self(normalized))
    }

    /// Builds a key from the code, falling back to the name.
    pub fn from_code_or_name(code: &str, name: &str) -> Option<Self> {
        Self::new(code).or_else(|| Self::new(name))
    }

    /// The normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EmployeeKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = EmployeeKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-empty employee code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                EmployeeKey::new(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(EmployeeKey(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(EmployeeKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two employee populations, each with its own salary workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeCategory {
    /// Salaried staff.
    Staff,
    /// Wage workers.
    Worker,
}

impl fmt::Display for EmployeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeCategory::Staff => f.write_str("staff"),
            EmployeeCategory::Worker => f.write_str("worker"),
        }
    }
}

/// One employee's monthly salaries across a salary workbook.
///
/// A month is present only when at least one row supplied an amount for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTimeline {
    /// The employee key.
    pub key: EmployeeKey,
    /// Display name, from the first row that had one.
    pub name: String,
    /// Department code, from the first row that had one.
    pub department: String,
    /// Joining date exactly as the sheet held it.
    pub date_of_joining: CellValue,
    /// Salary per month; repeated rows for the same month are summed.
    pub months: BTreeMap<MonthKey, Decimal>,
}

impl MonthlyTimeline {
    /// Creates an empty timeline.
    pub fn new(key: EmployeeKey) -> Self {
        Self {
            key,
            name: String::new(),
            department: String::new(),
            date_of_joining: CellValue::Empty,
            months: BTreeMap::new(),
        }
    }

    /// Returns the amount for `month`, or `None` if it is absent.
    pub fn amount(&self, month: MonthKey) -> Option<Decimal> {
        self.months.get(&month).copied()
    }
}

/// An employee's gross salary over the bonus year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrossRecord {
    /// The employee key.
    pub employee_id: EmployeeKey,
    /// Display name.
    pub name: String,
    /// Department code.
    pub department: String,
    /// Joining date exactly as the sheet held it.
    pub date_of_joining: CellValue,
    /// Populations this record was folded from, in fold order.
    pub categories: Vec<EmployeeCategory>,
    /// Sum of the actual months in the window.
    pub actual_total: Decimal,
    /// Projected amount for the partial month.
    pub projected: Decimal,
    /// `actual_total + projected`.
    pub gross_salary: Decimal,
}

impl GrossRecord {
    /// The population whose rules govern this record (the first folded).
    pub fn primary_category(&self) -> Option<EmployeeCategory> {
        self.categories.first().copied()
    }

    /// Adds another population's record for the same id.
    ///
    /// Amounts are summed; identity fields stay with the first record and
    /// are only filled in where it had none.
    pub fn absorb(&mut self, other: GrossRecord) {
        self.actual_total = self.actual_total.saturating_add(other.actual_total);
        self.projected = self.projected.saturating_add(other.projected);
        self.gross_salary = self.gross_salary.saturating_add(other.gross_salary);
        if self.name.is_empty() {
            self.name = other.name;
        }
        if self.department.is_empty() {
            self.department = other.department;
        }
        if self.date_of_joining.is_blank() {
            self.date_of_joining = other.date_of_joining;
        }
        for category in other.categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
    }
}
