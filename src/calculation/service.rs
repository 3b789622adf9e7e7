//! Length of service and minimum-tenure eligibility.

use chrono::{Datelike, NaiveDate};

use crate::config::BonusPolicy;
use crate::models::{CellValue, EmployeeCategory};

/// Whole months from `joined` to `reference`.
///
/// A month only counts once its day-of-month has been reached. Joining after
/// the reference date gives 0.
///
/// # Example
///
/// ```
/// use bonus_recon::calculation::months_of_service;
/// use chrono::NaiveDate;
///
/// let joined = NaiveDate::from_ymd_opt(2024, 11, 15).unwrap();
/// let reference = NaiveDate::from_ymd_opt(2025, 10, 30).unwrap();
/// assert_eq!(months_of_service(joined, reference), 11);
/// ```
pub fn months_of_service(joined: NaiveDate, reference: NaiveDate) -> u32 {
    let mut months = (reference.year() - joined.year()) * 12
        + (reference.month() as i32 - joined.month() as i32);
    if reference.day() < joined.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Whether an employee qualifies for payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    /// The verdict.
    pub eligible: bool,
    /// Months of service, when the joining date was readable.
    pub months_of_service: Option<u32>,
    /// Explanation when the verdict is not a plain pass.
    pub note: Option<String>,
}

/// Assesses eligibility for one employee.
///
/// Only the policy's tenure-restricted category needs the minimum months of
/// service. An unreadable joining date leaves the employee eligible, with a
/// note saying so.
pub fn assess_eligibility(
    date_of_joining: &CellValue,
    category: Option<EmployeeCategory>,
    policy: &BonusPolicy,
) -> Eligibility {
    let months = date_of_joining
        .as_date()
        .map(|joined| months_of_service(joined, policy.reference_date));

    let restricted = category == Some(policy.tenure_restricted_category);

    match months {
        Some(m) if restricted && m < policy.minimum_tenure_months => Eligibility {
            eligible: false,
            months_of_service: Some(m),
            note: Some(format!(
                "{} months of service, below the {}-month minimum for {}",
                m, policy.minimum_tenure_months, policy.tenure_restricted_category
            )),
        },
        Some(m) => Eligibility {
            eligible: true,
            months_of_service: Some(m),
            note: None,
        },
        None => Eligibility {
            eligible: true,
            months_of_service: None,
            note: Some(if date_of_joining.is_blank() {
                "joining date missing; treated as eligible".to_string()
            } else {
                format!(
                    "joining date '{}' unreadable; treated as eligible",
                    date_of_joining.text()
                )
            }),
        },
    }
}
