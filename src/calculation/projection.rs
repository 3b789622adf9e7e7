//! Period projection.
//!
//! The bonus year has one partially elapsed month at the end. Its salary is
//! estimated from the actual months, under the per-employee overrides of the
//! [`OverrideTable`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::OverrideTable;
use crate::models::{EmployeeCategory, GrossRecord, MonthWindow, MonthlyTimeline};

/// How a projection was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionBasis {
    /// Mean of the counted months.
    Average,
    /// The employee is excluded from projection.
    Excluded,
    /// The last actual month is absent or not positive.
    NoAnchor,
    /// No month qualified for the average.
    NoHistory,
}

/// The projected salary for the partial month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// The projected amount, rounded to 2 decimal places.
    pub amount: Decimal,
    /// How many months the average was taken over.
    pub months_counted: u32,
    /// How the amount was arrived at.
    pub basis: ProjectionBasis,
}

impl Projection {
    fn zero(basis: ProjectionBasis) -> Self {
        Self {
            amount: Decimal::ZERO,
            months_counted: 0,
            basis,
        }
    }
}

/// Rounds a derived money value to 2 decimal places, midpoints away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when a sum was clamped at the edge of the decimal range.
///
/// Amounts are accumulated with saturating addition; a clamped total is not
/// a real figure and must not be reconciled as one.
pub fn is_saturated(amount: Decimal) -> bool {
    amount == Decimal::MAX || amount == Decimal::MIN
}

/// Projects the partial month for one employee.
///
/// The last actual month of the window anchors the projection: when it is
/// absent or not positive the projection is zero whatever came before. By
/// default the projection is the mean of the present, non-zero months. With
/// `include_zero_months` every month counts (absent ones as zero); with
/// `exclude_zero_in_average` present zero months count too. A custom start
/// month drops the months before it from the average.
///
/// # Example
///
/// ```
/// use bonus_recon::calculation::{project, ProjectionBasis};
/// use bonus_recon::config::OverrideTable;
/// use bonus_recon::models::{EmployeeKey, MonthWindow, MonthlyTimeline};
/// use rust_decimal::Decimal;
///
/// let window = MonthWindow::new("2025-01".parse().unwrap(), 3);
/// let mut timeline = MonthlyTimeline::new(EmployeeKey::new("S1").unwrap());
/// timeline.months.insert("2025-01".parse().unwrap(), Decimal::new(1000, 0));
/// timeline.months.insert("2025-03".parse().unwrap(), Decimal::new(2000, 0));
///
/// let projection = project(&timeline, &window, &OverrideTable::default());
/// assert_eq!(projection.amount, Decimal::new(1500, 0));
/// assert_eq!(projection.months_counted, 2);
/// assert_eq!(projection.basis, ProjectionBasis::Average);
/// ```
pub fn project(
    timeline: &MonthlyTimeline,
    window: &MonthWindow,
    overrides: &OverrideTable,
) -> Projection {
    let key = &timeline.key;

    if overrides.exclude_from_projection.contains(key) {
        return Projection::zero(ProjectionBasis::Excluded);
    }

    let anchored = timeline
        .amount(window.last_month())
        .is_some_and(|amount| amount > Decimal::ZERO);
    if !anchored {
        return Projection::zero(ProjectionBasis::NoAnchor);
    }

    let start = overrides.custom_start_months.get(key).copied();
    let months = window
        .months()
        .into_iter()
        .filter(|month| start.is_none_or(|s| *month >= s));

    let counted: Vec<Decimal> = if overrides.include_zero_months.contains(key) {
        months
            .map(|month| timeline.amount(month).unwrap_or_default())
            .collect()
    } else if overrides.exclude_zero_in_average.contains(key) {
        months.filter_map(|month| timeline.amount(month)).collect()
    } else {
        months
            .filter_map(|month| timeline.amount(month))
            .filter(|amount| !amount.is_zero())
            .collect()
    };

    if counted.is_empty() {
        return Projection::zero(ProjectionBasis::NoHistory);
    }

    let total = counted
        .iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(*amount));
    let count = counted.len() as u32;
    Projection {
        amount: round_money(total / Decimal::from(count)),
        months_counted: count,
        basis: ProjectionBasis::Average,
    }
}

/// Builds the gross record for one employee of one category.
///
/// Gross is the sum of every present month of the full window plus the
/// projection, regardless of any custom start month.
pub fn gross_record(
    timeline: &MonthlyTimeline,
    category: EmployeeCategory,
    window: &MonthWindow,
    overrides: &OverrideTable,
) -> (GrossRecord, Projection) {
    let projection = project(timeline, window, overrides);
    let actual_total = timeline
        .months
        .iter()
        .filter(|(month, _)| window.contains(**month))
        .fold(Decimal::ZERO, |acc, (_, amount)| acc.saturating_add(*amount));

    let record = GrossRecord {
        employee_id: timeline.key.clone(),
        name: timeline.name.clone(),
        department: timeline.department.clone(),
        date_of_joining: timeline.date_of_joining.clone(),
        categories: vec![category],
        actual_total,
        projected: projection.amount,
        gross_salary: actual_total.saturating_add(projection.amount),
    };
    (record, projection)
}
