//! Bonus stage formulas.
//!
//! Derives every Software stage value for one employee from gross salary,
//! the tier assignment, eligibility and the ledger inputs. Each stage is kept
//! separately so a mismatch can be traced to the stage that introduced it.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BonusPolicy;
use crate::models::StageValues;

use super::projection::round_money;
use super::tier::{TierAssignment, TierKind};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Payment status recorded on the due ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The bonus has been paid.
    Paid,
    /// The bonus is still due.
    Unpaid,
    /// Any other status text, kept as written.
    Other(String),
}

impl PaymentStatus {
    /// Parses ledger status text.
    ///
    /// # Example
    ///
    /// ```
    /// use bonus_recon::calculation::PaymentStatus;
    ///
    /// assert_eq!(PaymentStatus::parse(" Already Paid "), Some(PaymentStatus::Paid));
    /// assert_eq!(PaymentStatus::parse("NOT PAID"), Some(PaymentStatus::Unpaid));
    /// assert_eq!(PaymentStatus::parse(""), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "" => None,
            "paid" | "already paid" => Some(PaymentStatus::Paid),
            "unpaid" | "due" | "not paid" => Some(PaymentStatus::Unpaid),
            _ => Some(PaymentStatus::Other(raw.trim().to_string())),
        }
    }

    /// True for statuses that settle reimbursement at zero.
    pub fn settles_reimbursement(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Unpaid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => f.write_str("paid"),
            PaymentStatus::Unpaid => f.write_str("unpaid"),
            PaymentStatus::Other(text) => f.write_str(text),
        }
    }
}

/// Everything the formulas need for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaInputs {
    /// Gross salary over the bonus year.
    pub gross: Decimal,
    /// The assigned tier.
    pub tier: TierAssignment,
    /// Whether the employee qualifies for payout.
    pub eligible: bool,
    /// Unpaid amount from the due ledger, if the employee is on it.
    pub unpaid_ledger: Option<Decimal>,
    /// Payment status from the due ledger.
    pub payment_status: Option<PaymentStatus>,
    /// The percentage the ledger says was actually applied.
    pub actual_percentage: Option<Decimal>,
    /// Loan deduction.
    pub loan_deduction: Decimal,
    /// Amount already paid out.
    pub already_paid: Decimal,
}

/// `amount × percentage / 100`, `None` on overflow.
fn percent_of(amount: Decimal, percentage: Decimal) -> Option<Decimal> {
    amount
        .checked_mul(percentage)?
        .checked_div(HUNDRED)
        .map(round_money)
}

/// Gross after the tier adjustment: special tiers use `gross × factor`.
///
/// `None` when the product leaves the decimal range.
pub fn adjusted_gross(gross: Decimal, kind: TierKind, policy: &BonusPolicy) -> Option<Decimal> {
    match kind {
        TierKind::Special => gross
            .checked_mul(policy.special_gross_factor)
            .map(round_money),
        TierKind::Base | TierKind::BelowBase => Some(gross),
    }
}

/// The entitlement at the ledger's actual percentage, under the tier rule
/// that percentage falls in. Below-base percentages yield nothing.
pub fn actual_entitlement(
    gross: Decimal,
    percentage: Decimal,
    policy: &BonusPolicy,
) -> Option<Decimal> {
    match TierKind::of(percentage, policy.base_percentage) {
        TierKind::Base => percent_of(gross, percentage),
        TierKind::Special => {
            percent_of(gross.checked_mul(policy.special_gross_factor)?, percentage)
        }
        TierKind::BelowBase => Some(Decimal::ZERO),
    }
}

/// Evaluates every stage for one employee.
///
/// Returns `None` when any stage leaves the decimal range; the caller turns
/// that into an error row instead of a value.
///
/// # Example
///
/// ```no_run
/// use bonus_recon::calculation::{evaluate, FormulaInputs, TierAssignment, TierKind, TierSource};
/// use bonus_recon::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("./config/bonus_2025").unwrap();
/// let inputs = FormulaInputs {
///     gross: Decimal::new(100_000, 0),
///     tier: TierAssignment {
///         percentage: Decimal::new(12, 0),
///         source: TierSource::ServiceLength,
///         kind: TierKind::Special,
///     },
///     eligible: true,
///     unpaid_ledger: None,
///     payment_status: None,
///     actual_percentage: None,
///     loan_deduction: Decimal::ZERO,
///     already_paid: Decimal::ZERO,
/// };
///
/// let values = evaluate(&inputs, loader.policy()).unwrap();
/// // 100,000 × 0.6 = 60,000; 60,000 × 12% = 7,200
/// assert_eq!(values.adjusted_gross, Decimal::new(60_000, 0));
/// assert_eq!(values.register, Decimal::new(7_200, 0));
/// ```
pub fn evaluate(inputs: &FormulaInputs, policy: &BonusPolicy) -> Option<StageValues> {
    let gross = inputs.gross;
    let adjusted = adjusted_gross(gross, inputs.tier.kind, policy)?;
    let register = percent_of(adjusted, inputs.tier.percentage)?;

    let unpaid = if inputs.eligible {
        inputs.unpaid_ledger.unwrap_or_default()
    } else {
        register
    };

    let actual_percentage = inputs
        .actual_percentage
        .unwrap_or(policy.base_percentage);
    let actual = actual_entitlement(gross, actual_percentage, policy)?;

    let settled = inputs
        .payment_status
        .as_ref()
        .is_some_and(PaymentStatus::settles_reimbursement);
    let reimbursement = if settled {
        Decimal::ZERO
    } else {
        register.checked_sub(actual)?
    };

    let final_payable = register
        .checked_sub(unpaid)?
        .checked_sub(inputs.loan_deduction)?
        .checked_sub(inputs.already_paid)?;

    Some(StageValues {
        gross,
        adjusted_gross: adjusted,
        register,
        actual,
        unpaid,
        reimbursement,
        final_payable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::tier::TierSource;
    use crate::models::{EmployeeCategory, MonthWindow};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn policy() -> BonusPolicy {
        BonusPolicy {
            name: "Bonus 2024-25".to_string(),
            reference_date: NaiveDate::from_ymd_opt(2025, 10, 30).unwrap(),
            window: MonthWindow::new("2024-11".parse().unwrap(), 11),
            tolerance: dec("12"),
            base_percentage: dec("8.33"),
            special_gross_factor: dec("0.6"),
            service_tiers: vec![],
            minimum_tenure_months: 6,
            tenure_restricted_category: EmployeeCategory::Worker,
            header_scan_rows: 15,
            excluded_months: vec![],
        }
    }

    fn tier(percentage: &str) -> TierAssignment {
        let percentage = dec(percentage);
        TierAssignment {
            percentage,
            source: TierSource::ServiceLength,
            kind: TierKind::of(percentage, dec("8.33")),
        }
    }

    fn inputs(gross: &str, percentage: &str) -> FormulaInputs {
        FormulaInputs {
            gross: dec(gross),
            tier: tier(percentage),
            eligible: true,
            unpaid_ledger: None,
            payment_status: None,
            actual_percentage: None,
            loan_deduction: Decimal::ZERO,
            already_paid: Decimal::ZERO,
        }
    }

    #[test]
    fn test_special_tier_adjusts_gross() {
        let values = evaluate(&inputs("100000", "12"), &policy()).unwrap();
        assert_eq!(values.adjusted_gross, dec("60000"));
        assert_eq!(values.register, dec("7200"));
    }

    #[test]
    fn test_base_tier_uses_gross() {
        let values = evaluate(&inputs("100000", "8.33"), &policy()).unwrap();
        assert_eq!(values.adjusted_gross, dec("100000"));
        assert_eq!(values.register, dec("8330"));
        assert_eq!(values.actual, dec("8330"));
        assert_eq!(values.reimbursement, Decimal::ZERO);
    }

    #[test]
    fn test_below_base_tier_keeps_gross() {
        let values = evaluate(&inputs("100000", "5"), &policy()).unwrap();
        assert_eq!(values.adjusted_gross, dec("100000"));
        assert_eq!(values.register, dec("5000"));
    }

    #[test]
    fn test_reimbursement_against_actual_percentage() {
        let mut i = inputs("100000", "12");
        i.actual_percentage = Some(dec("10"));
        let values = evaluate(&i, &policy()).unwrap();
        // actual = 100000 × 0.6 × 10% = 6000
        assert_eq!(values.actual, dec("6000"));
        assert_eq!(values.reimbursement, dec("1200"));

        i.actual_percentage = Some(dec("5"));
        let values = evaluate(&i, &policy()).unwrap();
        assert_eq!(values.actual, Decimal::ZERO);
        assert_eq!(values.reimbursement, dec("7200"));
    }

    #[test]
    fn test_paid_or_unpaid_status_zeroes_reimbursement() {
        let mut i = inputs("100000", "12");
        i.payment_status = Some(PaymentStatus::Paid);
        assert_eq!(evaluate(&i, &policy()).unwrap().reimbursement, Decimal::ZERO);

        i.payment_status = Some(PaymentStatus::Unpaid);
        assert_eq!(evaluate(&i, &policy()).unwrap().reimbursement, Decimal::ZERO);

        i.payment_status = Some(PaymentStatus::Other("on hold".to_string()));
        assert_ne!(evaluate(&i, &policy()).unwrap().reimbursement, Decimal::ZERO);
    }

    #[test]
    fn test_unpaid_from_ledger_and_forced_when_ineligible() {
        let mut i = inputs("100000", "10");
        i.unpaid_ledger = Some(dec("1500"));
        assert_eq!(evaluate(&i, &policy()).unwrap().unpaid, dec("1500"));

        i.eligible = false;
        let values = evaluate(&i, &policy()).unwrap();
        assert_eq!(values.unpaid, values.register);
        assert_eq!(values.final_payable, Decimal::ZERO);
    }

    #[test]
    fn test_final_payable_subtracts_every_deduction() {
        let mut i = inputs("100000", "8.33");
        i.unpaid_ledger = Some(dec("330"));
        i.loan_deduction = dec("2000");
        i.already_paid = dec("1000");
        assert_eq!(evaluate(&i, &policy()).unwrap().final_payable, dec("5000"));
    }

    #[test]
    fn test_register_rounded_to_cents() {
        let values = evaluate(&inputs("12345.67", "8.33"), &policy()).unwrap();
        // 12345.67 × 8.33 / 100 = 1028.394311
        assert_eq!(values.register, dec("1028.39"));
    }

    #[test]
    fn test_overflowing_gross_yields_none() {
        // 5e28 × 0.6 fits; × 12 does not.
        let huge = inputs("50000000000000000000000000000", "12");
        assert_eq!(evaluate(&huge, &policy()), None);
        assert_eq!(
            actual_entitlement(Decimal::MAX, dec("8.33"), &policy()),
            None
        );
    }

    #[test]
    fn test_overflowing_deductions_yield_none() {
        let mut i = inputs("100000", "8.33");
        i.loan_deduction = Decimal::MAX;
        i.already_paid = Decimal::MAX;
        assert_eq!(evaluate(&i, &policy()), None);
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!(PaymentStatus::parse("Paid"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::parse("due"), Some(PaymentStatus::Unpaid));
        assert_eq!(
            PaymentStatus::parse("On Hold"),
            Some(PaymentStatus::Other("On Hold".to_string()))
        );
        assert_eq!(PaymentStatus::parse("   "), None);
    }
}
