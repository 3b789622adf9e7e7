//! Bonus tier classification.
//!
//! An explicit per-employee percentage always wins. Otherwise the percentage
//! follows the policy's months-of-service steps, and employees past the last
//! step (or with no readable joining date) get the base percentage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{BonusPolicy, OverrideTable};
use crate::models::EmployeeKey;

/// Where a tier percentage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSource {
    /// A per-employee override.
    Override,
    /// The months-of-service steps.
    ServiceLength,
    /// The base tier, for lack of anything better.
    Default,
}

/// How a percentage relates to the base percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// Equal to the base percentage.
    Base,
    /// Above it; gross is adjusted by the special factor.
    Special,
    /// Below it.
    BelowBase,
}

impl TierKind {
    /// Classifies `percentage` against `base`.
    pub fn of(percentage: Decimal, base: Decimal) -> Self {
        match percentage.cmp(&base) {
            std::cmp::Ordering::Equal => TierKind::Base,
            std::cmp::Ordering::Greater => TierKind::Special,
            std::cmp::Ordering::Less => TierKind::BelowBase,
        }
    }
}

/// The bonus percentage applied to one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAssignment {
    /// The percentage (e.g. 8.33, 10, 12).
    pub percentage: Decimal,
    /// Where it came from.
    pub source: TierSource,
    /// How it relates to the base percentage.
    pub kind: TierKind,
}

/// Assigns the bonus percentage for one employee.
///
/// # Example
///
/// ```no_run
/// use bonus_recon::calculation::{classify, TierKind};
/// use bonus_recon::config::ConfigLoader;
/// use bonus_recon::models::EmployeeKey;
///
/// let loader = ConfigLoader::load("./config/bonus_2025").unwrap();
/// let config = loader.config();
/// let key = EmployeeKey::new("W2001").unwrap();
///
/// let tier = classify(&key, Some(14), config.overrides(), config.policy());
/// assert_eq!(tier.percentage.to_string(), "12");
/// assert_eq!(tier.kind, TierKind::Special);
/// ```
pub fn classify(
    employee_id: &EmployeeKey,
    months_of_service: Option<u32>,
    overrides: &OverrideTable,
    policy: &BonusPolicy,
) -> TierAssignment {
    let base = policy.base_percentage;

    let (percentage, source) = if let Some(custom) = overrides.custom_percentages.get(employee_id) {
        (*custom, TierSource::Override)
    } else if let Some(months) = months_of_service {
        let step = policy
            .service_tiers
            .iter()
            .find(|tier| months < tier.below_months)
            .map(|tier| tier.percentage)
            .unwrap_or(base);
        (step, TierSource::ServiceLength)
    } else {
        (base, TierSource::Default)
    };

    TierAssignment {
        percentage,
        source,
        kind: TierKind::of(percentage, base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceTier;
    use crate::models::{EmployeeCategory, MonthWindow};
    use chrono::NaiveDate;
    use proptest::prelude::*;
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
            service_tiers: vec![
                ServiceTier {
                    below_months: 12,
                    percentage: dec("10"),
                },
                ServiceTier {
                    below_months: 24,
                    percentage: dec("12"),
                },
            ],
            minimum_tenure_months: 6,
            tenure_restricted_category: EmployeeCategory::Worker,
            header_scan_rows: 15,
            excluded_months: vec![],
        }
    }

    fn key(s: &str) -> EmployeeKey {
        EmployeeKey::new(s).unwrap()
    }

    #[test]
    fn test_service_steps() {
        let overrides = OverrideTable::default();
        let at = |m| classify(&key("W1"), Some(m), &overrides, &policy()).percentage;
        assert_eq!(at(0), dec("10"));
        assert_eq!(at(11), dec("10"));
        assert_eq!(at(12), dec("12"));
        assert_eq!(at(23), dec("12"));
        assert_eq!(at(24), dec("8.33"));
        assert_eq!(at(120), dec("8.33"));
    }

    #[test]
    fn test_override_wins_unconditionally() {
        let mut overrides = OverrideTable::default();
        overrides.custom_percentages.insert(key("S1"), dec("8.33"));

        let tier = classify(&key("S1"), Some(3), &overrides, &policy());
        assert_eq!(tier.percentage, dec("8.33"));
        assert_eq!(tier.source, TierSource::Override);
        assert_eq!(tier.kind, TierKind::Base);
    }

    #[test]
    fn test_unknown_service_gets_base_tier() {
        let tier = classify(&key("S1"), None, &OverrideTable::default(), &policy());
        assert_eq!(tier.percentage, dec("8.33"));
        assert_eq!(tier.source, TierSource::Default);
    }

    #[test]
    fn test_tier_kinds() {
        assert_eq!(TierKind::of(dec("12"), dec("8.33")), TierKind::Special);
        assert_eq!(TierKind::of(dec("8.33"), dec("8.330")), TierKind::Base);
        assert_eq!(TierKind::of(dec("5"), dec("8.33")), TierKind::BelowBase);
    }

    proptest! {
        #[test]
        fn prop_long_service_never_below_base(months in 24u32..600) {
            let tier = classify(&key("S1"), Some(months), &OverrideTable::default(), &policy());
            prop_assert!(tier.percentage >= dec("8.33"));
            prop_assert_eq!(tier.kind, TierKind::Base);
        }
    }
}
