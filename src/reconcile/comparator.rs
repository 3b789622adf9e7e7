//! Absolute-tolerance comparison of Software and HR values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::MatchStatus;

/// The result of comparing two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// `software - hr`.
    pub difference: Decimal,
    /// `Match` when the absolute difference is within tolerance.
    pub status: MatchStatus,
}

/// Compares a Software value with its HR counterpart.
///
/// `Match` and `Mismatch` are the normal outcomes; the pipeline raises
/// `Error` for business-rule violations. A difference outside the decimal
/// range is reported saturated with status `Error`.
///
/// # Example
///
/// ```
/// use bonus_recon::models::MatchStatus;
/// use bonus_recon::reconcile::compare;
/// use rust_decimal::Decimal;
///
/// let tolerance = Decimal::new(12, 0);
/// let within = compare(Decimal::new(1000, 0), Decimal::new(990, 0), tolerance);
/// assert_eq!(within.status, MatchStatus::Match);
/// assert_eq!(within.difference, Decimal::new(10, 0));
///
/// let outside = compare(Decimal::new(1000, 0), Decimal::new(980, 0), tolerance);
/// assert_eq!(outside.status, MatchStatus::Mismatch);
/// ```
pub fn compare(software: Decimal, hr: Decimal, tolerance: Decimal) -> Comparison {
    let Some(difference) = software.checked_sub(hr) else {
        return Comparison {
            difference: software.saturating_sub(hr),
            status: MatchStatus::Error,
        };
    };
    let status = if difference.abs() <= tolerance {
        MatchStatus::Match
    } else {
        MatchStatus::Mismatch
    };
    Comparison { difference, status }
}
