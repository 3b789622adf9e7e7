//! Month keys and the averaging window.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A calendar month, normalized to `YYYY-MM`.
///
/// # Example
///
/// ```
/// use bonus_recon::models::MonthKey;
///
/// let key: MonthKey = "2024-11".parse().unwrap();
/// assert_eq!(key.succ().to_string(), "2024-12");
/// assert_eq!(key.succ().succ().to_string(), "2025-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a month key, or `None` if `month` is not in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, `1..=12`.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        MonthKey::new(year, month).ok_or_else(|| format!("month out of range in '{}'", s))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// The run of actual (fully elapsed) months whose salaries feed the bonus.
///
/// The month right after the window is the projected, partially elapsed
/// month. The last month of the window is the anchor the projector requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    /// The first actual month.
    pub first_month: MonthKey,
    /// Number of actual months (eleven in the standard bonus year).
    pub actual_months: u32,
}

impl MonthWindow {
    /// Creates a window of `actual_months` months starting at `first_month`.
    pub fn new(first_month: MonthKey, actual_months: u32) -> Self {
        Self {
            first_month,
            actual_months,
        }
    }

    /// The actual months, oldest first.
    pub fn months(&self) -> Vec<MonthKey> {
        let mut months = Vec::with_capacity(self.actual_months as usize);
        let mut current = self.first_month;
        for _ in 0..self.actual_months {
            months.push(current);
            current = current.succ();
        }
        months
    }

    /// The last actual month (the projection anchor).
    pub fn last_month(&self) -> MonthKey {
        self.months()
            .last()
            .copied()
            .unwrap_or_else(|| self.first_month.pred())
    }

    /// The projected month, right after the window.
    pub fn projected_month(&self) -> MonthKey {
        self.last_month().succ()
    }

    /// Returns true if `month` is one of the actual months.
    pub fn contains(&self, month: MonthKey) -> bool {
        month >= self.first_month && month <= self.last_month()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_zero_pads() {
        assert_eq!(MonthKey::new(2025, 3).unwrap().to_string(), "2025-03");
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(MonthKey::new(2025, 13).is_none());
        assert!(MonthKey::new(2025, 0).is_none());
        assert!("2025-13".parse::<MonthKey>().is_err());
        assert!("Nov 2024".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_pred_wraps_year() {
        assert_eq!(key("2025-01").pred(), key("2024-12"));
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(key("2024-12") < key("2025-01"));
        assert!(key("2025-02") > key("2025-01"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&key("2024-11")).unwrap();
        assert_eq!(json, "\"2024-11\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2024-11"));
    }

    #[test]
    fn test_bonus_year_window() {
        let window = MonthWindow::new(key("2024-11"), 11);
        let months = window.months();
        assert_eq!(months.len(), 11);
        assert_eq!(months[0], key("2024-11"));
        assert_eq!(window.last_month(), key("2025-09"));
        assert_eq!(window.projected_month(), key("2025-10"));
        assert!(window.contains(key("2025-01")));
        assert!(!window.contains(key("2025-10")));
        assert!(!window.contains(key("2024-10")));
    }
}
