//! Spreadsheet cell values.
//!
//! The engine never evaluates formulas. A cell is either a primitive value or
//! a formula carrying the result cached by whatever program last saved the
//! workbook. Amount and date extraction distinguish "explicitly zero" from
//! "absent": anything that cannot be read as a number is absent, never zero.

use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Date formats accepted for joining dates stored as text.
///
/// Two-digit-year variants come first: chrono's `%Y` accepts `25` as year 25,
/// so `01-05-25` would otherwise read as 0001-05-25. Parsed years before
/// [`MIN_TEXT_DATE_YEAR`] are rejected as well.
const TEXT_DATE_FORMATS: &[&str] = &[
    "%d-%m-%y",
    "%d/%m/%y",
    "%d.%m.%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Earliest year a text date may carry.
const MIN_TEXT_DATE_YEAR: i32 = 1900;

/// A formula cell with an optional cached result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormulaCell {
    /// The formula source, if the decoder kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// The value cached at last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<CellValue>>,
    /// Display text, if the decoder kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A single cell value as yielded by the spreadsheet source.
///
/// Deserializes from plain JSON: `null`, `true`, `1250.5`, `"1,250"`, or
/// `{ "result": 1250.5 }` for a formula cell.
///
/// # Example
///
/// ```
/// use bonus_recon::models::CellValue;
/// use rust_decimal::Decimal;
///
/// let cell: CellValue = serde_json::from_str("\"12,500\"").unwrap();
/// assert_eq!(cell.amount(), Some(Decimal::new(12500, 0)));
///
/// let placeholder = CellValue::Text("-".to_string());
/// assert_eq!(placeholder.amount(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value.
    #[default]
    Empty,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// Text.
    Text(String),
    /// A formula, possibly with a cached result.
    Formula(FormulaCell),
}

impl CellValue {
    /// Builds a formula cell whose cached result is `result`.
    pub fn formula_result(result: CellValue) -> Self {
        CellValue::Formula(FormulaCell {
            formula: None,
            result: Some(Box::new(result)),
            text: None,
        })
    }

    /// Returns true if the cell carries nothing readable.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Reads the cell as a monetary amount.
    ///
    /// Returns `None` for blank cells, the `-` placeholder, unparseable text,
    /// booleans, and formulas with neither a cached result nor text.
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            CellValue::Empty | CellValue::Bool(_) => None,
            CellValue::Number(n) => Decimal::from_f64(*n),
            CellValue::Text(s) => parse_amount_text(s),
            CellValue::Formula(f) => f
                .result
                .as_deref()
                .and_then(CellValue::amount)
                .or_else(|| f.text.as_deref().and_then(parse_amount_text)),
        }
    }

    /// Returns the cell's display text.
    ///
    /// Integral numbers render without a fractional part so numeric employee
    /// codes read as `1042`, not `1042.0`.
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Formula(f) => match f.result.as_deref() {
                Some(result) if !result.is_blank() => result.text(),
                _ => f.text.clone().unwrap_or_default(),
            },
        }
    }

    /// Reads the cell as a calendar date.
    ///
    /// Numbers are Excel serial dates in the 1900 date system. Text is tried
    /// against a fixed list of day-first and ISO formats.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Number(n) => excel_serial_to_date(*n),
            CellValue::Text(s) => parse_date_text(s),
            CellValue::Formula(f) => f
                .result
                .as_deref()
                .and_then(CellValue::as_date)
                .or_else(|| f.text.as_deref().and_then(parse_date_text)),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Parses amount text such as `"12,500"`, `" 1 200.50 "` or `"(300)"`.
fn parse_amount_text(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
        return None;
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '₹' | '$'))
        .collect();
    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // ISO date-times, as some decoders emit them.
    let date_part = match trimmed.find('T') {
        Some(idx) if idx == 10 => &trimmed[..idx],
        _ => trimmed,
    };

    let parsed = TEXT_DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .find(|date| date.year() >= MIN_TEXT_DATE_YEAR);
    if parsed.is_some() {
        return parsed;
    }

    date_part
        .parse::<f64>()
        .ok()
        .and_then(excel_serial_to_date)
}
