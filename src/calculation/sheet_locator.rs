//! Header-row discovery, column lookup, and month keys from sheet names.
//!
//! Source workbooks are maintained by hand, so headers drift: extra spaces,
//! line breaks, punctuation, different capitalization. All comparisons here
//! run on normalized text (lower-cased, alphanumerics only).

use crate::config::ColumnRef;
use crate::models::{CellValue, MonthKey};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Normalizes a header label or cell text for comparison.
///
/// # Example
///
/// ```
/// use bonus_recon::calculation::normalize_label;
///
/// assert_eq!(normalize_label(" Emp. Code\n"), "empcode");
/// assert_eq!(normalize_label("Gross-Salary (₹)"), "grosssalary");
/// ```
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn label_matches(cell: &str, label: &str) -> bool {
    !label.is_empty() && (cell == label || cell.contains(label))
}

/// Finds the header row among the first `scan_rows` rows.
///
/// A row is the header when, for at least one candidate set, every label of
/// the set matches some cell of the row. Returns the first such row.
///
/// # Example
///
/// ```
/// use bonus_recon::calculation::find_header_row;
/// use bonus_recon::models::CellValue;
///
/// let rows = vec![
///     vec![CellValue::from("ACME Ltd - Salary Register")],
///     vec![CellValue::from("Emp Code"), CellValue::from("Employee Name")],
/// ];
/// let sets = vec![vec!["code".to_string(), "name".to_string()]];
/// assert_eq!(find_header_row(&rows, &sets, 10), Some(1));
/// ```
pub fn find_header_row(
    rows: &[Vec<CellValue>],
    candidate_sets: &[Vec<String>],
    scan_rows: usize,
) -> Option<usize> {
    let normalized_sets: Vec<Vec<String>> = candidate_sets
        .iter()
        .map(|set| set.iter().map(|label| normalize_label(label)).collect())
        .filter(|set: &Vec<String>| !set.is_empty())
        .collect();

    rows.iter().take(scan_rows).position(|row| {
        let cells: Vec<String> = row.iter().map(|c| normalize_label(&c.text())).collect();
        normalized_sets.iter().any(|set| {
            set.iter()
                .all(|label| cells.iter().any(|cell| label_matches(cell, label)))
        })
    })
}

/// Finds a column in a header row by its candidate labels.
///
/// Exact matches are preferred over containment, and earlier candidates over
/// later ones; among equals the leftmost column wins.
pub fn find_column<S: AsRef<str>>(header: &[CellValue], candidates: &[S]) -> Option<usize> {
    let cells: Vec<String> = header.iter().map(|c| normalize_label(&c.text())).collect();
    let labels: Vec<String> = candidates
        .iter()
        .map(|c| normalize_label(c.as_ref()))
        .filter(|l| !l.is_empty())
        .collect();

    labels
        .iter()
        .find_map(|label| cells.iter().position(|cell| cell == label))
        .or_else(|| {
            labels
                .iter()
                .find_map(|label| cells.iter().position(|cell| cell.contains(label.as_str())))
        })
}

/// Resolves a configured column reference against a header row.
pub fn resolve_column(header: &[CellValue], column: &ColumnRef) -> Option<usize> {
    match column {
        ColumnRef::Index(index) => Some(*index),
        other => find_column(header, &other.labels()),
    }
}

/// Derives the month a worksheet covers from its name.
///
/// Tries a numeric `YYYY-MM` (or `MM-YYYY`) pattern first, then a month name
/// with a two- or four-digit year. Returns `None` rather than guessing.
///
/// # Example
///
/// ```
/// use bonus_recon::calculation::month_key_from_sheet_name;
///
/// let key = |s| month_key_from_sheet_name(s).map(|k| k.to_string());
/// assert_eq!(key("2025-03"), Some("2025-03".to_string()));
/// assert_eq!(key("Salary Sept 2025"), Some("2025-09".to_string()));
/// assert_eq!(key("Oct24"), Some("2024-10".to_string()));
/// assert_eq!(key("Summary"), None);
/// ```
pub fn month_key_from_sheet_name(name: &str) -> Option<MonthKey> {
    numeric_month_key(name).or_else(|| named_month_key(name))
}

/// A maximal run of ASCII digits and where it sits in the name.
struct DigitRun<'a> {
    digits: &'a str,
    start: usize,
    end: usize,
}

fn digit_runs(name: &str) -> Vec<DigitRun<'_>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (idx, ch) in name.char_indices() {
        match (ch.is_ascii_digit(), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                runs.push(DigitRun {
                    digits: &name[s..idx],
                    start: s,
                    end: idx,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(DigitRun {
            digits: &name[s..],
            start: s,
            end: name.len(),
        });
    }
    runs
}

fn four_digit_year(digits: &str) -> Option<i32> {
    if digits.len() != 4 {
        return None;
    }
    digits
        .parse::<i32>()
        .ok()
        .filter(|y| (1900..=2100).contains(y))
}

fn month_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    digits.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

fn numeric_month_key(name: &str) -> Option<MonthKey> {
    let runs = digit_runs(name);
    runs.windows(2).find_map(|pair| {
        let (first, second) = (&pair[0], &pair[1]);
        let between = &name[first.end..second.start];
        if !matches!(between, "-" | "_" | "/" | ".") {
            return None;
        }
        if let (Some(year), Some(month)) = (four_digit_year(first.digits), month_number(second.digits)) {
            return MonthKey::new(year, month);
        }
        if let (Some(month), Some(year)) = (month_number(first.digits), four_digit_year(second.digits)) {
            return MonthKey::new(year, month);
        }
        None
    })
}

enum Token {
    Alpha(String),
    Digits(String),
}

fn tokenize(name: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() {
            flush(&mut tokens, &mut current, current_is_digit);
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut tokens, &mut current, current_is_digit);
        }
        current_is_digit = is_digit;
        current.push(ch.to_ascii_lowercase());
    }
    flush(&mut tokens, &mut current, current_is_digit);
    tokens
}

fn flush(tokens: &mut Vec<Token>, current: &mut String, is_digit: bool) {
    if current.is_empty() {
        return;
    }
    let text = std::mem::take(current);
    tokens.push(if is_digit {
        Token::Digits(text)
    } else {
        Token::Alpha(text)
    });
}

fn month_from_word(word: &str) -> Option<u32> {
    if word.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|month| month.starts_with(word))
        .map(|idx| idx as u32 + 1)
}

fn year_from_digits(digits: &str) -> Option<i32> {
    match digits.len() {
        2 => digits.parse::<i32>().ok().map(|y| 2000 + y),
        4 => four_digit_year(digits),
        _ => None,
    }
}

fn named_month_key(name: &str) -> Option<MonthKey> {
    let tokens = tokenize(name);

    let (month_idx, month) = tokens.iter().enumerate().find_map(|(idx, token)| match token {
        Token::Alpha(word) => month_from_word(word).map(|m| (idx, m)),
        Token::Digits(_) => None,
    })?;

    let year_at = |idx: usize| match &tokens[idx] {
        Token::Digits(digits) => year_from_digits(digits),
        Token::Alpha(_) => None,
    };

    let year = (month_idx + 1..tokens.len())
        .find_map(year_at)
        .or_else(|| (0..month_idx).rev().find_map(year_at))?;

    MonthKey::new(year, month)
}
