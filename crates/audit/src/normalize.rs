//! Per-type value canonicalization.
//!
//! Each comparison type has its own notion of "absent": the text and date
//! normalizers use [`is_blank`] on the raw cell, while numeric parsing also
//! treats a lone dash as absent.

use chrono::{DateTime, NaiveDate, NaiveTime};
use unicode_normalization::UnicodeNormalization;

/// Tokens that spreadsheet exports write for an empty cell.
const NULL_TOKENS: &[&str] = &["nan", "none", "null"];

/// True for a cell that carries no value at all.
pub fn is_blank(raw: &str) -> bool {
    let s = raw.trim();
    s.is_empty() || NULL_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t))
}

// ---------------------------------------------------------------------------
// Numeric
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum NumValue {
    Absent,
    Number(f64),
    /// Not parseable as a number; the trimmed original is kept so that the
    /// comparison can report a type mismatch.
    Text(String),
}

/// Parse a ledger number: thousands separators and whitespace are ignored,
/// `"12.5%"` is `0.125`.
pub fn normalize_num(raw: &str) -> NumValue {
    if is_blank(raw) {
        return NumValue::Absent;
    }

    let cleaned: String = raw
        .nfkc()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("nan") {
        return NumValue::Absent;
    }

    let parsed = if cleaned.contains('%') {
        cleaned.replace('%', "").parse::<f64>().map(|v| v / 100.0)
    } else {
        cleaned.parse::<f64>()
    };

    match parsed {
        Ok(v) if v.is_nan() => NumValue::Absent,
        Ok(v) => NumValue::Number(v),
        Err(_) => NumValue::Text(raw.trim().to_string()),
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Fold a text cell for comparison: whitespace removed, NFKC, lowercase.
///
/// NFKC maps full-width Latin and digits, half-width katakana and CJK
/// compatibility ideographs onto one form, so `"ＡＢＣ１"` equals `"abc1"`.
pub fn normalize_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t' | ' ' | '\u{3000}'))
        .collect();
    stripped.nfkc().collect::<String>().to_lowercase().trim().to_string()
}

// ---------------------------------------------------------------------------
// Date
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Blank,
    Date(NaiveDate),
    Unparsable,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Parse a date cell; only year, month and day are significant.
pub fn normalize_date(raw: &str) -> DateValue {
    if is_blank(raw) {
        return DateValue::Blank;
    }
    match parse_calendar_date(raw.trim()) {
        Some(d) => DateValue::Date(d),
        None => DateValue::Unparsable,
    }
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let (date_part, time_part) = match s.find([' ', 'T']) {
        Some(pos) => (&s[..pos], s[pos + 1..].trim()),
        None => (s, ""),
    };

    if !time_part.is_empty()
        && !TIME_FORMATS
            .iter()
            .any(|fmt| NaiveTime::parse_from_str(time_part, fmt).is_ok())
    {
        return None;
    }

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date_part, "%Y%m%d").ok();
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
