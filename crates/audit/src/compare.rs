use crate::config::Comparison;
use crate::join::RefValue;
use crate::normalize::{is_blank, normalize_date, normalize_num, normalize_text, DateValue, NumValue};

/// Absolute slack added to numeric tolerances to absorb float noise.
pub const NUMERIC_EPSILON: f64 = 1e-6;

/// Duration fields disagree once they are a whole unit apart.
pub const DURATION_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
    /// The reference source has no row for the record (lookup miss).
    NotComparable,
}

impl Verdict {
    pub fn is_mismatch(self) -> bool {
        self == Self::Mismatch
    }
}

fn verdict(mismatch: bool) -> Verdict {
    if mismatch {
        Verdict::Mismatch
    } else {
        Verdict::Match
    }
}

/// Compare a main cell against a joined reference cell. A lookup miss is
/// never a mismatch.
pub fn compare_ref(main: &str, reference: RefValue<'_>, comparison: Comparison) -> Verdict {
    match reference {
        RefValue::Miss => Verdict::NotComparable,
        RefValue::Value(r) => compare(main, r, comparison),
    }
}

/// Compare two raw cells under one comparison type.
pub fn compare(main: &str, reference: &str, comparison: Comparison) -> Verdict {
    match comparison {
        Comparison::Text => compare_text(main, reference),
        Comparison::Date => compare_date(main, reference),
        Comparison::Numeric { tolerance, multiplier } => {
            compare_num(main, reference, multiplier, |diff| diff > tolerance + NUMERIC_EPSILON)
        }
        Comparison::Duration { multiplier } => {
            compare_num(main, reference, multiplier, |diff| diff >= DURATION_THRESHOLD)
        }
    }
}

fn compare_text(main: &str, reference: &str) -> Verdict {
    if is_blank(main) && is_blank(reference) {
        return Verdict::Match;
    }
    verdict(normalize_text(main) != normalize_text(reference))
}

fn compare_date(main: &str, reference: &str) -> Verdict {
    match (normalize_date(main), normalize_date(reference)) {
        // a blank side carries nothing to disagree with
        (DateValue::Blank, _) | (_, DateValue::Blank) => Verdict::Match,
        (DateValue::Date(a), DateValue::Date(b)) => verdict(a != b),
        (DateValue::Date(_), DateValue::Unparsable) | (DateValue::Unparsable, DateValue::Date(_)) => {
            Verdict::Mismatch
        }
        (DateValue::Unparsable, DateValue::Unparsable) => Verdict::Mismatch,
    }
}

fn compare_num(
    main: &str,
    reference: &str,
    multiplier: f64,
    exceeds: impl Fn(f64) -> bool,
) -> Verdict {
    match (normalize_num(main), normalize_num(reference)) {
        (NumValue::Number(m), NumValue::Number(r)) => verdict(exceeds((m - r * multiplier).abs())),
        (NumValue::Number(_), NumValue::Text(_)) | (NumValue::Text(_), NumValue::Number(_)) => {
            Verdict::Mismatch
        }
        (NumValue::Absent, _) | (_, NumValue::Absent) => Verdict::Match,
        (NumValue::Text(_), NumValue::Text(_)) => Verdict::Match,
    }
}
