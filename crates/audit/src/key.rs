//! Record identifier normalization.
//!
//! Identifiers come from several independently maintained tables and carry
//! the usual export noise: numeric coercion (`"20240105.0"`), padding, mixed
//! case and full-width dashes typed through CJK input methods. Every join and
//! every missing-record check goes through [`normalize_key`] so that all
//! tables agree on one canonical spelling.

use std::fmt;

use serde::Serialize;

/// Dash code points folded to ASCII `-`.
const DASH_VARIANTS: &[char] = &[
    '\u{FF0D}', // fullwidth hyphen-minus
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}',
    '\u{2212}', // minus sign
    '\u{FE63}', // small hyphen-minus
];

/// Canonical string form of an identifier.
///
/// Trims, drops trailing `.0` artifacts, uppercases and folds dash variants.
/// Idempotent: `normalize_key(&normalize_key(x)) == normalize_key(x)`.
pub fn normalize_key(raw: &str) -> String {
    let mut s = raw.trim();
    while let Some(stripped) = s.strip_suffix(".0") {
        s = stripped.trim_end();
    }

    s.to_uppercase()
        .chars()
        .map(|c| if DASH_VARIANTS.contains(&c) { '-' } else { c })
        .collect()
}

/// A normalized identifier, or the explicit empty sentinel.
///
/// `Empty` never equals anything for join purposes: callers must use
/// [`RecordKey::as_id`] before indexing, which yields `None` for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RecordKey {
    Empty,
    Id(String),
}

impl RecordKey {
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Id(id) => Some(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Normalize a raw cell into a [`RecordKey`].
pub fn record_key(raw: &str) -> RecordKey {
    let normalized = normalize_key(raw);
    if normalized.is_empty() {
        RecordKey::Empty
    } else {
        RecordKey::Id(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn equivalent_spellings_collapse() {
        let a = normalize_key(" a-123 ");
        assert_eq!(a, "A-123");
        assert_eq!(normalize_key("A-123"), a);
        assert_eq!(normalize_key("A－123"), a);
        assert_eq!(normalize_key("a—123"), a);
    }

    #[test]
    fn strips_numeric_coercion_suffix() {
        assert_eq!(normalize_key("20240105.0"), "20240105");
        assert_eq!(normalize_key("7.0 "), "7");
        assert_eq!(normalize_key("7 .0"), "7");
        assert_eq!(normalize_key("1.0.0"), "1");
        // only the exact ".0" artifact, not other decimals
        assert_eq!(normalize_key("1.00"), "1.00");
        assert_eq!(normalize_key("1.05"), "1.05");
    }

    #[test]
    fn blank_is_empty_sentinel() {
        assert_eq!(record_key(""), RecordKey::Empty);
        assert_eq!(record_key("   "), RecordKey::Empty);
        assert_eq!(record_key(".0"), RecordKey::Empty);
        assert!(record_key("\u{3000}").is_empty());
        assert_eq!(RecordKey::Empty.as_id(), None);
    }

    #[test]
    fn id_round_trips_through_as_id() {
        let key = record_key(" c001 ");
        assert_eq!(key.as_id(), Some("C001"));
        assert_eq!(key.to_string(), "C001");
    }

    proptest! {
        #[test]
        fn normalize_key_is_idempotent(raw in "[ a-zA-Z0-9.\\-－—\u{3000}]{0,24}") {
            let once = normalize_key(&raw);
            prop_assert_eq!(normalize_key(&once), once);
        }

        #[test]
        fn record_key_agrees_with_normalize_key(raw in "[ a-z0-9.\\-]{0,16}") {
            match record_key(&raw) {
                RecordKey::Empty => prop_assert!(normalize_key(&raw).is_empty()),
                RecordKey::Id(id) => prop_assert_eq!(id, normalize_key(&raw)),
            }
        }
    }
}
