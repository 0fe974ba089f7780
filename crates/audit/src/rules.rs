use crate::columns::find_col;
use crate::compare::compare_ref;
use crate::config::Rule;
use crate::join::{JoinedTable, RefValue};

/// Per-record result of one rule over one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    /// Rule keyword.
    pub field: String,
    /// Partition column the keyword resolved to.
    pub column: String,
    /// One flag per record, in partition order.
    pub flags: Vec<bool>,
}

impl FieldOutcome {
    /// Indices of flagged records.
    pub fn flagged(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
    }

    pub fn error_count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }
}

fn is_placeholder(value: &str, tokens: &[String]) -> bool {
    let v = value.trim().to_lowercase();
    tokens.iter().any(|t| *t == v)
}

/// Evaluate one rule over a joined partition.
///
/// Returns `None` when the rule's field is not present in the partition.
/// A record fails the field if it disagrees with any one candidate, even
/// when another candidate agrees.
pub fn evaluate_rule(rule: &Rule, joined: &JoinedTable<'_>) -> Option<FieldOutcome> {
    let Some(main_col) = find_col(&joined.partition.headers, &rule.field) else {
        log::debug!(
            "partition '{}': no column for field '{}', rule skipped",
            joined.partition.name,
            rule.field
        );
        return None;
    };

    let mut flags = vec![false; joined.len()];

    for candidate in &rule.candidates {
        let Some(column) = joined.column(&candidate.source, &candidate.field) else {
            log::debug!(
                "partition '{}': reference column '{}' unavailable, candidate skipped",
                joined.partition.name,
                candidate.column()
            );
            continue;
        };

        for (flag, record) in flags.iter_mut().zip(&joined.records) {
            let main = joined.main_value(record, main_col);
            let reference = match (record.get(column), rule.placeholders.as_deref()) {
                // a placeholder carries no value to disagree with
                (RefValue::Value(v), Some(tokens)) if is_placeholder(v, tokens) => continue,
                (other, _) => other,
            };
            if compare_ref(main, reference, candidate.comparison).is_mismatch() {
                *flag = true;
            }
        }
    }

    Some(FieldOutcome {
        field: rule.field.clone(),
        column: joined.partition.headers[main_col].clone(),
        flags,
    })
}

/// Evaluate every rule whose field resolves in the partition.
pub fn evaluate_all(rules: &[Rule], joined: &JoinedTable<'_>) -> Vec<FieldOutcome> {
    rules
        .iter()
        .filter_map(|rule| evaluate_rule(rule, joined))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Candidate, Comparison};
    use crate::join::join;
    use crate::model::Table;
    use crate::prepare::{prepare_reference, PreparedTable};

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn prepared(source: &str, headers: &[&str], rows: &[&[&str]], fields: &[&str]) -> PreparedTable {
        let t = table(source, headers, rows);
        let fields: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
        prepare_reference(source, &t, "contract", &fields).unwrap()
    }

    fn candidate(source: &str, field: &str, comparison: Comparison) -> Candidate {
        Candidate {
            source: source.into(),
            field: field.into(),
            comparison,
        }
    }

    fn rule(field: &str, candidates: Vec<Candidate>) -> Rule {
        Rule {
            field: field.into(),
            candidates,
            placeholders: None,
        }
    }

    #[test]
    fn union_across_candidates() {
        // Matches the first source, disagrees with the second: the field fails.
        let main = table("p", &["contract", "start date"], &[&["A1", "2024-01-05"]]);
        let refs = vec![
            prepared("ec", &["contract", "start date"], &[&["A1", "2024-01-05"]], &["start date"]),
            prepared("product", &["contract", "start date"], &[&["A1", "2024-02-01"]], &["start date"]),
        ];
        let joined = join(&main, 0, &refs);
        let r = rule(
            "start date",
            vec![
                candidate("ec", "start date", Comparison::Date),
                candidate("product", "start date", Comparison::Date),
            ],
        );

        let outcome = evaluate_rule(&r, &joined).unwrap();
        assert_eq!(outcome.flags, vec![true]);
        assert_eq!(outcome.column, "start date");
    }

    #[test]
    fn agreement_with_all_candidates_passes() {
        let main = table("p", &["contract", "start date"], &[&["A1", "2024-01-05"]]);
        let refs = vec![
            prepared("ec", &["contract", "start date"], &[&["A1", "2024/01/05"]], &["start date"]),
            prepared("product", &["contract", "start date"], &[&["A1", "2024-01-05 00:00:00"]], &["start date"]),
        ];
        let joined = join(&main, 0, &refs);
        let r = rule(
            "start",
            vec![
                candidate("ec", "start date", Comparison::Date),
                candidate("product", "start date", Comparison::Date),
            ],
        );
        assert_eq!(evaluate_rule(&r, &joined).unwrap().flags, vec![false]);
    }

    #[test]
    fn lookup_miss_suppressed_but_blank_is_compared() {
        let main = table(
            "p",
            &["contract", "manager"],
            &[&["A1", "Li"], &["A2", "Wang"], &["A3", "Zhao"]],
        );
        let refs = vec![prepared(
            "fk",
            &["contract", "manager"],
            &[&["A1", "Li"], &["A2", ""]],
            &["manager"],
        )];
        let joined = join(&main, 0, &refs);
        let r = rule("manager", vec![candidate("fk", "manager", Comparison::Text)]);

        let outcome = evaluate_rule(&r, &joined).unwrap();
        // A2: present-but-blank reference disagrees; A3: no reference row
        assert_eq!(outcome.flags, vec![false, true, false]);
        assert_eq!(outcome.flagged().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn missing_main_column_skips_rule() {
        let main = table("p", &["contract", "amount"], &[&["A1", "1"]]);
        let refs = vec![prepared("fk", &["contract", "principal"], &[&["A1", "1"]], &["principal"])];
        let joined = join(&main, 0, &refs);
        let r = rule("principal", vec![candidate("fk", "principal", Comparison::Text)]);
        assert!(evaluate_rule(&r, &joined).is_none());
    }

    #[test]
    fn missing_reference_column_skips_candidate() {
        let main = table("p", &["contract", "principal"], &[&["A1", "1"]]);
        let refs = vec![prepared("fk", &["contract", "principal"], &[&["A1", "2"]], &["principal"])];
        let joined = join(&main, 0, &refs);
        let r = rule(
            "principal",
            vec![candidate("product", "principal", Comparison::Text)],
        );
        let outcome = evaluate_rule(&r, &joined).unwrap();
        assert_eq!(outcome.error_count(), 0);
    }

    #[test]
    fn placeholders_blank_reference_side() {
        let main = table("p", &["contract", "term"], &[&["A1", "36"], &["A2", "36"]]);
        let refs = vec![prepared(
            "product",
            &["contract", "term"],
            &[&["A1", "0.0"], &["A2", "NULL"]],
            &["term"],
        )];
        let joined = join(&main, 0, &refs);
        let mut r = rule(
            "term",
            vec![candidate("product", "term", Comparison::Duration { multiplier: 12.0 })],
        );

        // Without suppression "0.0" is a real value and disagrees.
        assert_eq!(evaluate_rule(&r, &joined).unwrap().flags, vec![true, false]);

        r.placeholders = Some(vec!["".into(), "none".into(), "null".into(), "0".into(), "0.0".into()]);
        assert_eq!(evaluate_rule(&r, &joined).unwrap().flags, vec![false, false]);
    }

    #[test]
    fn placeholders_never_flag_text_fields() {
        let main = table(
            "p",
            &["contract", "manager"],
            &[&["A1", "Li"], &["A2", "Wang"], &["A3", "Zhao"]],
        );
        let refs = vec![prepared(
            "fk",
            &["contract", "manager"],
            &[&["A1", "None"], &["A2", "0"], &["A3", "Chen"]],
            &["manager"],
        )];
        let joined = join(&main, 0, &refs);
        let mut r = rule("manager", vec![candidate("fk", "manager", Comparison::Text)]);
        assert_eq!(evaluate_rule(&r, &joined).unwrap().flags, vec![true, true, true]);

        r.placeholders = Some(vec!["none".into(), "0".into()]);
        // a real reference value still disagrees
        assert_eq!(evaluate_rule(&r, &joined).unwrap().flags, vec![false, false, true]);
    }

    #[test]
    fn candidate_reads_only_its_own_source() {
        // sources `a` and `a_b` both namespace a field as `ref_a_b_x`
        let main = table("p", &["contract", "x"], &[&["K1", "5"]]);
        let refs = vec![
            prepared("a", &["contract", "b_x"], &[&["K1", "999"]], &["b_x"]),
            prepared("a_b", &["contract", "x"], &[&["K1", "5"]], &["x"]),
        ];
        let joined = join(&main, 0, &refs);
        let r = rule(
            "x",
            vec![candidate("a_b", "x", Comparison::Numeric { tolerance: 0.0, multiplier: 1.0 })],
        );
        assert_eq!(evaluate_rule(&r, &joined).unwrap().flags, vec![false]);
    }

    #[test]
    fn evaluate_all_skips_unresolved() {
        let main = table("p", &["contract", "principal"], &[&["A1", "1"]]);
        let refs = vec![prepared("fk", &["contract", "principal"], &[&["A1", "2"]], &["principal"])];
        let joined = join(&main, 0, &refs);
        let rules = vec![
            rule(
                "principal",
                vec![candidate("fk", "principal", Comparison::Numeric { tolerance: 0.0, multiplier: 1.0 })],
            ),
            rule("ghost", vec![candidate("fk", "principal", Comparison::Text)]),
        ];
        let outcomes = evaluate_all(&rules, &joined);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].flags, vec![true]);
    }
}
