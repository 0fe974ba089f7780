use std::collections::{BTreeSet, HashSet};

use crate::columns::find_col;
use crate::error::AuditError;
use crate::key::{record_key, RecordKey};
use crate::model::{MissingRecordResult, Table};

/// Normalized, deduplicated identifier set of the authoritative source.
pub fn authoritative_keys(table: &Table, identifier: &str) -> Result<BTreeSet<String>, AuditError> {
    let key_col = find_col(&table.headers, identifier).ok_or_else(|| AuditError::MissingIdentifier {
        table: table.name.clone(),
        keyword: identifier.to_string(),
    })?;

    Ok((0..table.len())
        .filter_map(|i| match record_key(table.cell(i, key_col)) {
            RecordKey::Id(id) => Some(id),
            RecordKey::Empty => None,
        })
        .collect())
}

/// Union of identifiers read from every audited partition.
#[derive(Debug, Default)]
pub struct ObservedKeys {
    keys: HashSet<String>,
}

impl ObservedKeys {
    pub fn insert(&mut self, key: &RecordKey) {
        if let Some(id) = key.as_id() {
            self.keys.insert(id.to_string());
        }
    }

    /// Observe every row of a partition, whatever its audit outcome.
    pub fn observe_table(&mut self, table: &Table, key_col: usize) {
        for i in 0..table.len() {
            self.insert(&record_key(table.cell(i, key_col)));
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains(id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Identifiers of the authoritative source absent from every partition,
/// sorted ascending.
pub fn detect_missing(
    authority: &str,
    authoritative: &BTreeSet<String>,
    observed: &ObservedKeys,
) -> MissingRecordResult {
    MissingRecordResult {
        authority: authority.to_string(),
        authoritative_count: authoritative.len(),
        missing: authoritative
            .iter()
            .filter(|id| !observed.contains(id))
            .cloned()
            .collect(),
    }
}
