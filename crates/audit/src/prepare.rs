use std::collections::HashMap;

use crate::columns::find_col;
use crate::config::{reference_column, AuditConfig};
use crate::error::AuditError;
use crate::key::record_key;
use crate::model::Table;

/// A reference source projected to the fields the rule set needs, indexed
/// by normalized identifier. Built once per run, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTable {
    pub source: String,
    /// Rule field keywords this table resolved, parallel to each row.
    pub fields: Vec<String>,
    /// Namespaced column names (`ref_<source>_<field>`), parallel to `fields`.
    pub columns: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl PreparedTable {
    /// A table that matches nothing: every lookup is a miss.
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: Vec::new(),
            columns: Vec::new(),
            rows: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.rows.get(key).map(|r| r.as_slice())
    }

    /// Position of a field keyword within each row.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Project, namespace and deduplicate one reference source.
///
/// The first row wins for a repeated identifier; rows with a blank
/// identifier are dropped.
pub fn prepare_reference(
    source: &str,
    table: &Table,
    identifier: &str,
    fields: &[String],
) -> Result<PreparedTable, AuditError> {
    let key_col = find_col(&table.headers, identifier).ok_or_else(|| AuditError::MissingIdentifier {
        table: table.name.clone(),
        keyword: identifier.to_string(),
    })?;

    let projected: Vec<(&String, usize)> = fields
        .iter()
        .filter_map(|kw| find_col(&table.headers, kw).map(|idx| (kw, idx)))
        .collect();

    if projected.is_empty() {
        return Err(AuditError::NoReferenceFields {
            source: source.to_string(),
            fields: fields.to_vec(),
        });
    }

    let mut rows: HashMap<String, Vec<String>> = HashMap::new();
    for i in 0..table.len() {
        let key = record_key(table.cell(i, key_col));
        let Some(id) = key.as_id() else { continue };
        if rows.contains_key(id) {
            continue;
        }
        let values = projected
            .iter()
            .map(|(_, idx)| table.cell(i, *idx).to_string())
            .collect();
        rows.insert(id.to_string(), values);
    }

    Ok(PreparedTable {
        source: source.to_string(),
        fields: projected.iter().map(|(kw, _)| kw.to_string()).collect(),
        columns: projected.iter().map(|(kw, _)| reference_column(source, kw)).collect(),
        rows,
    })
}

/// Prepare every source the rule set references. A source that cannot be
/// prepared contributes an empty table and a warning; it never fails the run.
pub fn prepare_all(
    config: &AuditConfig,
    sources: &HashMap<String, Table>,
) -> (Vec<PreparedTable>, Vec<String>) {
    let mut tables = Vec::new();
    let mut warnings = Vec::new();

    for (source, fields) in config.required_fields() {
        let Some(table) = sources.get(&source) else {
            let msg = format!("source '{source}': no data loaded, all lookups will miss");
            log::warn!("{msg}");
            warnings.push(msg);
            tables.push(PreparedTable::empty(source));
            continue;
        };

        match prepare_reference(&source, table, config.source_identifier(&source), &fields) {
            Ok(prepared) => {
                log::info!(
                    "source '{}': {} identifier(s), {} column(s)",
                    source,
                    prepared.len(),
                    prepared.fields.len()
                );
                if prepared.fields.len() < fields.len() {
                    let missing: Vec<&str> = fields
                        .iter()
                        .filter(|kw| prepared.field_index(kw).is_none())
                        .map(|s| s.as_str())
                        .collect();
                    log::debug!("source '{}': unresolved fields {:?}", source, missing);
                }
                tables.push(prepared);
            }
            Err(e) => {
                let msg = format!("{e}; all lookups will miss");
                log::warn!("{msg}");
                warnings.push(msg);
                tables.push(PreparedTable::empty(source));
            }
        }
    }

    (tables, warnings)
}
