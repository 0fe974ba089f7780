use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::error::AuditError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A loaded table: header names plus data rows. Blank cells are `""`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Cell at (row, col), `""` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One monitored partition of the primary ledger. A load failure is carried
/// through so the run reports it alongside the partitions that did load.
#[derive(Debug)]
pub struct Partition {
    pub name: String,
    pub table: Result<Table, AuditError>,
}

/// Pre-loaded partitions and reference sources, keyed by source name.
#[derive(Debug, Default)]
pub struct AuditInput {
    pub partitions: Vec<Partition>,
    pub sources: HashMap<String, Table>,
}

// ---------------------------------------------------------------------------
// Per-partition results
// ---------------------------------------------------------------------------

/// One flagged cell: data-row index within the partition and the partition's
/// column header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ErrorLocation {
    pub record: usize,
    pub field: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditResult {
    pub partition: String,
    pub rows: usize,
    /// Sum over fields of flagged records; a record failing two fields counts twice.
    pub total_errors: usize,
    pub error_locations: BTreeSet<ErrorLocation>,
    pub error_rows: BTreeSet<usize>,
    /// Flagged-record count per partition column.
    pub field_errors: BTreeMap<String, usize>,
}

impl AuditResult {
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Flagged column names for one record, in column-name order.
    pub fn fields_for(&self, record: usize) -> Vec<&str> {
        self.error_locations
            .iter()
            .filter(|loc| loc.record == record)
            .map(|loc| loc.field.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartitionOutcome {
    Audited(AuditResult),
    Failed { partition: String, error: String },
}

impl PartitionOutcome {
    pub fn partition(&self) -> &str {
        match self {
            Self::Audited(r) => &r.partition,
            Self::Failed { partition, .. } => partition,
        }
    }

    pub fn result(&self) -> Option<&AuditResult> {
        match self {
            Self::Audited(r) => Some(r),
            Self::Failed { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cross-partition results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingRecordResult {
    pub authority: String,
    pub authoritative_count: usize,
    /// Sorted ascending by normalized identifier.
    pub missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSummary {
    pub partitions: usize,
    pub audited: usize,
    pub failed: usize,
    pub rows: usize,
    pub total_errors: usize,
    pub rows_with_errors: usize,
    pub missing_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub meta: AuditMeta,
    pub summary: AuditSummary,
    pub partitions: Vec<PartitionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingRecordResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AuditReport {
    pub fn partition(&self, name: &str) -> Option<&PartitionOutcome> {
        self.partitions.iter().find(|p| p.partition() == name)
    }
}
