use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AuditResult, ErrorLocation};
use crate::rules::FieldOutcome;

/// Collects field outcomes for one partition into an [`AuditResult`].
///
/// Every flagged (record, column) cell is counted once, however many rules
/// resolve to that column.
#[derive(Debug)]
pub struct Aggregator {
    partition: String,
    rows: usize,
    total_errors: usize,
    locations: BTreeSet<ErrorLocation>,
    error_rows: BTreeSet<usize>,
    field_errors: BTreeMap<String, usize>,
}

impl Aggregator {
    pub fn new(partition: impl Into<String>, rows: usize) -> Self {
        Self {
            partition: partition.into(),
            rows,
            total_errors: 0,
            locations: BTreeSet::new(),
            error_rows: BTreeSet::new(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn record_field(&mut self, outcome: &FieldOutcome) {
        for record in outcome.flagged() {
            let inserted = self.locations.insert(ErrorLocation {
                record,
                field: outcome.column.clone(),
            });
            if inserted {
                self.total_errors += 1;
                *self.field_errors.entry(outcome.column.clone()).or_insert(0) += 1;
            }
            self.error_rows.insert(record);
        }
    }

    pub fn finish(self) -> AuditResult {
        AuditResult {
            partition: self.partition,
            rows: self.rows,
            total_errors: self.total_errors,
            error_locations: self.locations,
            error_rows: self.error_rows,
            field_errors: self.field_errors,
        }
    }
}
