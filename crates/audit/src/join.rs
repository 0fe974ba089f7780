//! Left join of a partition against every prepared reference table.
//!
//! The join is a borrow-only view: records point into the partition and
//! into the prepared tables, nothing is copied per record.

use std::collections::HashMap;

use crate::key::{record_key, RecordKey};
use crate::model::Table;
use crate::prepare::PreparedTable;

/// A reference cell as seen from a joined record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefValue<'a> {
    /// The source has no row for this record's identifier.
    Miss,
    /// The source has a row; the cell may still be blank.
    Value(&'a str),
}

/// Resolved position of a reference field: (prepared table, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefColumn {
    table: usize,
    col: usize,
}

#[derive(Debug)]
pub struct JoinedRecord<'a> {
    pub index: usize,
    pub key: RecordKey,
    matches: Vec<Option<&'a [String]>>,
}

impl<'a> JoinedRecord<'a> {
    pub fn get(&self, column: RefColumn) -> RefValue<'a> {
        match self.matches[column.table] {
            Some(row) => RefValue::Value(row.get(column.col).map(|s| s.as_str()).unwrap_or("")),
            None => RefValue::Miss,
        }
    }
}

#[derive(Debug)]
pub struct JoinedTable<'a> {
    pub partition: &'a Table,
    pub records: Vec<JoinedRecord<'a>>,
    tables: &'a [PreparedTable],
    sources: HashMap<&'a str, usize>,
}

impl<'a> JoinedTable<'a> {
    /// Resolve a source's field keyword; `None` when the source is not
    /// prepared or did not resolve that field. Only the named source is
    /// consulted.
    pub fn column(&self, source: &str, field: &str) -> Option<RefColumn> {
        let table = *self.sources.get(source)?;
        let col = self.tables[table].field_index(field)?;
        Some(RefColumn { table, col })
    }

    pub fn main_value(&self, record: &JoinedRecord<'_>, col: usize) -> &'a str {
        self.partition.cell(record.index, col)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Join each partition record to every prepared table on its normalized key.
///
/// Tables are looked up independently, so their order never changes which
/// rows match. Empty keys match nothing.
pub fn join<'a>(partition: &'a Table, key_col: usize, tables: &'a [PreparedTable]) -> JoinedTable<'a> {
    let mut sources = HashMap::new();
    for (t, table) in tables.iter().enumerate() {
        sources.entry(table.source.as_str()).or_insert(t);
    }

    let records = (0..partition.len())
        .map(|index| {
            let key = record_key(partition.cell(index, key_col));
            let matches = tables
                .iter()
                .map(|table| key.as_id().and_then(|id| table.get(id)))
                .collect();
            JoinedRecord { index, key, matches }
        })
        .collect();

    JoinedTable {
        partition,
        records,
        tables,
        sources,
    }
}
