//! `ledger-audit`: cross-source field audit for tabular ledgers.
//!
//! Pure engine crate: receives pre-loaded tables, returns per-partition
//! error locations and the set of authoritative records no partition carries.
//! File handling and output writing live in the CLI.

pub mod aggregate;
pub mod columns;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod join;
pub mod key;
pub mod load;
pub mod missing;
pub mod model;
pub mod normalize;
pub mod prepare;
pub mod rules;
pub mod summary;

pub use config::AuditConfig;
pub use engine::run;
pub use error::AuditError;
pub use key::normalize_key;
pub use load::load_csv_table;
pub use model::{AuditInput, AuditReport, AuditResult, MissingRecordResult, Partition, PartitionOutcome, Table};
