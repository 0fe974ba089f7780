//! CSV exports of an audit run.
//!
//! - annotated partition: original headers and rows plus `audit_errors`
//!   (failing columns, `;`-joined) and `audit_flag` (`ERROR` on flagged rows)
//! - missing records: one `missing_identifier` column

use ledger_audit::model::{AuditResult, MissingRecordResult, Table};

use crate::exit_codes::EXIT_AUDIT_RUNTIME;
use crate::CliError;

pub const ERRORS_COLUMN: &str = "audit_errors";
pub const FLAG_COLUMN: &str = "audit_flag";
pub const FLAG_ERROR: &str = "ERROR";
pub const MISSING_COLUMN: &str = "missing_identifier";

fn csv_err(e: impl std::fmt::Display) -> CliError {
    CliError {
        code: EXIT_AUDIT_RUNTIME,
        message: format!("CSV write error: {e}"),
        hint: None,
    }
}

/// Render a partition with its audit annotations.
pub fn annotated_csv(table: &Table, result: &AuditResult) -> Result<Vec<u8>, CliError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = table.headers.iter().map(|h| h.as_str()).collect();
    header.push(ERRORS_COLUMN);
    header.push(FLAG_COLUMN);
    writer.write_record(&header).map_err(csv_err)?;

    for (i, row) in table.rows.iter().enumerate() {
        let fields = result.fields_for(i);
        let flag = if fields.is_empty() { "" } else { FLAG_ERROR };
        let errors = fields.join(";");

        let mut record: Vec<&str> = row.iter().map(|c| c.as_str()).collect();
        record.push(&errors);
        record.push(flag);
        writer.write_record(&record).map_err(csv_err)?;
    }

    writer.into_inner().map_err(csv_err)
}

/// Render the missing-record list.
pub fn missing_csv(missing: &MissingRecordResult) -> Result<Vec<u8>, CliError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record([MISSING_COLUMN]).map_err(csv_err)?;
    for id in &missing.missing {
        writer.write_record([id]).map_err(csv_err)?;
    }
    writer.into_inner().map_err(csv_err)
}

/// File name for a partition's annotated copy. Letters and digits of any
/// script are kept (ledger sheets are often named in CJK); anything else
/// becomes `_` so a partition name cannot escape the output directory.
pub fn annotated_file_name(partition: &str) -> String {
    let stem: String = partition
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{stem}.audit.csv")
}
