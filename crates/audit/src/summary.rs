use crate::model::{AuditSummary, MissingRecordResult, PartitionOutcome};

/// Roll partition outcomes and the missing-record check into run totals.
pub fn compute_summary(outcomes: &[PartitionOutcome], missing: Option<&MissingRecordResult>) -> AuditSummary {
    let mut summary = AuditSummary {
        partitions: outcomes.len(),
        missing_records: missing.map_or(0, |m| m.missing.len()),
        ..AuditSummary::default()
    };

    for outcome in outcomes {
        match outcome {
            PartitionOutcome::Audited(r) => {
                summary.audited += 1;
                summary.rows += r.rows;
                summary.total_errors += r.total_errors;
                summary.rows_with_errors += r.error_rows.len();
            }
            PartitionOutcome::Failed { .. } => summary.failed += 1,
        }
    }

    summary
}
