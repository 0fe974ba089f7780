//! CLI Exit Code Registry
//!
//! Single source of truth for `laudit` exit codes. Scripts and schedulers
//! branch on these, so treat them as part of the shell contract.
//!
//! | Code | Meaning                                                    |
//! |------|------------------------------------------------------------|
//! | 0    | Audit ran; no discrepancies, no missing records            |
//! | 1    | Discrepancies or missing records found                     |
//! | 2    | Usage error (bad arguments)                                |
//! | 3    | Invalid config (parse or validation)                       |
//! | 4    | Runtime error (config unreadable, output not writable)     |
//! | 5    | Partial run: some partitions failed, nothing else found    |
//!
//! Findings outrank a partial run: a run that both failed a partition and
//! found discrepancies exits 1.

use ledger_audit::model::AuditSummary;

/// Success - audit ran clean.
pub const EXIT_SUCCESS: u8 = 0;

/// Field discrepancies or missing records. Like `diff(1)`, 1 means "differs".
pub const EXIT_AUDIT_FINDINGS: u8 = 1;

/// Usage error - bad arguments, missing subcommand.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_AUDIT_INVALID_CONFIG: u8 = 3;

/// IO failure outside the per-partition isolation (config, outputs).
pub const EXIT_AUDIT_RUNTIME: u8 = 4;

/// At least one partition could not be audited.
pub const EXIT_AUDIT_PARTIAL: u8 = 5;

/// Map a finished run to its exit code.
pub fn audit_exit_code(summary: &AuditSummary) -> u8 {
    if summary.total_errors > 0 || summary.missing_records > 0 {
        EXIT_AUDIT_FINDINGS
    } else if summary.failed > 0 {
        EXIT_AUDIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}
