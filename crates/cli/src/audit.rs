//! `laudit run` / `laudit validate`: config-driven ledger audit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Args;

use ledger_audit::model::{AuditInput, AuditReport, Partition, PartitionOutcome, Table};
use ledger_audit::{load_csv_table, AuditConfig, AuditError};

use crate::exit_codes::{audit_exit_code, EXIT_AUDIT_INVALID_CONFIG, EXIT_AUDIT_RUNTIME, EXIT_SUCCESS};
use crate::export;
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the audit TOML config
    pub config: PathBuf,

    /// Output the JSON report to stdout instead of the human summary
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to file (overrides [output].json)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write annotated copies of each partition here (overrides [output].annotate_dir)
    #[arg(long)]
    pub annotate_dir: Option<PathBuf>,

    /// Write missing identifiers as CSV (overrides [output].missing_csv)
    #[arg(long)]
    pub missing_out: Option<PathBuf>,
}

fn audit_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn load_config(config_path: &Path) -> Result<AuditConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| audit_err(EXIT_AUDIT_RUNTIME, format!("cannot read config: {e}")))?;
    AuditConfig::from_toml(&config_str).map_err(|e| CliError {
        code: EXIT_AUDIT_INVALID_CONFIG,
        message: e.to_string(),
        hint: Some(format!("check {} with `laudit validate`", config_path.display())),
    })
}

fn read_table(base_dir: &Path, name: &str, file: &str, header_row: Option<usize>) -> Result<Table, AuditError> {
    let path = base_dir.join(file);
    let data = std::fs::read_to_string(&path)
        .map_err(|e| AuditError::Io(format!("cannot read {}: {e}", path.display())))?;
    load_csv_table(name, &data, header_row)
}

/// Load every configured table. File paths are relative to the config's
/// directory. Unreadable sources are left out (the engine treats them as
/// empty); unreadable partitions are carried as failures.
fn load_input(config: &AuditConfig, base_dir: &Path) -> AuditInput {
    let mut sources = HashMap::new();
    for (name, source) in &config.sources {
        match read_table(base_dir, name, &source.file, source.header_row) {
            Ok(table) => {
                sources.insert(name.clone(), table);
            }
            Err(e) => log::warn!("source '{name}': {e}"),
        }
    }

    let partitions = config
        .partitions
        .iter()
        .map(|p| Partition {
            name: p.name.clone(),
            table: read_table(base_dir, &p.name, &p.file, p.header_row),
        })
        .collect();

    AuditInput { partitions, sources }
}

/// A CLI flag wins; a config path is resolved against the config's directory.
fn output_path(flag: Option<PathBuf>, configured: Option<&String>, base_dir: &Path) -> Option<PathBuf> {
    flag.or_else(|| configured.map(|p| base_dir.join(p)))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes)
        .map_err(|e| audit_err(EXIT_AUDIT_RUNTIME, format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));

    let input = load_input(&config, base_dir);
    let report = ledger_audit::run(&config, &input).map_err(|e| audit_err(EXIT_AUDIT_RUNTIME, e.to_string()))?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| audit_err(EXIT_AUDIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(path) = output_path(args.output, config.output.json.as_ref(), base_dir) {
        write_file(&path, json_str.as_bytes())?;
    }

    if let Some(dir) = output_path(args.annotate_dir, config.output.annotate_dir.as_ref(), base_dir) {
        write_annotations(&dir, &input, &report)?;
    }

    if let Some(path) = output_path(args.missing_out, config.output.missing_csv.as_ref(), base_dir) {
        match report.missing {
            Some(ref missing) => write_file(&path, &export::missing_csv(missing)?)?,
            None => eprintln!("no missing-record result; {} not written", path.display()),
        }
    }

    if args.json {
        println!("{json_str}");
    } else {
        print_summary(&report);
    }

    let s = &report.summary;
    match audit_exit_code(s) {
        EXIT_SUCCESS => Ok(()),
        code if s.total_errors > 0 || s.missing_records > 0 => Err(audit_err(
            code,
            format!(
                "{} discrepancy(ies), {} missing record(s)",
                s.total_errors, s.missing_records
            ),
        )),
        code => Err(audit_err(code, format!("partial run: {} partition(s) failed", s.failed))),
    }
}

fn write_annotations(dir: &Path, input: &AuditInput, report: &AuditReport) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| audit_err(EXIT_AUDIT_RUNTIME, format!("cannot create {}: {e}", dir.display())))?;

    for partition in &input.partitions {
        let Ok(ref table) = partition.table else { continue };
        let Some(result) = report.partition(&partition.name).and_then(|o| o.result()) else {
            continue;
        };
        let bytes = export::annotated_csv(table, result)?;
        write_file(&dir.join(export::annotated_file_name(&partition.name)), &bytes)?;
    }
    Ok(())
}

fn print_summary(report: &AuditReport) {
    let s = &report.summary;
    eprintln!(
        "audit '{}': {} partition(s), {} row(s), {} error(s) in {} row(s)",
        report.meta.config_name, s.partitions, s.rows, s.total_errors, s.rows_with_errors,
    );

    for outcome in &report.partitions {
        match outcome {
            PartitionOutcome::Audited(r) if r.has_errors() => {
                eprintln!(
                    "  {}: {} error(s) in {} of {} row(s)",
                    r.partition,
                    r.total_errors,
                    r.error_rows.len(),
                    r.rows
                );
                for (field, count) in &r.field_errors {
                    eprintln!("    {field}: {count}");
                }
            }
            PartitionOutcome::Audited(r) => eprintln!("  {}: clean ({} row(s))", r.partition, r.rows),
            PartitionOutcome::Failed { partition, error } => eprintln!("  {partition}: FAILED ({error})"),
        }
    }

    if let Some(ref m) = report.missing {
        eprintln!(
            "missing: {} of {} '{}' record(s) absent from every partition",
            m.missing.len(),
            m.authoritative_count,
            m.authority
        );
    }

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: audit '{}' with {} partition(s), {} source(s), {} rule(s){}",
        config.name,
        config.partitions.len(),
        config.sources.len(),
        config.rules.len(),
        match config.authority {
            Some(ref a) => format!(", authority '{}'", a.source),
            None => String::new(),
        },
    );
    Ok(())
}
