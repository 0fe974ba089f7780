use std::collections::HashMap;
use std::path::PathBuf;

use ledger_audit::load::load_csv_table;
use ledger_audit::model::{AuditInput, AuditReport, Partition, PartitionOutcome, Table};
use ledger_audit::{run, AuditConfig, AuditError};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_table(name: &str, file: &str, header_row: Option<usize>) -> Result<Table, AuditError> {
    let path = fixtures_dir().join(file);
    let data = std::fs::read_to_string(&path).map_err(|e| AuditError::Io(format!("{}: {e}", path.display())))?;
    load_csv_table(name, &data, header_row)
}

fn load_and_run(config_toml: &str) -> AuditReport {
    let config = AuditConfig::from_toml(config_toml).unwrap();

    let mut sources = HashMap::new();
    for (name, source) in &config.sources {
        if let Ok(table) = read_table(name, &source.file, source.header_row) {
            sources.insert(name.clone(), table);
        }
    }

    let partitions = config
        .partitions
        .iter()
        .map(|p| Partition {
            name: p.name.clone(),
            table: read_table(&p.name, &p.file, p.header_row),
        })
        .collect();

    run(&config, &AuditInput { partitions, sources }).unwrap()
}

fn fixture_config() -> String {
    std::fs::read_to_string(fixtures_dir().join("audit.toml")).unwrap()
}

// -------------------------------------------------------------------------
// Full run over the fixture ledgers
// -------------------------------------------------------------------------

#[test]
fn start_partition_errors() {
    let report = load_and_run(&fixture_config());
    let start = report.partition("start").unwrap().result().unwrap();

    assert_eq!(start.rows, 3);
    assert_eq!(start.total_errors, 3);
    assert_eq!(start.error_rows.iter().copied().collect::<Vec<_>>(), vec![1, 2]);

    // C002 principal off by 0.5, outside the 0.01 tolerance
    assert_eq!(start.fields_for(1), vec!["principal"]);
    // C003 start date a day late and 13 months against a one-year term
    assert_eq!(start.fields_for(2), vec!["start date", "term (months)"]);
    assert_eq!(start.field_errors.get("manager"), None);
    assert_eq!(start.field_errors.get("rate"), None);
}

#[test]
fn secondary_partition_clean() {
    let report = load_and_run(&fixture_config());
    let secondary = report.partition("secondary").unwrap().result().unwrap();

    // C006 has no reference rows at all; c001.0 normalizes to C001
    assert_eq!(secondary.rows, 3);
    assert!(!secondary.has_errors());
}

#[test]
fn missing_records_from_authority() {
    let report = load_and_run(&fixture_config());
    let missing = report.missing.as_ref().unwrap();

    assert_eq!(missing.authority, "commissions");
    assert_eq!(missing.authoritative_count, 5);
    assert_eq!(missing.missing, vec!["C004"]);
}

#[test]
fn summary_totals() {
    let report = load_and_run(&fixture_config());

    assert_eq!(report.meta.config_name, "Commission Audit");
    assert_eq!(report.summary.partitions, 2);
    assert_eq!(report.summary.audited, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.rows, 6);
    assert_eq!(report.summary.total_errors, 3);
    assert_eq!(report.summary.rows_with_errors, 2);
    assert_eq!(report.summary.missing_records, 1);
    assert!(report.warnings.is_empty());
}

// -------------------------------------------------------------------------
// Degraded runs
// -------------------------------------------------------------------------

#[test]
fn unreadable_and_keyless_partitions_fail_alone() {
    let toml = fixture_config().replace(
        "[authority]",
        r#"[[partitions]]
name = "lost"
file = "does-not-exist.csv"

[[partitions]]
name = "keyless"
file = "no-identifier.csv"

[authority]"#,
    );
    let report = load_and_run(&toml);

    assert_eq!(report.summary.partitions, 4);
    assert_eq!(report.summary.audited, 2);
    assert_eq!(report.summary.failed, 2);
    assert!(matches!(report.partition("lost"), Some(PartitionOutcome::Failed { .. })));
    match report.partition("keyless") {
        Some(PartitionOutcome::Failed { error, .. }) => assert!(error.contains("contract")),
        other => panic!("expected failure, got {other:?}"),
    }
    // audited partitions are unaffected
    assert_eq!(report.summary.total_errors, 3);
    assert_eq!(report.missing.unwrap().missing, vec!["C004"]);
}

#[test]
fn missing_reference_source_means_no_errors_from_it() {
    let toml = fixture_config().replace("file = \"loans.csv\"", "file = \"gone.csv\"");
    let report = load_and_run(&toml);

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("loans"));
    // only commission fields remain checkable, and they all agree
    assert_eq!(report.summary.total_errors, 0);
}

#[test]
fn placeholder_suppression_matters() {
    let toml = fixture_config().replace("ignore_placeholders = true\n", "");
    let report = load_and_run(&toml);
    let start = report.partition("start").unwrap().result().unwrap();

    // C003's commission rate is recorded as 0
    assert_eq!(start.field_errors.get("rate"), Some(&1));
    assert_eq!(start.total_errors, 4);
}

#[test]
fn report_serializes_with_status_tags() {
    let report = load_and_run(&fixture_config());
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["partitions"][0]["status"], "audited");
    assert_eq!(json["partitions"][0]["partition"], "start");
    assert_eq!(json["missing"]["missing"][0], "C004");
    assert!(json.get("warnings").is_none());
    assert!(json["meta"]["engine_version"].is_string());
}
