use crate::aggregate::Aggregator;
use crate::columns::find_col;
use crate::config::{AuditConfig, Rule};
use crate::error::AuditError;
use crate::join::join;
use crate::missing::{authoritative_keys, detect_missing, ObservedKeys};
use crate::model::{
    AuditInput, AuditMeta, AuditReport, AuditResult, MissingRecordResult, Partition, PartitionOutcome, Table,
};
use crate::prepare::{prepare_all, PreparedTable};
use crate::rules::evaluate_all;
use crate::summary::compute_summary;

/// Run the audit per config. Partition failures are reported in the result;
/// only a run with no partitions at all is an error.
pub fn run(config: &AuditConfig, input: &AuditInput) -> Result<AuditReport, AuditError> {
    if input.partitions.is_empty() {
        return Err(AuditError::ConfigValidation("no partitions to audit".into()));
    }

    let (prepared, mut warnings) = prepare_all(config, &input.sources);

    let mut observed = ObservedKeys::default();
    let mut partitions = Vec::with_capacity(input.partitions.len());
    for partition in &input.partitions {
        let outcome = match audit_partition(config, partition, &prepared, &mut observed) {
            Ok(result) => {
                log::info!(
                    "partition '{}': {} row(s), {} error(s) in {} row(s)",
                    result.partition,
                    result.rows,
                    result.total_errors,
                    result.error_rows.len()
                );
                PartitionOutcome::Audited(result)
            }
            Err(e) => {
                log::warn!("partition '{}' skipped: {e}", partition.name);
                PartitionOutcome::Failed {
                    partition: partition.name.clone(),
                    error: e.to_string(),
                }
            }
        };
        partitions.push(outcome);
    }

    let missing = match detect_missing_records(config, input, &observed) {
        Ok(missing) => missing,
        Err(e) => {
            let msg = format!("missing-record check skipped: {e}");
            log::warn!("{msg}");
            warnings.push(msg);
            None
        }
    };

    let summary = compute_summary(&partitions, missing.as_ref());

    Ok(AuditReport {
        meta: AuditMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        partitions,
        missing,
        warnings,
    })
}

fn audit_partition(
    config: &AuditConfig,
    partition: &Partition,
    prepared: &[PreparedTable],
    observed: &mut ObservedKeys,
) -> Result<AuditResult, AuditError> {
    let table = partition.table.as_ref().map_err(Clone::clone)?;

    let identifier = config
        .partitions
        .iter()
        .find(|p| p.name == partition.name)
        .map(|p| config.partition_identifier(p))
        .unwrap_or(&config.identifier);

    let key_col = find_col(&table.headers, identifier).ok_or_else(|| AuditError::MissingIdentifier {
        table: partition.name.clone(),
        keyword: identifier.to_string(),
    })?;

    observed.observe_table(table, key_col);

    let mut result = audit_table(table, key_col, &config.rules, prepared);
    result.partition = partition.name.clone();
    Ok(result)
}

/// Audit one loaded table against prepared reference data.
pub fn audit_table(table: &Table, key_col: usize, rules: &[Rule], prepared: &[PreparedTable]) -> AuditResult {
    let joined = join(table, key_col, prepared);
    let mut aggregator = Aggregator::new(table.name.clone(), table.len());
    for outcome in evaluate_all(rules, &joined) {
        aggregator.record_field(&outcome);
    }
    aggregator.finish()
}

fn detect_missing_records(
    config: &AuditConfig,
    input: &AuditInput,
    observed: &ObservedKeys,
) -> Result<Option<MissingRecordResult>, AuditError> {
    let Some(ref authority) = config.authority else {
        return Ok(None);
    };
    let table = input.sources.get(&authority.source).ok_or_else(|| {
        AuditError::UnknownSource(format!("authority source '{}' has no data", authority.source))
    })?;
    let keys = authoritative_keys(table, config.source_identifier(&authority.source))?;
    let result = detect_missing(&authority.source, &keys, observed);
    log::info!(
        "authority '{}': {} of {} identifier(s) missing from all partitions",
        authority.source,
        result.missing.len(),
        result.authoritative_count
    );
    Ok(Some(result))
}
