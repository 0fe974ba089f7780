use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::error::AuditError;

/// Reference values that never count as a discrepancy on fields with
/// `ignore_placeholders = true`.
pub const DEFAULT_PLACEHOLDERS: &[&str] = &["", "none", "null", "0", "0.0"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    pub name: String,
    /// Keyword of the identifier column, shared by every table unless
    /// overridden per source or partition.
    pub identifier: String,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub partitions: Vec<PartitionConfig>,
    #[serde(default)]
    pub authority: Option<AuthorityConfig>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    #[serde(default)]
    pub identifier: Option<String>,
    /// Zero-based header row; auto-detected when absent.
    #[serde(default)]
    pub header_row: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionConfig {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub header_row: Option<usize>,
}

/// The source whose identifiers must all appear in some partition.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityConfig {
    pub source: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub annotate_dir: Option<String>,
    #[serde(default)]
    pub missing_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One monitored field and the reference values it is checked against.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    pub field: String,
    pub candidates: Vec<Candidate>,
    /// Lowercased tokens blanked on the reference side before comparison.
    pub placeholders: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawRule {
    field: String,
    candidates: Vec<Candidate>,
    #[serde(default)]
    ignore_placeholders: bool,
    #[serde(default)]
    placeholder_tokens: Option<Vec<String>>,
}

impl TryFrom<RawRule> for Rule {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        if raw.field.trim().is_empty() {
            return Err("rule field keyword must not be empty".into());
        }
        if raw.placeholder_tokens.is_some() && !raw.ignore_placeholders {
            return Err(format!(
                "rule '{}': placeholder_tokens requires ignore_placeholders = true",
                raw.field
            ));
        }
        let placeholders = raw.ignore_placeholders.then(|| {
            raw.placeholder_tokens
                .unwrap_or_else(|| DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect())
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .collect()
        });
        Ok(Rule {
            field: raw.field,
            candidates: raw.candidates,
            placeholders,
        })
    }
}

/// One comparison instruction for a monitored field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCandidate")]
pub struct Candidate {
    pub source: String,
    pub field: String,
    pub comparison: Comparison,
}

impl Candidate {
    /// Column name of this candidate's value in the joined table.
    pub fn column(&self) -> String {
        reference_column(&self.source, &self.field)
    }
}

/// Namespaced name of a projected reference field: `ref_<source>_<field>`.
pub fn reference_column(source: &str, field: &str) -> String {
    format!("ref_{source}_{field}")
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CompareKind {
    Text,
    Date,
    #[serde(alias = "numeric_tolerant")]
    Numeric,
    #[serde(alias = "numeric_duration")]
    Duration,
}

#[derive(Deserialize)]
struct RawCandidate {
    source: String,
    field: String,
    compare: CompareKind,
    #[serde(default)]
    tolerance: Option<f64>,
    #[serde(default)]
    multiplier: Option<f64>,
}

/// Comparison semantics, fixed when the config is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Text,
    Date,
    /// Mismatch iff `|main - ref * multiplier| > tolerance + 1e-6`.
    Numeric { tolerance: f64, multiplier: f64 },
    /// Mismatch iff `|main - ref * multiplier| >= 1.0`, for tenure fields
    /// kept in different units (months vs years).
    Duration { multiplier: f64 },
}

impl TryFrom<RawCandidate> for Candidate {
    type Error = String;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let label = format!("candidate '{}.{}'", raw.source, raw.field);

        if let Some(t) = raw.tolerance {
            if !t.is_finite() || t < 0.0 {
                return Err(format!("{label}: tolerance must be a non-negative number, got {t}"));
            }
        }
        if let Some(m) = raw.multiplier {
            if !m.is_finite() || m == 0.0 {
                return Err(format!("{label}: multiplier must be a non-zero number, got {m}"));
            }
        }

        let comparison = match raw.compare {
            CompareKind::Text | CompareKind::Date => {
                if raw.tolerance.is_some() || raw.multiplier.is_some() {
                    return Err(format!(
                        "{label}: tolerance/multiplier only apply to numeric and duration comparisons"
                    ));
                }
                if raw.compare == CompareKind::Text {
                    Comparison::Text
                } else {
                    Comparison::Date
                }
            }
            CompareKind::Numeric => Comparison::Numeric {
                tolerance: raw.tolerance.unwrap_or(0.0),
                multiplier: raw.multiplier.unwrap_or(1.0),
            },
            CompareKind::Duration => {
                if raw.tolerance.is_some() {
                    return Err(format!("{label}: duration comparisons have a fixed 1.0 threshold"));
                }
                Comparison::Duration {
                    multiplier: raw.multiplier.unwrap_or(1.0),
                }
            }
        };

        Ok(Candidate {
            source: raw.source,
            field: raw.field,
            comparison,
        })
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AuditConfig {
    pub fn from_toml(input: &str) -> Result<Self, AuditError> {
        let config: AuditConfig =
            toml::from_str(input).map_err(|e| AuditError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        if self.identifier.trim().is_empty() {
            return Err(AuditError::ConfigValidation(
                "identifier keyword must not be empty".into(),
            ));
        }

        if self.partitions.is_empty() {
            return Err(AuditError::ConfigValidation(
                "at least one partition is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for p in &self.partitions {
            if !names.insert(p.name.as_str()) {
                return Err(AuditError::ConfigValidation(format!(
                    "duplicate partition name '{}'",
                    p.name
                )));
            }
        }

        for rule in &self.rules {
            if rule.candidates.is_empty() {
                return Err(AuditError::ConfigValidation(format!(
                    "rule '{}' has no candidates",
                    rule.field
                )));
            }
            for c in &rule.candidates {
                if !self.sources.contains_key(&c.source) {
                    return Err(AuditError::UnknownSource(format!(
                        "rule '{}': source '{}' not configured",
                        rule.field, c.source
                    )));
                }
            }
        }

        if let Some(ref authority) = self.authority {
            if !self.sources.contains_key(&authority.source) {
                return Err(AuditError::UnknownSource(format!(
                    "authority: source '{}' not configured",
                    authority.source
                )));
            }
        }

        Ok(())
    }

    /// Identifier keyword for a source, honoring its override.
    pub fn source_identifier(&self, source: &str) -> &str {
        self.sources
            .get(source)
            .and_then(|s| s.identifier.as_deref())
            .unwrap_or(&self.identifier)
    }

    /// Identifier keyword for a partition, honoring its override.
    pub fn partition_identifier<'a>(&'a self, partition: &'a PartitionConfig) -> &'a str {
        partition.identifier.as_deref().unwrap_or(&self.identifier)
    }

    /// Field keywords each source must provide for the active rule set, in
    /// order of first use.
    pub fn required_fields(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rule in &self.rules {
            for c in &rule.candidates {
                let fields = out.entry(c.source.clone()).or_default();
                if !fields.contains(&c.field) {
                    fields.push(c.field.clone());
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
