use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AuditError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no partitions, bad tolerance, etc.).
    ConfigValidation(String),
    /// A candidate or the authority references a source that is not configured.
    UnknownSource(String),
    /// The identifier column cannot be resolved in a table.
    MissingIdentifier { table: String, keyword: String },
    /// None of a reference source's required fields exist in its table.
    NoReferenceFields { source: String, fields: Vec<String> },
    /// Table has no header row at all.
    EmptyTable(String),
    /// CSV decoding error.
    Csv { table: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownSource(source) => write!(f, "unknown source: {source}"),
            Self::MissingIdentifier { table, keyword } => {
                write!(f, "table '{table}': no identifier column matching '{keyword}'")
            }
            Self::NoReferenceFields { source, fields } => {
                write!(f, "source '{source}': none of the fields [{}] found", fields.join(", "))
            }
            Self::EmptyTable(table) => write!(f, "table '{table}': no header row"),
            Self::Csv { table, message } => write!(f, "table '{table}': CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for AuditError {}
