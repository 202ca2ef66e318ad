//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where metadata and rows come from.
    pub source: SourceConfig,

    /// Output files.
    #[serde(default)]
    pub output: OutputConfig,

    /// Export behavior.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Kind of metadata source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live database through an ODBC driver.
    Odbc,
    /// JSON snapshot file.
    Snapshot,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Odbc => f.write_str("odbc"),
            SourceKind::Snapshot => f.write_str("snapshot"),
        }
    }
}

/// Source configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind.
    pub r#type: SourceKind,

    /// ODBC connection string (odbc sources).
    #[serde(default)]
    pub connection_string: String,

    /// Snapshot file (snapshot sources).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("type", &self.r#type)
            .field("connection_string", &redact_connection_string(&self.connection_string))
            .field("path", &self.path)
            .finish()
    }
}

/// Output file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// SQL script destination (default: "schema.sql").
    #[serde(default = "default_script_file")]
    pub script_file: PathBuf,

    /// Metadata log destination. No log is written when unset.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Replace an existing script file without asking (default: false).
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            script_file: default_script_file(),
            log_file: None,
            overwrite: false,
        }
    }
}

/// Export behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Emit INSERT statements for every table (default: false).
    #[serde(default)]
    pub include_data: bool,
}

/// Connection string keys whose values are never printed.
const SECRET_KEYS: &[&str] = &["pwd", "password"];

/// Replace credential values in an ODBC connection string with `[REDACTED]`.
pub fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _)) if SECRET_KEYS.iter().any(|s| key.trim().eq_ignore_ascii_case(s)) => {
                format!("{}=[REDACTED]", key)
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn default_script_file() -> PathBuf {
    PathBuf::from("schema.sql")
}
