//! Error types for the export library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for metadata / source connection errors.
pub const EXIT_METADATA_ERROR: u8 = 2;
/// Exit code for data fetch errors.
pub const EXIT_DATA_ERROR: u8 = 3;
/// Exit code for file and stream errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A metadata collection could not be retrieved.
    #[error("Metadata unavailable for collection '{collection}': {message}")]
    Metadata { collection: String, message: String },

    /// Row data for a table could not be retrieved.
    #[error("Data unavailable for table {table}: {message}")]
    Data { table: String, message: String },

    /// ODBC driver manager or driver error
    #[cfg(feature = "odbc")]
    #[error("ODBC error: {0}")]
    Odbc(#[from] odbc_api::Error),

    /// IO error (log file, script file, snapshot file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Create a Metadata error for a collection.
    pub fn metadata(collection: impl Into<String>, message: impl Into<String>) -> Self {
        ExportError::Metadata {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a Data error for a table.
    pub fn data(table: impl Into<String>, message: impl Into<String>) -> Self {
        ExportError::Data {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::Config(_) | ExportError::Yaml(_) => EXIT_CONFIG_ERROR,
            ExportError::Metadata { .. } => EXIT_METADATA_ERROR,
            #[cfg(feature = "odbc")]
            ExportError::Odbc(_) => EXIT_METADATA_ERROR,
            ExportError::Data { .. } => EXIT_DATA_ERROR,
            ExportError::Io(_) | ExportError::Json(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExportError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            ExportError::metadata("Tables", "driver gone").exit_code(),
            EXIT_METADATA_ERROR
        );
        assert_eq!(ExportError::data("T", "no rows").exit_code(), EXIT_DATA_ERROR);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(ExportError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_message() {
        let err = ExportError::metadata("Columns", "timeout");
        let text = err.format_detailed();
        assert!(text.starts_with("Error: Metadata unavailable for collection 'Columns'"));
        assert!(text.contains("timeout"));
    }
}
