//! Configuration validation.

use super::{Config, SourceKind};
use crate::error::{ExportError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    match config.source.r#type {
        SourceKind::Odbc => {
            if config.source.connection_string.trim().is_empty() {
                return Err(ExportError::Config(
                    "source.connection_string is required for odbc sources".into(),
                ));
            }
            if cfg!(not(feature = "odbc")) {
                return Err(ExportError::Config(
                    "odbc sources need a build with the 'odbc' feature".into(),
                ));
            }
        }
        SourceKind::Snapshot => {
            if config.source.path.is_none() {
                return Err(ExportError::Config(
                    "source.path is required for snapshot sources".into(),
                ));
            }
        }
    }

    if config.output.script_file.as_os_str().is_empty() {
        return Err(ExportError::Config("output.script_file must not be empty".into()));
    }
    if config.output.log_file.as_ref() == Some(&config.output.script_file) {
        return Err(ExportError::Config(
            "output.log_file and output.script_file must be different files".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportConfig, OutputConfig, SourceConfig};
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                r#type: SourceKind::Snapshot,
                connection_string: String::new(),
                path: Some(PathBuf::from("northwind.json")),
            },
            output: OutputConfig::default(),
            export: ExportConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_snapshot_requires_path() {
        let mut config = valid_config();
        config.source.path = None;
        assert!(matches!(validate(&config), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_odbc_requires_connection_string() {
        let mut config = valid_config();
        config.source.r#type = SourceKind::Odbc;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("connection_string"));
    }

    #[test]
    fn test_empty_script_file() {
        let mut config = valid_config();
        config.output.script_file = PathBuf::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_log_and_script_must_differ() {
        let mut config = valid_config();
        config.output.log_file = Some(PathBuf::from("schema.sql"));
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let mut config = valid_config();
        config.source.r#type = SourceKind::Odbc;
        config.source.connection_string = concat!(
            "Driver={Microsoft Access Driver (*.mdb)};",
            "DBQ=C:\\db.mdb;UID=admin;PWD=super_secret_123"
        )
        .to_string();
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_123"),
            "Debug output should not contain actual password value"
        );
        assert!(debug_output.contains("UID=admin"));
    }
}
