//! Export orchestrator - main workflow coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::builder::SchemaBuilder;
use crate::config::{Config, SourceKind};
use crate::core::{Collection, DataProvider, MetadataProvider, Restrictions};
use crate::error::{ExportError, Result};
use crate::report::MetadataLogger;
use crate::script::{ScriptGenerator, ScriptSummary};
use crate::source::SnapshotSource;

#[cfg(feature = "odbc")]
use crate::source::OdbcSource;

/// Build the schema from `metadata` and write the script to `output`.
///
/// With `include_data`, rows are fetched from `data`; asking for data
/// without a data provider is a configuration error and leaves `output`
/// untouched.
pub fn build_and_generate(
    metadata: &dyn MetadataProvider,
    data: Option<&dyn DataProvider>,
    output: &Path,
    include_data: bool,
) -> Result<ScriptSummary> {
    if include_data && data.is_none() {
        return Err(ExportError::Config(
            "data export requested but no data source is available".into(),
        ));
    }

    let schema = SchemaBuilder::new(metadata).build();
    if schema.is_empty() {
        warn!("No tables found; the script will only contain the header");
    }

    let mut generator = ScriptGenerator::new(&schema);
    if let Some(data) = data {
        generator = generator.with_data(data);
    }
    generator.include_data(include_data).write_to_path(output)
}

/// An opened metadata source.
pub enum Source {
    Snapshot(SnapshotSource),
    #[cfg(feature = "odbc")]
    Odbc(OdbcSource),
}

impl Source {
    /// Open the source described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        match config.source.r#type {
            SourceKind::Snapshot => {
                let path = config.source.path.as_ref().ok_or_else(|| {
                    ExportError::Config("source.path is required for snapshot sources".into())
                })?;
                Ok(Source::Snapshot(SnapshotSource::load(path)?))
            }
            #[cfg(feature = "odbc")]
            SourceKind::Odbc => Ok(Source::Odbc(OdbcSource::new(
                config.source.connection_string.clone(),
            )?)),
            #[cfg(not(feature = "odbc"))]
            SourceKind::Odbc => Err(ExportError::Config(
                "odbc sources need a build with the 'odbc' feature".into(),
            )),
        }
    }

    pub fn metadata(&self) -> &dyn MetadataProvider {
        match self {
            Source::Snapshot(s) => s,
            #[cfg(feature = "odbc")]
            Source::Odbc(s) => s,
        }
    }

    pub fn data(&self) -> &dyn DataProvider {
        match self {
            Source::Snapshot(s) => s,
            #[cfg(feature = "odbc")]
            Source::Odbc(s) => s,
        }
    }
}

/// Export orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Source,
}

/// Result of an export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Description of the source.
    pub source: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the export started.
    pub started_at: DateTime<Utc>,

    /// When the export completed.
    pub completed_at: DateTime<Utc>,

    /// Tables defined by the script.
    pub tables: usize,

    /// INSERT statements written.
    pub rows_written: u64,

    /// Cells written as NULL because they could not be formatted.
    pub null_substitutions: u64,

    /// Tables whose rows could not be fetched.
    pub tables_without_data: Vec<String>,

    /// Script destination.
    pub script_file: PathBuf,

    /// Metadata log destination, if one was written.
    pub log_file: Option<PathBuf>,
}

/// Result of a source health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source: String,
    pub connected: bool,
    pub latency_ms: u64,
    /// Base tables reported by the source.
    pub tables: Option<usize>,
    pub error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Create a new orchestrator and open the configured source.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = Source::open(&config)?;
        Ok(Self { config, source })
    }

    /// Orchestrator over an already opened source.
    pub fn with_source(config: Config, source: Source) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the export: metadata log (when configured), then the script.
    pub fn run(&self) -> Result<ExportResult> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let output = &self.config.output;

        info!("Starting export run: {}", run_id);

        if output.script_file.exists() && !output.overwrite {
            return Err(ExportError::Config(format!(
                "{} already exists; pass --force or set output.overwrite to replace it",
                output.script_file.display()
            )));
        }

        if let Some(log_file) = &output.log_file {
            info!("Phase 1: Writing metadata log");
            self.write_log(log_file)?;
        }

        info!("Phase 2: Building schema and writing script");
        let include_data = self.config.export.include_data;
        let summary = build_and_generate(
            self.source.metadata(),
            Some(self.source.data()),
            &output.script_file,
            include_data,
        )?;

        let completed_at = Utc::now();
        let result = ExportResult {
            run_id,
            status: "completed".to_string(),
            source: self.source.metadata().describe(),
            duration_seconds: timer.elapsed().as_secs_f64(),
            started_at,
            completed_at,
            tables: summary.tables,
            rows_written: summary.rows_written,
            null_substitutions: summary.null_substitutions,
            tables_without_data: summary.tables_without_data,
            script_file: output.script_file.clone(),
            log_file: output.log_file.clone(),
        };

        info!(
            "Export {}: {} tables, {} rows, {} NULL substitutions in {:.1}s",
            result.status,
            result.tables,
            result.rows_written,
            result.null_substitutions,
            result.duration_seconds
        );
        Ok(result)
    }

    /// Write the metadata log for every collection to `path`.
    pub fn write_log(&self, path: &Path) -> Result<()> {
        MetadataLogger::new(self.source.metadata()).write_to_path(path)
    }

    /// Capture the source into a snapshot file. Returns the number of
    /// collections captured.
    pub fn snapshot(&self, path: &Path, include_data: bool) -> Result<usize> {
        let data = include_data.then(|| self.source.data());
        let snapshot = SnapshotSource::capture(self.source.metadata(), data);
        snapshot.save(path)?;
        let captured = snapshot.snapshot().collections.len();
        info!(
            "Saved snapshot to {} ({} collections, {} tables with data)",
            path.display(),
            captured,
            snapshot.snapshot().data.len()
        );
        Ok(captured)
    }

    /// Request the `Tables` collection and report how long it took.
    pub fn health_check(&self) -> Result<HealthCheckResult> {
        let metadata = self.source.metadata();
        let timer = Instant::now();
        let response = metadata.get_schema(Collection::Tables, &Restrictions::none());
        let latency_ms = timer.elapsed().as_millis() as u64;

        let (tables, error) = match response {
            Ok(table) => (Some(table.len()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Ok(HealthCheckResult {
            source: metadata.describe(),
            connected: error.is_none(),
            latency_ms,
            tables,
            healthy: error.is_none(),
            error,
        })
    }
}

impl ExportResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
