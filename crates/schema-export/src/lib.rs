//! # schema-export
//!
//! Export a relational database's table structure (and optionally its rows)
//! as a portable SQL script.
//!
//! An export reads metadata collections from a [`MetadataProvider`],
//! assembles an ordered [`Schema`] and renders it as:
//!
//! - **Drop statements** for every table, so the script can be re-run
//! - **Create statements** with portable column types and primary keys
//! - **Insert statements** for every row when data export is requested
//!
//! Metadata can also be written to a human-readable log, and any source can
//! be captured as a JSON snapshot and exported later without a connection.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_export::{Config, Orchestrator};
//!
//! fn main() -> schema_export::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let result = orchestrator.run()?;
//!     println!("Exported {} tables", result.tables);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod script;
pub mod source;
pub mod typemap;

// Re-exports for convenient access
pub use builder::SchemaBuilder;
pub use config::{Config, ExportConfig, OutputConfig, SourceConfig, SourceKind};
pub use crate::core::{
    Collection, DataProvider, MetadataProvider, MetadataTable, PortableType, Restrictions, RowSet,
    Schema, SchemaColumn, SqlValue, TableSchema,
};
pub use error::{ExportError, Result};
pub use orchestrator::{build_and_generate, ExportResult, HealthCheckResult, Orchestrator, Source};
pub use report::MetadataLogger;
pub use script::{ScriptGenerator, ScriptSummary};
pub use source::{Snapshot, SnapshotSource};
pub use typemap::map_type_code;

#[cfg(feature = "odbc")]
pub use source::OdbcSource;
