//! JSON snapshot source.
//!
//! A snapshot is a file holding metadata collections and, optionally, the
//! rows of each table. It lets an export run without a live connection: a
//! snapshot captured from a database on one machine can be turned into a
//! script on another. Snapshots also back the end-to-end tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::builder::SchemaBuilder;
use crate::core::{
    Collection, DataProvider, MetadataProvider, MetadataTable, Restrictions, RowSet,
};
use crate::error::{ExportError, Result};
use crate::script::select_all_sql;

/// One metadata collection as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    /// Collection name (`""` for the collection list).
    pub name: Collection,

    #[serde(flatten)]
    pub table: MetadataTable,
}

/// The rows of one table as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    /// Table name.
    pub table: String,

    #[serde(flatten)]
    pub rows: RowSet,
}

/// Serialized snapshot contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Description of the captured source.
    #[serde(default)]
    pub source: String,

    /// When the snapshot was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,

    /// Metadata collections.
    #[serde(default)]
    pub collections: Vec<CollectionSnapshot>,

    /// Table rows.
    #[serde(default)]
    pub data: Vec<TableData>,
}

/// Metadata and data provider backed by a [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&content)?;
        info!(
            "Loaded snapshot {} ({} collections, {} tables with data)",
            path.display(),
            snapshot.snapshot.collections.len(),
            snapshot.snapshot.data.len()
        );
        Ok(snapshot)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Record every collection from `metadata` and, if `data` is given, the
    /// rows of every base table.
    ///
    /// Collections or tables that cannot be read are left out of the snapshot.
    pub fn capture(metadata: &dyn MetadataProvider, data: Option<&dyn DataProvider>) -> Self {
        let mut snapshot = Snapshot {
            source: metadata.describe(),
            captured_at: Some(Utc::now()),
            ..Default::default()
        };

        for collection in Collection::ALL {
            match metadata.get_schema(collection, &Restrictions::none()) {
                Ok(table) => {
                    debug!("Captured {}: {} rows", collection.title(), table.len());
                    snapshot.collections.push(CollectionSnapshot {
                        name: collection,
                        table,
                    });
                }
                Err(e) => warn!("Not capturing {}: {}", collection.title(), e),
            }
        }

        if let Some(data) = data {
            for table in SchemaBuilder::new(metadata).collect_tables() {
                match data.query_rows(&select_all_sql(&table)) {
                    Ok(rows) => {
                        debug!("Captured {} rows of {}", rows.len(), table);
                        snapshot.data.push(TableData { table, rows });
                    }
                    Err(e) => warn!("Not capturing rows of {}: {}", table, e),
                }
            }
        }

        Self::new(snapshot)
    }
}

impl MetadataProvider for SnapshotSource {
    fn get_schema(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
    ) -> Result<MetadataTable> {
        self.snapshot
            .collections
            .iter()
            .find(|c| c.name == collection)
            .map(|c| restrictions.apply(collection, &c.table))
            .ok_or_else(|| ExportError::metadata(collection.name(), "not present in snapshot"))
    }

    fn describe(&self) -> String {
        if self.snapshot.source.is_empty() {
            "snapshot".to_string()
        } else {
            format!("snapshot of {}", self.snapshot.source)
        }
    }
}

impl DataProvider for SnapshotSource {
    fn query_rows(&self, sql: &str) -> Result<RowSet> {
        let table = parse_select_all(sql).ok_or_else(|| {
            ExportError::data(sql, "snapshot sources only answer SELECT * FROM [table]")
        })?;
        self.snapshot
            .data
            .iter()
            .find(|d| d.table == table)
            .map(|d| d.rows.clone())
            .ok_or_else(|| ExportError::data(table, "no rows captured in snapshot"))
    }
}

/// Extract the table name from `SELECT * FROM [name]`.
fn parse_select_all(sql: &str) -> Option<String> {
    const PREFIX: &str = "SELECT * FROM ";
    let sql = sql.trim().trim_end_matches(';').trim_end();
    let head = sql.get(..PREFIX.len())?;
    if !head.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let ident = sql[PREFIX.len()..].trim();
    let inner = ident.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.replace("]]", "]"))
}
