//! Metadata collections ("schema rowsets") and positional restrictions.
//!
//! A metadata provider answers requests of the form *collection +
//! restrictions* with a [`MetadataTable`]. Restrictions are positional: the
//! `i`-th restriction filters on the `i`-th entry of
//! [`Collection::restriction_columns`]. Field names follow the OLE DB schema
//! rowsets (`TABLE_NAME`, `COLUMN_NAME`, `DATA_TYPE`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::value::{Row, RowSet, SqlValue};
use crate::error::ExportError;

/// Maximum number of positional restrictions accepted by any collection.
pub const MAX_RESTRICTIONS: usize = 5;

/// `TABLE_TYPE` value of user base tables.
pub const BASE_TABLE_TYPE: &str = "TABLE";

/// `INDEX_NAME` restriction selecting primary key index rows.
pub const PRIMARY_KEY_INDEX: &str = "PrimaryKey";

/// Field names read from the collections.
pub mod fields {
    pub const COLLECTION_NAME: &str = "COLLECTION_NAME";
    pub const NUMBER_OF_RESTRICTIONS: &str = "NUMBER_OF_RESTRICTIONS";
    pub const TABLE_CATALOG: &str = "TABLE_CATALOG";
    pub const TABLE_SCHEMA: &str = "TABLE_SCHEMA";
    pub const TABLE_NAME: &str = "TABLE_NAME";
    pub const TABLE_TYPE: &str = "TABLE_TYPE";
    pub const COLUMN_NAME: &str = "COLUMN_NAME";
    pub const ORDINAL_POSITION: &str = "ORDINAL_POSITION";
    pub const IS_NULLABLE: &str = "IS_NULLABLE";
    pub const DATA_TYPE: &str = "DATA_TYPE";
    pub const INDEX_NAME: &str = "INDEX_NAME";
    pub const PRIMARY_KEY: &str = "PRIMARY_KEY";
    pub const TYPE: &str = "TYPE";
}

/// A metadata collection result: named fields, one row per item.
pub type MetadataTable = RowSet;

/// Metadata collections understood by the schema builder and the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// The list of available collections (requested with an empty name).
    #[serde(rename = "")]
    All,
    Tables,
    Columns,
    Indexes,
    Views,
}

impl Collection {
    /// Collections in logging order.
    pub const ALL: [Collection; 5] = [
        Collection::All,
        Collection::Tables,
        Collection::Columns,
        Collection::Indexes,
        Collection::Views,
    ];

    /// Collection name as passed to the provider.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::All => "",
            Collection::Tables => "Tables",
            Collection::Columns => "Columns",
            Collection::Indexes => "Indexes",
            Collection::Views => "Views",
        }
    }

    /// Human-readable title for logs.
    pub fn title(&self) -> &'static str {
        match self {
            Collection::All => "All Metadata Collections",
            Collection::Tables => "Tables",
            Collection::Columns => "Columns",
            Collection::Indexes => "Indexes",
            Collection::Views => "Views",
        }
    }

    /// Fields matched by each positional restriction.
    pub fn restriction_columns(&self) -> &'static [&'static str] {
        use fields::*;
        match self {
            Collection::All => &[],
            Collection::Tables => &[TABLE_CATALOG, TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE],
            Collection::Columns => &[TABLE_CATALOG, TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME],
            Collection::Indexes => &[TABLE_CATALOG, TABLE_SCHEMA, INDEX_NAME, TYPE, TABLE_NAME],
            Collection::Views => &[TABLE_CATALOG, TABLE_SCHEMA, TABLE_NAME],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExportError::metadata(s, "unknown metadata collection"))
    }
}

/// Positional restrictions for a metadata request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions([Option<String>; MAX_RESTRICTIONS]);

impl Restrictions {
    /// No restrictions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the restriction at `position` (0-based). Positions past
    /// [`MAX_RESTRICTIONS`] are ignored.
    #[must_use]
    pub fn with(mut self, position: usize, value: impl Into<String>) -> Self {
        if let Some(slot) = self.0.get_mut(position) {
            *slot = Some(value.into());
        }
        self
    }

    /// Restriction at `position`, if set.
    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position).and_then(|r| r.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// `Tables` restricted to one table type.
    pub fn tables_of_type(table_type: &str) -> Self {
        Self::none().with(3, table_type)
    }

    /// `Columns` restricted to one table.
    pub fn columns_of(table: &str) -> Self {
        Self::none().with(2, table)
    }

    /// `Indexes` restricted to one table's primary key index.
    pub fn primary_key_of(table: &str) -> Self {
        Self::none().with(2, PRIMARY_KEY_INDEX).with(4, table)
    }

    /// Check whether `row` of `table` satisfies every restriction.
    ///
    /// A restriction on a field the table does not have never matches.
    pub fn matches(&self, collection: Collection, table: &MetadataTable, row: &Row) -> bool {
        collection
            .restriction_columns()
            .iter()
            .enumerate()
            .all(|(position, field)| match self.get(position) {
                None => true,
                Some(expected) => field_value(table, row, field)
                    .map(|v| v.to_string() == expected)
                    .unwrap_or(false),
            })
    }

    /// Filter `table` down to the rows satisfying every restriction.
    pub fn apply(&self, collection: Collection, table: &MetadataTable) -> MetadataTable {
        if self.is_empty() || collection == Collection::All {
            return table.clone();
        }
        MetadataTable {
            columns: table.columns.clone(),
            rows: table
                .rows
                .iter()
                .filter(|row| self.matches(collection, table, row))
                .cloned()
                .collect(),
        }
    }
}

/// Look up a field of `row` by name (case-insensitive fallback).
pub fn field_value<'a>(table: &MetadataTable, row: &'a Row, field: &str) -> Option<&'a SqlValue> {
    table
        .column_index_ignore_case(field)
        .and_then(|idx| row.get(idx))
}

/// Non-null text of a field.
pub fn field_text(table: &MetadataTable, row: &Row, field: &str) -> Option<String> {
    field_value(table, row, field)
        .filter(|v| !v.is_null())
        .map(|v| v.to_string())
}
