//! Schema model: portable column types, columns, tables, and the ordered schema.
//!
//! The model is assembled by [`crate::builder::SchemaBuilder`] and only read
//! afterwards. Table order is discovery order and column order is the source
//! ordinal position; both drive the layout of the generated script.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::identifier::quote_ident;

/// Portable column type used in generated DDL.
///
/// Every source type code maps to exactly one of these; codes with no
/// dedicated group fall back to [`PortableType::Blob`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortableType {
    Boolean,
    DateTime,
    Decimal,
    Double,
    Integer,
    String,
    #[default]
    Blob,
}

impl PortableType {
    /// All portable types, in declaration order.
    pub const ALL: [PortableType; 7] = [
        PortableType::Boolean,
        PortableType::DateTime,
        PortableType::Decimal,
        PortableType::Double,
        PortableType::Integer,
        PortableType::String,
        PortableType::Blob,
    ];

    /// Type name as written in DDL.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortableType::Boolean => "BOOLEAN",
            PortableType::DateTime => "DATETIME",
            PortableType::Decimal => "DECIMAL",
            PortableType::Double => "DOUBLE",
            PortableType::Integer => "INTEGER",
            PortableType::String => "STRING",
            PortableType::Blob => "BLOB",
        }
    }

    /// Whether values of this type are written unquoted in INSERT statements.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PortableType::Integer
                | PortableType::Decimal
                | PortableType::Double
                | PortableType::Boolean
        )
    }
}

impl fmt::Display for PortableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column metadata.
///
/// Columns are values: the primary-key merge produces new columns through
/// [`SchemaColumn::with_primary_key`] rather than mutating existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    /// Column name, case preserved as reported by the source.
    pub name: String,

    /// Portable data type.
    pub data_type: PortableType,

    /// Whether the column allows NULL. Ignored for primary key columns.
    pub is_nullable: bool,

    /// Whether the column participates in the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
}

impl SchemaColumn {
    /// Create a non-key column.
    pub fn new(name: impl Into<String>, data_type: PortableType, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_nullable,
            is_primary_key: false,
        }
    }

    /// Copy of this column with the primary key flag set to `is_primary_key`.
    #[must_use]
    pub fn with_primary_key(&self, is_primary_key: bool) -> Self {
        Self {
            is_primary_key,
            ..self.clone()
        }
    }

    /// Integer primary keys are emitted with AUTOINCREMENT.
    pub fn is_auto_increment(&self) -> bool {
        self.is_primary_key && self.data_type == PortableType::Integer
    }

    /// Render the column definition used inside CREATE TABLE.
    ///
    /// Exactly one of `PRIMARY KEY`, `NULL` or `NOT NULL` follows the type.
    pub fn to_ddl(&self) -> String {
        let mut ddl = format!("{} {}", quote_ident(&self.name), self.data_type);
        if self.is_primary_key {
            ddl.push_str(" PRIMARY KEY");
            if self.is_auto_increment() {
                ddl.push_str(" AUTOINCREMENT");
            }
        } else if self.is_nullable {
            ddl.push_str(" NULL");
        } else {
            ddl.push_str(" NOT NULL");
        }
        ddl
    }
}

/// Table metadata: a name plus its columns in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Column definitions in ordinal order.
    pub columns: Vec<SchemaColumn>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<SchemaColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns flagged as primary key.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &SchemaColumn> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    /// Check if more than one column is flagged as primary key.
    ///
    /// Such tables render one column-level `PRIMARY KEY` clause per flagged
    /// column, which strict engines reject.
    pub fn has_composite_primary_key(&self) -> bool {
        self.primary_key_columns().count() > 1
    }
}

/// Ordered mapping from table name to table definition.
///
/// Iteration order is insertion order; table names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: Vec<TableSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table, keeping discovery order.
    ///
    /// A table with an existing name replaces the earlier definition in place.
    pub fn insert(&mut self, table: TableSchema) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Look up a table by name (case-sensitive).
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    /// Table names in insertion order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<TableSchema> for Schema {
    fn from_iter<I: IntoIterator<Item = TableSchema>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for table in iter {
            schema.insert(table);
        }
        schema
    }
}

impl IntoIterator for Schema {
    type Item = TableSchema;
    type IntoIter = std::vec::IntoIter<TableSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}
