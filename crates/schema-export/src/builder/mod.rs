//! Schema assembly from metadata collections.
//!
//! Assembly runs in three sequential passes over the metadata provider:
//!
//! 1. [`SchemaBuilder::collect_tables`]: base table names in discovery order
//! 2. [`SchemaBuilder::collect_columns`]: columns per table in ordinal order,
//!    none flagged as primary key
//! 3. [`SchemaBuilder::merge_primary_keys`]: a new schema with primary key
//!    flags taken from the primary key index rows
//!
//! A failed metadata request never aborts assembly. A table whose columns
//! cannot be read is left out of the schema; a table whose primary key
//! cannot be read keeps all of its columns unflagged.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::core::identifier::validate_identifier;
use crate::core::metadata::{field_text, field_value, fields, BASE_TABLE_TYPE};
use crate::core::{
    Collection, MetadataProvider, MetadataTable, Restrictions, Schema, SchemaColumn, TableSchema,
};
use crate::typemap::map_type_code;

/// Builds a [`Schema`] from a metadata provider.
pub struct SchemaBuilder<'a, P: MetadataProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: MetadataProvider + ?Sized> SchemaBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Run all three passes and return the final schema.
    pub fn build(&self) -> Schema {
        info!("Reading schema from {}", self.provider.describe());
        let tables = self.collect_tables();
        info!("Found {} base tables", tables.len());

        let schema = self.collect_columns(&tables);
        let schema = self.merge_primary_keys(&schema);

        info!(
            "Assembled schema: {} tables, {} columns",
            schema.len(),
            schema.tables().map(|t| t.columns.len()).sum::<usize>()
        );
        schema
    }

    /// Names of the base tables, in the order the provider reports them.
    ///
    /// Views and system tables are excluded by the `TABLE_TYPE` restriction.
    pub fn collect_tables(&self) -> Vec<String> {
        let Some(rows) = self.fetch(
            Collection::Tables,
            &Restrictions::tables_of_type(BASE_TABLE_TYPE),
            "all tables",
        ) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for row in &rows.rows {
            let Some(name) = field_text(&rows, row, fields::TABLE_NAME) else {
                warn!("Skipping table row without TABLE_NAME");
                continue;
            };
            if let Err(e) = validate_identifier(&name) {
                warn!("Skipping table {:?}: {}", name, e);
                continue;
            }
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
        names
    }

    /// Read the columns of every table in `table_names`.
    ///
    /// Columns are ordered by `ORDINAL_POSITION` (ties keep provider order)
    /// and mapped to portable types. No column is flagged as primary key.
    pub fn collect_columns(&self, table_names: &[String]) -> Schema {
        let mut schema = Schema::new();

        for table_name in table_names {
            let Some(rows) =
                self.fetch(Collection::Columns, &Restrictions::columns_of(table_name), table_name)
            else {
                continue;
            };

            let columns = columns_from_rows(table_name, &rows);
            if columns.is_empty() {
                warn!("Table {} reported no usable columns - leaving it out", table_name);
                continue;
            }

            debug!("Table {}: {} columns", table_name, columns.len());
            schema.insert(TableSchema::new(table_name.clone(), columns));
        }

        schema
    }

    /// Produce a new schema with primary key flags merged in.
    ///
    /// Every column named by the table's primary key index is flagged; other
    /// columns are copied unchanged. Composite keys flag each participating
    /// column independently, which renders one `PRIMARY KEY` clause per
    /// column. That limitation is logged, not corrected.
    pub fn merge_primary_keys(&self, schema: &Schema) -> Schema {
        schema
            .tables()
            .map(|table| {
                let Some(rows) = self.fetch(
                    Collection::Indexes,
                    &Restrictions::primary_key_of(&table.name),
                    &table.name,
                ) else {
                    return table.clone();
                };

                let key_columns = primary_key_columns(&rows);
                if key_columns.len() > 1 {
                    warn!(
                        "Table {} has a composite primary key ({}); each column gets its own \
                         PRIMARY KEY clause, which strict engines reject",
                        table.name,
                        key_columns.join(", ")
                    );
                }

                let columns = table
                    .columns
                    .iter()
                    .map(|col| {
                        if key_columns.contains(&col.name) {
                            col.with_primary_key(true)
                        } else {
                            col.clone()
                        }
                    })
                    .collect();
                TableSchema::new(table.name.clone(), columns)
            })
            .collect()
    }

    /// Request a collection, converting a failure into an absent result.
    fn fetch(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
        subject: &str,
    ) -> Option<MetadataTable> {
        match self.provider.get_schema(collection, restrictions) {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(
                    "Metadata request for {} ({}) failed - skipping: {}",
                    collection.title(),
                    subject,
                    e
                );
                None
            }
        }
    }
}

/// Build ordered columns from `Columns` rows.
fn columns_from_rows(table_name: &str, rows: &MetadataTable) -> Vec<SchemaColumn> {
    let mut ordered: Vec<(i64, SchemaColumn)> = Vec::with_capacity(rows.len());

    for row in &rows.rows {
        let Some(name) = field_text(rows, row, fields::COLUMN_NAME) else {
            warn!("Table {}: skipping column row without COLUMN_NAME", table_name);
            continue;
        };
        if let Err(e) = validate_identifier(&name) {
            warn!("Table {}: skipping column {:?}: {}", table_name, name, e);
            continue;
        }

        let ordinal = field_value(rows, row, fields::ORDINAL_POSITION)
            .and_then(|v| v.as_i64())
            .unwrap_or(i64::MAX);
        let type_code = field_value(rows, row, fields::DATA_TYPE)
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok());
        let data_type = match type_code {
            Some(code) => map_type_code(code),
            None => {
                debug!("Table {}: column {} has no DATA_TYPE", table_name, name);
                Default::default()
            }
        };
        let is_nullable = field_value(rows, row, fields::IS_NULLABLE)
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        ordered.push((ordinal, SchemaColumn::new(name, data_type, is_nullable)));
    }

    // Stable: equal ordinals keep provider order.
    ordered.sort_by_key(|(ordinal, _)| *ordinal);
    ordered.into_iter().map(|(_, col)| col).collect()
}

/// Column names of the primary key, ordered by key position.
fn primary_key_columns(rows: &MetadataTable) -> Vec<String> {
    let mut keyed: Vec<(i64, String)> = rows
        .rows
        .iter()
        .filter(|row| {
            // Providers that return every index row mark the key rows explicitly.
            field_value(rows, row, fields::PRIMARY_KEY)
                .and_then(|v| v.as_bool())
                .unwrap_or(true)
        })
        .filter_map(|row| {
            let name = field_text(rows, row, fields::COLUMN_NAME)?;
            let ordinal = field_value(rows, row, fields::ORDINAL_POSITION)
                .and_then(|v| v.as_i64())
                .unwrap_or(i64::MAX);
            Some((ordinal, name))
        })
        .collect();

    keyed.sort_by_key(|(ordinal, _)| *ordinal);

    let mut names: Vec<String> = Vec::with_capacity(keyed.len());
    for (_, name) in keyed {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
