//! SQL script generation.
//!
//! The script is written in one pass with a fixed section order:
//!
//! 1. header comment block
//! 2. `DROP TABLE IF EXISTS` for every table
//! 3. `CREATE TABLE` for every table
//! 4. when data export is requested, `INSERT` statements grouped by table,
//!    each group preceded by a `--` comment line
//!
//! Every section iterates the schema in the same order, and INSERT column
//! lists use the same column order as the CREATE TABLE statement.
//!
//! Writing to a file truncates it first. If a write fails part-way the file
//! is left incomplete; the error is returned and nothing is retried.

mod format;

pub use format::{format_value, FormatError, NULL};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::identifier::{quote_ident, quote_source_ident};
use crate::core::{DataProvider, RowSet, Schema, TableSchema};
use crate::error::{ExportError, Result};

/// Fixed header written at the top of every script.
pub const SCRIPT_HEADER: &[&str] = &[
    concat!("-- Generated by schema-export ", env!("CARGO_PKG_VERSION")),
    "-- WARNING: this script drops and recreates every table it defines.",
    "-- Existing tables with the same names and all of their data will be lost.",
];

/// Counters describing a generated script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSummary {
    /// Tables defined by the script.
    pub tables: usize,

    /// INSERT statements written.
    pub rows_written: u64,

    /// Cells written as NULL because they could not be formatted.
    pub null_substitutions: u64,

    /// Tables whose rows could not be fetched.
    pub tables_without_data: Vec<String>,
}

/// Renders a [`Schema`] (and optionally its rows) as a SQL script.
pub struct ScriptGenerator<'a> {
    schema: &'a Schema,
    data: Option<&'a dyn DataProvider>,
    include_data: bool,
}

impl<'a> ScriptGenerator<'a> {
    /// Generator for DDL only.
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            data: None,
            include_data: false,
        }
    }

    /// Fetch rows from `data` and emit INSERT statements.
    #[must_use]
    pub fn with_data(mut self, data: &'a dyn DataProvider) -> Self {
        self.data = Some(data);
        self.include_data = true;
        self
    }

    /// Turn the INSERT section on or off.
    #[must_use]
    pub fn include_data(mut self, include_data: bool) -> Self {
        self.include_data = include_data;
        self
    }

    /// Render the whole script into a string.
    pub fn generate(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Create (truncating) `path` and write the script to it.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<ScriptSummary> {
        let path = path.as_ref();
        info!("Writing SQL script to {}", path.display());
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        let summary = self.write_to(&mut out)?;
        out.flush()?;
        Ok(summary)
    }

    /// Write the script to `out`.
    ///
    /// Only I/O errors on `out` abort generation; per-table fetch failures and
    /// per-cell formatting failures are logged and substituted.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<ScriptSummary> {
        let data = match (self.include_data, self.data) {
            (true, Some(data)) => Some(data),
            (true, None) => {
                return Err(ExportError::Config(
                    "data export requested but no data source is available".into(),
                ))
            }
            (false, _) => None,
        };

        let mut summary = ScriptSummary {
            tables: self.schema.len(),
            ..Default::default()
        };

        for line in SCRIPT_HEADER {
            writeln!(out, "{}", line)?;
        }

        writeln!(out)?;
        for table in self.schema.tables() {
            writeln!(out, "{}", drop_table_sql(table))?;
        }

        writeln!(out)?;
        for table in self.schema.tables() {
            writeln!(out, "{}", create_table_sql(table))?;
        }

        if let Some(data) = data {
            writeln!(out)?;
            for table in self.schema.tables() {
                self.write_table_data(out, table, data, &mut summary)?;
            }
        }

        debug!(
            "Script complete: {} tables, {} rows, {} NULL substitutions",
            summary.tables, summary.rows_written, summary.null_substitutions
        );
        Ok(summary)
    }

    fn write_table_data<W: Write>(
        &self,
        out: &mut W,
        table: &TableSchema,
        data: &dyn DataProvider,
        summary: &mut ScriptSummary,
    ) -> Result<()> {
        writeln!(out, "-- Data for table {}", quote_ident(&table.name))?;

        let rows = match data.query_rows(&select_all_sql(&table.name)) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Could not read rows of {} - no data written: {}", table.name, e);
                summary.tables_without_data.push(table.name.clone());
                return Ok(());
            }
        };

        let mut substituted = 0u64;
        for values in insert_values(table, &rows, &mut substituted) {
            writeln!(out, "{}", insert_sql(table, &values))?;
            summary.rows_written += 1;
        }

        if substituted > 0 {
            warn!(
                "Table {}: {} values could not be formatted and were written as NULL",
                table.name, substituted
            );
        }
        summary.null_substitutions += substituted;
        debug!("Table {}: {} rows", table.name, rows.len());
        Ok(())
    }
}

/// `DROP TABLE IF EXISTS "<name>";`
pub fn drop_table_sql(table: &TableSchema) -> String {
    format!("DROP TABLE IF EXISTS {};", quote_ident(&table.name))
}

/// `CREATE TABLE "<name>" (...)` with one column definition per line.
pub fn create_table_sql(table: &TableSchema) -> String {
    let columns: Vec<String> = table.columns.iter().map(|c| c.to_ddl()).collect();
    format!(
        "CREATE TABLE {} (\n\t{}\n);",
        quote_ident(&table.name),
        columns.join(", \n\t")
    )
}

/// `INSERT INTO "<name>" (<columns>) VALUES (<values>);`
///
/// `values` must already be literals, in the table's column order.
pub fn insert_sql(table: &TableSchema, values: &[String]) -> String {
    let columns: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
    format!(
        "INSERT INTO {} ({}) \n\tVALUES ({});",
        quote_ident(&table.name),
        columns.join(", "),
        values.join(", ")
    )
}

/// Query used to fetch a table's rows from the source engine.
pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_source_ident(table))
}

/// Literal values for every row, aligned with the table's column order.
///
/// Cells are located by exact column name; a column the row set lacks counts
/// as a formatting failure. Cells that cannot be formatted are replaced by
/// `NULL` and counted in `substituted`.
fn insert_values(table: &TableSchema, rows: &RowSet, substituted: &mut u64) -> Vec<Vec<String>> {
    let positions: Vec<Option<usize>> = table
        .columns
        .iter()
        .map(|c| rows.column_index(&c.name))
        .collect();

    rows.rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .zip(&positions)
                .map(|(col, pos)| {
                    let formatted = pos
                        .and_then(|idx| row.get(idx))
                        .ok_or_else(|| FormatError::MissingColumn(col.name.clone()))
                        .and_then(|value| format_value(value, col.data_type));
                    match formatted {
                        Ok(literal) => literal,
                        Err(e) => {
                            debug!("{}.{}: {} - writing NULL", table.name, col.name, e);
                            *substituted += 1;
                            NULL.to_string()
                        }
                    }
                })
                .collect()
        })
        .collect()
}
