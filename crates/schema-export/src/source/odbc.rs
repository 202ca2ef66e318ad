//! ODBC source.
//!
//! Metadata collections are emulated with the ODBC catalog functions
//! (`SQLTables`, `SQLColumns`, `SQLPrimaryKeys`) and renamed into the
//! collection layout the schema builder reads. Column types are translated
//! from ODBC SQL type codes to the provider type codes understood by
//! [`crate::typemap`]. Every request opens its own connection.
//!
//! Primary keys come from `SQLPrimaryKeys` alone. Drivers that do not
//! implement it (some file-based drivers among them) report an Indexes
//! failure per table, and those tables are exported without a key.
//! The Microsoft Access, SQL Server, PostgreSQL and SQLite ODBC drivers
//! implement it.
//!
//! Catalog reads and data reads use separate buffer limits. A data cell
//! longer than [`DATA_READ`] allows fails the whole table read rather than
//! being written truncated.

use odbc_api::buffers::TextRowSet;
use odbc_api::{ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use tracing::{debug, info, warn};

use crate::core::metadata::{fields, PRIMARY_KEY_INDEX};
use crate::core::{
    Collection, DataProvider, MetadataProvider, MetadataTable, Restrictions, RowSet, SqlValue,
};
use crate::error::{ExportError, Result};

/// Buffer sizing for one cursor read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Rows fetched per round trip.
    pub batch_size: usize,
    /// Upper bound in bytes for a single text cell.
    pub max_text_len: usize,
    /// Fail the read when a cell exceeds `max_text_len`.
    pub fail_on_truncation: bool,
}

/// Limits for catalog function results.
pub const CATALOG_READ: ReadLimits = ReadLimits {
    batch_size: 1000,
    max_text_len: 4096,
    fail_on_truncation: false,
};

/// Limits for table data.
pub const DATA_READ: ReadLimits = ReadLimits {
    batch_size: 5000,
    max_text_len: 65536,
    fail_on_truncation: true,
};

/// Renames from ODBC catalog result columns to collection fields.
const FIELD_RENAMES: &[(&str, &str)] = &[
    ("TABLE_CAT", fields::TABLE_CATALOG),
    ("TABLE_SCHEM", fields::TABLE_SCHEMA),
    ("REMARKS", "DESCRIPTION"),
    ("KEY_SEQ", fields::ORDINAL_POSITION),
];

/// Metadata and data provider over an ODBC connection string.
pub struct OdbcSource {
    env: Environment,
    connection_string: String,
}

impl OdbcSource {
    /// Create the ODBC environment and verify the connection string.
    pub fn new(connection_string: impl Into<String>) -> Result<Self> {
        let env = Environment::new()?;
        let source = Self {
            env,
            connection_string: connection_string.into(),
        };
        source
            .connect()
            .map_err(|e| ExportError::metadata("", format!("cannot open ODBC connection: {}", e)))?;
        info!("Connected via ODBC");
        Ok(source)
    }

    fn connect(&self) -> std::result::Result<odbc_api::Connection<'_>, odbc_api::Error> {
        self.env
            .connect_with_connection_string(&self.connection_string, ConnectionOptions::default())
    }

    fn catalog_query(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
    ) -> std::result::Result<MetadataTable, odbc_api::Error> {
        let conn = self.connect()?;
        let catalog = restrictions.get(0).unwrap_or("");
        let schema = restrictions.get(1).unwrap_or("");

        match collection {
            Collection::All => Ok(collection_list()),
            Collection::Tables => {
                let table = restrictions.get(2).unwrap_or("%");
                let table_type = restrictions.get(3).unwrap_or("");
                let cursor = conn.tables(catalog, schema, table, table_type)?;
                Ok(rename_fields(read_cursor(cursor, &CATALOG_READ)?))
            }
            Collection::Views => {
                let table = restrictions.get(2).unwrap_or("%");
                let cursor = conn.tables(catalog, schema, table, "VIEW")?;
                Ok(rename_fields(read_cursor(cursor, &CATALOG_READ)?))
            }
            Collection::Columns => {
                let table = restrictions.get(2).unwrap_or("%");
                let column = restrictions.get(3).unwrap_or("%");
                let cursor = conn.columns(catalog, schema, table, column)?;
                Ok(translate_column_types(rename_fields(read_cursor(cursor, &CATALOG_READ)?)))
            }
            Collection::Indexes => {
                let table = restrictions.get(4).unwrap_or("");
                let cursor = conn.primary_keys(restrictions.get(0), restrictions.get(1), table)?;
                let rows = read_cursor(cursor, &CATALOG_READ)?;
                Ok(primary_key_rows(rename_fields(rows)))
            }
        }
    }
}

impl MetadataProvider for OdbcSource {
    fn get_schema(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
    ) -> Result<MetadataTable> {
        if collection == Collection::Indexes && restrictions.get(4).is_none() {
            return Err(ExportError::metadata(
                collection.name(),
                "ODBC sources list primary keys one table at a time",
            ));
        }
        let table = self
            .catalog_query(collection, restrictions)
            .map_err(|e| match collection {
                Collection::Indexes => indexes_unavailable(restrictions.get(4), &e.to_string()),
                _ => ExportError::metadata(collection.name(), e.to_string()),
            })?;
        debug!("{}: {} rows", collection.title(), table.len());
        Ok(restrictions.apply(collection, &table))
    }

    fn describe(&self) -> String {
        let dsn = self
            .connection_string
            .split(';')
            .filter_map(|part| part.split_once('='))
            .find(|(key, _)| {
                let key = key.trim();
                key.eq_ignore_ascii_case("DSN") || key.eq_ignore_ascii_case("DBQ")
            })
            .map(|(_, value)| value.trim().to_string());
        match dsn {
            Some(name) => format!("ODBC source {}", name),
            None => "ODBC source".to_string(),
        }
    }
}

impl DataProvider for OdbcSource {
    fn query_rows(&self, sql: &str) -> Result<RowSet> {
        let conn = self
            .connect()
            .map_err(|e| ExportError::data(sql, e.to_string()))?;
        match conn.execute(sql, ()) {
            Ok(Some(cursor)) => {
                read_cursor(cursor, &DATA_READ).map_err(|e| data_read_error(sql, &e, &DATA_READ))
            }
            Ok(None) => Err(ExportError::data(sql, "statement returned no result set")),
            Err(e) => Err(ExportError::data(sql, e.to_string())),
        }
    }
}

/// Read every row of `cursor` as text cells.
fn read_cursor(
    mut cursor: impl Cursor,
    limits: &ReadLimits,
) -> std::result::Result<RowSet, odbc_api::Error> {
    let columns = cursor
        .column_names()?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    let mut rows = Vec::new();

    let mut buffers =
        TextRowSet::for_cursor(limits.batch_size, &mut cursor, Some(limits.max_text_len))?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers)?;
    while let Some(batch) = row_cursor.fetch_with_truncation_check(limits.fail_on_truncation)? {
        for row_idx in 0..batch.num_rows() {
            let row = (0..batch.num_cols())
                .map(|col_idx| match batch.at(col_idx, row_idx) {
                    Some(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
                    None => SqlValue::Null,
                })
                .collect();
            rows.push(row);
        }
    }
    Ok(RowSet::new(columns, rows))
}

/// Data error for a failed table read, naming the cell limit on truncation.
fn data_read_error(sql: &str, err: &odbc_api::Error, limits: &ReadLimits) -> ExportError {
    if matches!(err, odbc_api::Error::TooLargeValueForBuffer { .. }) {
        warn!(
            "{}: a text cell exceeds {} bytes, table data skipped",
            sql, limits.max_text_len
        );
        ExportError::data(
            sql,
            format!("text cell longer than {} bytes: {}", limits.max_text_len, err),
        )
    } else {
        ExportError::data(sql, err.to_string())
    }
}

/// Metadata error for a failed `SQLPrimaryKeys` call.
fn indexes_unavailable(table: Option<&str>, detail: &str) -> ExportError {
    ExportError::metadata(
        Collection::Indexes.name(),
        format!(
            "SQLPrimaryKeys failed for {}; the driver may not support it: {}",
            table.unwrap_or("?"),
            detail
        ),
    )
}

/// The collections this source can emulate.
fn collection_list() -> MetadataTable {
    let rows = Collection::ALL
        .iter()
        .filter(|c| **c != Collection::All)
        .map(|c| {
            vec![
                SqlValue::from(c.name()),
                SqlValue::Int(c.restriction_columns().len() as i64),
            ]
        })
        .collect();
    MetadataTable::new(
        vec![fields::COLLECTION_NAME.into(), fields::NUMBER_OF_RESTRICTIONS.into()],
        rows,
    )
}

fn rename_fields(mut table: MetadataTable) -> MetadataTable {
    for column in table.columns.iter_mut() {
        let rename = FIELD_RENAMES
            .iter()
            .find(|(from, _)| column.eq_ignore_ascii_case(from));
        if let Some((_, to)) = rename {
            *column = (*to).to_string();
        }
    }
    table
}

/// Replace ODBC SQL type codes in `DATA_TYPE` with provider type codes.
fn translate_column_types(mut table: MetadataTable) -> MetadataTable {
    if let Some(idx) = table.column_index_ignore_case(fields::DATA_TYPE) {
        for row in table.rows.iter_mut() {
            if let Some(cell) = row.get_mut(idx) {
                *cell = match cell.as_i64() {
                    Some(code) => SqlValue::Int(i64::from(provider_type_code(code))),
                    None => SqlValue::Null,
                };
            }
        }
    }
    table
}

/// Shape `SQLPrimaryKeys` rows as primary key index rows.
fn primary_key_rows(mut table: MetadataTable) -> MetadataTable {
    table.columns.push(fields::INDEX_NAME.into());
    table.columns.push(fields::PRIMARY_KEY.into());
    for row in table.rows.iter_mut() {
        row.push(SqlValue::from(PRIMARY_KEY_INDEX));
        row.push(SqlValue::Bool(true));
    }
    table
}

/// Translate an ODBC SQL type code into a provider type code.
///
/// Unknown codes translate to 0, which maps to BLOB.
pub fn provider_type_code(sql_type: i64) -> i32 {
    match sql_type {
        // SQL_BIT
        -7 => 11,
        // SQL_TINYINT, SQL_SMALLINT, SQL_INTEGER, SQL_BIGINT
        -6 => 17,
        5 => 2,
        4 => 3,
        -5 => 20,
        // SQL_REAL, SQL_FLOAT, SQL_DOUBLE
        7 => 4,
        6 | 8 => 5,
        // SQL_NUMERIC, SQL_DECIMAL
        2 => 131,
        3 => 14,
        // SQL_CHAR, SQL_VARCHAR, SQL_LONGVARCHAR
        1 => 129,
        12 => 200,
        -1 => 201,
        // SQL_WCHAR, SQL_WVARCHAR, SQL_WLONGVARCHAR
        -8 => 130,
        -9 => 202,
        -10 => 203,
        // SQL_DATE, SQL_TIME, SQL_TIMESTAMP and their ODBC 3 forms
        9 | 91 => 133,
        10 | 92 => 134,
        11 | 93 => 135,
        // SQL_BINARY, SQL_VARBINARY, SQL_LONGVARBINARY
        -2 => 128,
        -3 => 204,
        -4 => 205,
        // SQL_GUID
        -11 => 72,
        _ => 0,
    }
}
