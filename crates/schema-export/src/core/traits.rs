//! Collaborator traits consumed by the schema builder and the script generator.
//!
//! - [`MetadataProvider`]: answers structural queries (tables, columns, indexes, views)
//! - [`DataProvider`]: returns row sets for SELECT statements
//!
//! Both are blocking. Implementations report failures as errors; the
//! builder and generator decide how to recover (skip the table, emit NULL).

use crate::error::Result;

use super::metadata::{Collection, MetadataTable, Restrictions};
use super::value::RowSet;

/// Read structural metadata from a source database.
pub trait MetadataProvider {
    /// Retrieve a metadata collection, filtered by positional restrictions.
    ///
    /// Returns `ExportError::Metadata` when the request cannot be answered.
    fn get_schema(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
    ) -> Result<MetadataTable>;

    /// Short description of the source for logs (never includes credentials).
    fn describe(&self) -> String;
}

/// Fetch table rows from a source database.
pub trait DataProvider {
    /// Run a SELECT statement and return every row.
    ///
    /// Returns `ExportError::Data` when the query fails.
    fn query_rows(&self, sql: &str) -> Result<RowSet>;
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for &T {
    fn get_schema(
        &self,
        collection: Collection,
        restrictions: &Restrictions,
    ) -> Result<MetadataTable> {
        (**self).get_schema(collection, restrictions)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: DataProvider + ?Sized> DataProvider for &T {
    fn query_rows(&self, sql: &str) -> Result<RowSet> {
        (**self).query_rows(sql)
    }
}
