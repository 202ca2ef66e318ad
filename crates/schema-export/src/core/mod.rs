//! Core abstractions shared by every stage of an export.
//!
//! - [`schema`]: portable types, columns, tables and the ordered schema model
//! - [`value`]: cell values and row sets returned by providers
//! - [`metadata`]: metadata collections and positional restrictions
//! - [`traits`]: the metadata and data provider seams
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod metadata;
pub mod schema;
pub mod traits;
pub mod value;

pub use metadata::{Collection, MetadataTable, Restrictions};
pub use schema::{PortableType, Schema, SchemaColumn, TableSchema};
pub use traits::{DataProvider, MetadataProvider};
pub use value::{Row, RowSet, SqlValue};
