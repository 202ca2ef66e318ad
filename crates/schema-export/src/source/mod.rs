//! Metadata and data providers.
//!
//! [`SnapshotSource`] replays a JSON snapshot. With the `odbc` feature,
//! [`OdbcSource`] reads a live database through an ODBC driver.

#[cfg(feature = "odbc")]
mod odbc;
mod snapshot;

#[cfg(feature = "odbc")]
pub use odbc::{provider_type_code, OdbcSource};
pub use snapshot::{CollectionSnapshot, Snapshot, SnapshotSource, TableData};
