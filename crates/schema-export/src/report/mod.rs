//! Human-readable metadata log.
//!
//! Each collection becomes one section: a title line, an 80-character `=`
//! separator, a fixed-width header row and one fixed-width line per row.
//! The log documents the source; nothing downstream reads it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rust_decimal::RoundingStrategy;
use tracing::{info, warn};

use crate::core::{Collection, MetadataProvider, MetadataTable, Restrictions, SqlValue};
use crate::error::Result;

/// Width of the separator line.
pub const SEPARATOR_WIDTH: usize = 80;

/// Width of every column in the fixed-width layout.
pub const COLUMN_WIDTH: usize = 24;

/// Writes metadata collections to a log.
pub struct MetadataLogger<'a, P: MetadataProvider + ?Sized> {
    provider: &'a P,
    collections: Vec<Collection>,
}

impl<'a, P: MetadataProvider + ?Sized> MetadataLogger<'a, P> {
    /// Logger for every known collection.
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            collections: Collection::ALL.to_vec(),
        }
    }

    /// Restrict the log to `collections`, in the given order.
    #[must_use]
    pub fn with_collections(mut self, collections: &[Collection]) -> Self {
        self.collections = collections.to_vec();
        self
    }

    /// Create (truncating) `path` and write the log to it.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Writing metadata log to {}", path.display());
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write one section per collection to `out`.
    ///
    /// Unavailable collections are noted in the log and skipped.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for &collection in &self.collections {
            match self.provider.get_schema(collection, &Restrictions::none()) {
                Ok(table) => write_section(out, collection.title(), &table)?,
                Err(e) => {
                    warn!("Could not read {} for the log: {}", collection.title(), e);
                    writeln!(out, "{}", collection.title())?;
                    writeln!(out, "(unavailable)")?;
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }
}

/// Write a titled, fixed-width rendering of `table`.
pub fn write_section<W: Write>(out: &mut W, title: &str, table: &MetadataTable) -> Result<()> {
    writeln!(out, "{} ({} rows)", title, table.len())?;
    writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))?;

    let header: Vec<String> = table.columns.iter().map(|c| fixed_width(c)).collect();
    writeln!(out, "{}", header.join(" ").trim_end())?;

    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|value| fixed_width(&display_cell(value)))
            .collect();
        writeln!(out, "{}", cells.join(" ").trim_end())?;
    }
    writeln!(out)?;
    Ok(())
}

/// Display form of a cell in the log.
pub fn display_cell(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        SqlValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        SqlValue::DateTimeOffset(dt) => dt.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        SqlValue::Decimal(d) => {
            let rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.2}", rounded)
        }
        SqlValue::Bytes(b) => format!("<{} bytes>", b.len()),
        other => other.to_string(),
    }
}

/// Pad or truncate `text` to [`COLUMN_WIDTH`] characters.
fn fixed_width(text: &str) -> String {
    let single_line = text.replace(['\r', '\n', '\t'], " ");
    let truncated: String = single_line.chars().take(COLUMN_WIDTH).collect();
    format!("{:<width$}", truncated, width = COLUMN_WIDTH)
}
