//! CSV reading and writing.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::{SerReader, SerWriter}, prelude::{Column, CsvReadOptions, CsvWriter}};

use crate::GeoTable;

/// Read a CSV file with a header row, keeping every column as a string.
pub(crate) fn read_csv_strings(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv] Failed to read CSV from {:?}", path))
}

/// Write a DataFrame to a CSV file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {:?}", path))
}

impl GeoTable {
    /// Write the attribute table as CSV, with the unit ids as a leading `geo_id` column.
    pub fn write_data_csv(&self, path: &Path) -> Result<()> {
        let mut columns = vec![Column::new("geo_id".into(), self.ids())];
        columns.extend(self.data().get_columns().iter().cloned());
        let mut df = DataFrame::new(columns)
            .context("[io::csv] geo_id clashes with an attribute column")?;
        write_csv(&mut df, path)
    }
}
