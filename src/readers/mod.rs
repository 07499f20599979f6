pub mod csv;
pub mod excel;

use std::path::Path;

use tracing::debug;

use crate::inference::{infer_column, parse_cell};
use crate::types::{Column, Dataset, FileFormat, Result};

/// Common trait for sources that hand back a raw property snapshot
pub trait DataReader {
    /// Load the whole source into memory
    fn load(&mut self) -> Result<Dataset>;
}

/// Create a reader for the given file path
pub fn create_reader(path: &Path) -> Result<Box<dyn DataReader>> {
    let format = FileFormat::from_path(path)?;

    match format {
        FileFormat::Csv => Ok(Box::new(csv::CsvReader::new(path)?)),
        FileFormat::Tsv => Ok(Box::new(csv::CsvReader::new_tsv(path)?)),
        FileFormat::Excel => Ok(Box::new(excel::ExcelReader::new(path)?)),
    }
}

/// Build a typed dataset from a header row and raw string rows.
///
/// Short rows are padded with the missing marker; cells beyond the header
/// width are ignored. Each column's type is inferred from all of its values.
pub fn build_dataset(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Dataset> {
    let num_cols = headers.len();
    let mut raw_columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); num_cols];

    for row in rows {
        let mut cells = row.into_iter();
        for raw_column in raw_columns.iter_mut() {
            raw_column.push(cells.next().unwrap_or_default());
        }
    }

    let columns: Vec<Column> = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, raw)| {
            let dtype = infer_column(raw.iter().map(String::as_str));
            debug!(column = %name, ?dtype, "inferred column type");
            let values = raw.iter().map(|cell| parse_cell(cell, dtype)).collect();
            Column::new(name, dtype, values)
        })
        .collect();

    Dataset::from_columns(columns)
}
