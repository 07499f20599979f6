use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Format used when writing date cells back out
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The explicit "no value" marker
    Missing,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

/// Data type classification for columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Numeric,
    Date,
    Text,
}

/// A named column holding one cell per row
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Number of cells holding the missing marker
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }
}

/// Column-oriented table. Rows are implicitly indexed `0..row_count`.
///
/// Every column holds exactly `row_count` values. The row count is kept
/// separately so a table whose columns were all pruned still knows its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    row_count: usize,
    columns: Vec<Column>,
}

impl Dataset {
    /// An empty table with `row_count` rows and no columns
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            columns: Vec::new(),
        }
    }

    /// Build a table from columns; all columns must have the same length
    /// and distinct names
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut dataset = Self::new(row_count);
        for column in columns {
            if dataset.has_column(&column.name) {
                return Err(crate::error::Error::InvalidInput(format!(
                    "Duplicate column name: {}",
                    column.name
                )));
            }
            dataset.set_column(column)?;
        }
        Ok(dataset)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Replace the column with the same name, or append it
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.values.len() != self.row_count {
            return Err(crate::error::Error::InvalidInput(format!(
                "Column '{}' has {} values, expected {}",
                column.name,
                column.values.len(),
                self.row_count
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Keep the rows whose entry in `keep` is true.
    /// Rows past the end of `keep` are dropped.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.row_count);

        for column in &mut self.columns {
            let mut idx = 0;
            column.values.retain(|_| {
                let k = keep.get(idx).copied().unwrap_or(false);
                idx += 1;
                k
            });
        }
        self.row_count = keep.iter().take(self.row_count).filter(|k| **k).count();
    }

    /// Remove the named columns. Names that are not present are ignored.
    /// Returns the names that were actually removed, in table order.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        self.retain_columns(|c| !names.iter().any(|n| n.as_ref() == c.name))
    }

    /// Keep the columns matching `keep`; returns the names of the dropped ones
    pub fn retain_columns<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&Column) -> bool,
    {
        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            let k = keep(c);
            if !k {
                dropped.push(c.name.clone());
            }
            k
        });
        dropped
    }

    /// Rename columns by `(from, to)` pairs, all at once. Absent sources are
    /// skipped, and so is any rename whose target would clash with another
    /// column's final name. Returns how many columns were renamed.
    pub fn rename_columns<S: AsRef<str>>(&mut self, pairs: &[(S, S)]) -> usize {
        let mut targets: Vec<Option<&str>> = self
            .columns
            .iter()
            .map(|c| {
                pairs
                    .iter()
                    .find(|(from, _)| from.as_ref() == c.name)
                    .map(|(_, to)| to.as_ref())
            })
            .collect();

        // Undoing one rename can expose another clash, so repeat until stable
        loop {
            let final_name = |i: usize| targets[i].unwrap_or(self.columns[i].name.as_str());
            let clash = (0..targets.len()).find(|&i| {
                targets[i].is_some()
                    && (0..targets.len()).any(|j| j != i && final_name(j) == final_name(i))
            });
            let Some(i) = clash else {
                break;
            };
            warn!(
                from = %self.columns[i].name,
                to = targets[i].unwrap_or_default(),
                "rename target already taken, column keeps its name"
            );
            targets[i] = None;
        }

        let mut renamed = 0;
        for (column, target) in self.columns.iter_mut().zip(targets) {
            if let Some(to) = target {
                column.name = to.to_string();
                renamed += 1;
            }
        }
        renamed
    }

    /// Cells of one row, in column order
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Value> + '_ {
        self.columns.iter().filter_map(move |c| c.values.get(row))
    }

    /// Number of non-missing cells in a row
    pub fn non_missing_in_row(&self, row: usize) -> usize {
        self.row(row).filter(|v| !v.is_missing()).count()
    }

    /// Total number of missing cells in the table
    pub fn missing_cell_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }
}

/// Fraction of non-missing cells required to keep a column or a row.
/// Always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FillRatio(f64);

impl FillRatio {
    pub fn new(ratio: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(crate::error::Error::InvalidInput(format!(
                "Fill ratio must be between 0 and 1, got {}",
                ratio
            )))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FillRatio {
    type Error = crate::error::Error;

    fn try_from(ratio: f64) -> Result<Self> {
        Self::new(ratio)
    }
}

impl From<FillRatio> for f64 {
    fn from(ratio: FillRatio) -> Self {
        ratio.0
    }
}

/// Supported snapshot file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" => Some(FileFormat::Excel),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        Self::from_extension(ext).ok_or_else(|| {
            crate::error::Error::UnsupportedFormat(format!(
                "Unsupported file extension: .{}",
                ext
            ))
        })
    }
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;
