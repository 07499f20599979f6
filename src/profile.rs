//! Missingness profiling.
//!
//! The report is read-only decision support: nothing here mutates the dataset.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Dataset;

/// Missing-data figures for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissingness {
    /// Column name (unique within a report)
    pub name: String,

    /// Number of rows holding the missing marker
    pub num_rows_missing: usize,

    /// `num_rows_missing / row_count`; NaN when the dataset has no rows
    /// (serialized as `null`)
    pub pct_rows_missing: f64,
}

/// Per-column missingness, in the dataset's column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingnessReport {
    pub row_count: usize,
    pub columns: Vec<ColumnMissingness>,
}

impl MissingnessReport {
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&ColumnMissingness> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnMissingness> {
        self.columns.iter()
    }

    /// Columns whose missing proportion is strictly above `pct`.
    /// NaN proportions never qualify.
    pub fn columns_above(&self, pct: f64) -> Vec<&str> {
        self.iter()
            .filter(|c| c.pct_rows_missing > pct)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Count missing cells per column
pub fn profile(dataset: &Dataset) -> MissingnessReport {
    let row_count = dataset.row_count();

    let columns = dataset
        .columns()
        .iter()
        .map(|column| {
            let num_rows_missing = column.missing_count();
            ColumnMissingness {
                name: column.name.clone(),
                num_rows_missing,
                pct_rows_missing: missing_fraction(num_rows_missing, row_count),
            }
        })
        .collect();

    debug!(rows = row_count, columns = dataset.column_count(), "profiled missingness");

    MissingnessReport { row_count, columns }
}

/// `missing / rows`, NaN for an empty table
pub(crate) fn missing_fraction(missing: usize, rows: usize) -> f64 {
    if rows == 0 {
        f64::NAN
    } else {
        missing as f64 / rows as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DType, Value};

    fn column(name: &str, cells: &[Option<f64>]) -> Column {
        let values = cells
            .iter()
            .map(|c| c.map(Value::Number).unwrap_or(Value::Missing))
            .collect();
        Column::new(name, DType::Numeric, values)
    }

    #[test]
    fn test_profile_counts_and_order() {
        let ds = Dataset::from_columns(vec![
            column("z", &[Some(1.0), None, None, Some(4.0)]),
            column("a", &[Some(1.0), Some(2.0), Some(3.0), None]),
        ])
        .unwrap();

        let report = profile(&ds);

        assert_eq!(report.len(), 2);
        assert_eq!(report.columns[0].name, "z");
        assert_eq!(report.columns[1].name, "a");
        assert_eq!(report.get("z").unwrap().num_rows_missing, 2);
        assert_eq!(report.get("z").unwrap().pct_rows_missing, 0.5);
        assert_eq!(report.get("a").unwrap().pct_rows_missing, 0.25);
    }

    #[test]
    fn test_profile_never_exceeds_row_count() {
        let ds = Dataset::from_columns(vec![column("a", &[None, None, None])]).unwrap();
        let report = profile(&ds);

        for entry in report.iter() {
            assert!(entry.num_rows_missing <= ds.row_count());
        }
        assert_eq!(report.get("a").unwrap().pct_rows_missing, 1.0);
    }

    #[test]
    fn test_profile_zero_rows_is_nan() {
        let ds = Dataset::from_columns(vec![column("a", &[]), column("b", &[])]).unwrap();
        let report = profile(&ds);

        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|c| c.pct_rows_missing.is_nan()));
        assert!(report.iter().all(|c| c.num_rows_missing == 0));
    }

    #[test]
    fn test_profile_zero_columns() {
        let report = profile(&Dataset::new(10));
        assert!(report.is_empty());
        assert_eq!(report.row_count, 10);
    }

    #[test]
    fn test_profile_does_not_mutate() {
        let ds = Dataset::from_columns(vec![column("a", &[Some(1.0), None])]).unwrap();
        let before = ds.clone();
        let _ = profile(&ds);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_columns_above() {
        let ds = Dataset::from_columns(vec![
            column("mostly_null", &[None, None, None, Some(1.0)]),
            column("full", &[Some(1.0); 4]),
        ])
        .unwrap();

        let report = profile(&ds);
        assert_eq!(report.columns_above(0.5), vec!["mostly_null"]);
        assert!(profile(&Dataset::from_columns(vec![column("e", &[])]).unwrap())
            .columns_above(0.0)
            .is_empty());
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let ds = Dataset::from_columns(vec![column("a", &[])]).unwrap();
        let json = serde_json::to_string(&profile(&ds)).unwrap();
        assert!(json.contains("\"pct_rows_missing\":null"));
    }
}
