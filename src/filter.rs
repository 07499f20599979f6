//! Structural filtering: multi-unit exclusion and fill-ratio pruning.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::profile::missing_fraction;
use crate::types::{Dataset, FillRatio, Value};

/// Which rows count as multi-unit properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitRule {
    /// Unit-count column
    pub column: String,

    /// Unit counts whose rows are removed
    pub excluded: Vec<f64>,
}

impl Default for UnitRule {
    fn default() -> Self {
        Self {
            column: "unitcnt".to_string(),
            excluded: vec![2.0, 3.0],
        }
    }
}

impl UnitRule {
    fn excludes(&self, value: &Value) -> bool {
        match value.as_f64() {
            Some(units) => self.excluded.contains(&units),
            None => false,
        }
    }
}

/// Remove rows whose unit count is one of the excluded values.
///
/// Rows with a missing or any other unit count are kept, as is every row
/// when the unit column is absent.
pub fn filter_single_unit(dataset: &Dataset, rule: &UnitRule) -> Dataset {
    let mut out = dataset.clone();

    let Some(units) = dataset.column(&rule.column) else {
        debug!(column = %rule.column, "unit column absent, nothing to filter");
        return out;
    };

    let keep: Vec<bool> = units.values.iter().map(|v| !rule.excludes(v)).collect();
    out.retain_rows(&keep);

    info!(
        removed = dataset.row_count() - out.row_count(),
        remaining = out.row_count(),
        "removed multi-unit properties"
    );
    out
}

/// True unless `fraction` is above `limit`.
/// NaN (a table with no rows) counts as within the limit, so an empty table
/// keeps its columns.
fn within_limit(fraction: f64, limit: f64) -> bool {
    fraction.partial_cmp(&limit) != Some(Ordering::Greater)
}

/// Drop sparse columns, then sparse rows.
///
/// A column goes when its missing proportion exceeds `1 - min_col_fill`.
/// Every column is judged against the input table in a single pass.
/// A row then goes when it has fewer than
/// `floor(min_row_fill * remaining_columns)` non-missing cells.
pub fn prune(dataset: &Dataset, min_col_fill: FillRatio, min_row_fill: FillRatio) -> Dataset {
    let max_missing = 1.0 - min_col_fill.get();
    let rows = dataset.row_count();
    let mut out = dataset.clone();

    let dropped = out.retain_columns(|c| {
        within_limit(missing_fraction(c.missing_count(), rows), max_missing)
    });
    if !dropped.is_empty() {
        debug!(columns = ?dropped, "dropped sparse columns");
    }

    let required = (min_row_fill.get() * out.column_count() as f64).floor() as usize;
    let keep: Vec<bool> = (0..out.row_count())
        .map(|row| out.non_missing_in_row(row) >= required)
        .collect();
    out.retain_rows(&keep);

    info!(
        dropped_columns = dropped.len(),
        dropped_rows = rows - out.row_count(),
        required_per_row = required,
        "pruned by fill ratio"
    );
    out
}
