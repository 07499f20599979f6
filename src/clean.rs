//! Final cleaning: listwise deletion, redundant-column removal, the derived
//! half-bath count, analysis-friendly names and readable county labels.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{Column, DType, Dataset, Value};

/// Columns whose information is duplicated elsewhere or unused downstream
pub const REDUNDANT_COLUMNS: &[&str] = &[
    "finishedsquarefeet12",
    "roomcnt",
    "censustractandblock",
    "landtaxvaluedollarcnt",
    "taxamount",
    "structuretaxvaluedollarcnt",
    "propertycountylandusecode",
    "propertylandusetypeid",
    "propertylandusedesc",
];

/// Source name to analysis name
pub const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("bedroomcnt", "bed"),
    ("bathroomcnt", "bath"),
    ("calculatedfinishedsquarefeet", "square_feet"),
    ("fips", "county"),
    ("lotsizesquarefeet", "lot_square_feet"),
    ("regionidcity", "id_city"),
    ("regionidcounty", "id_county"),
    ("regionidzip", "id_zip"),
    ("taxvaluedollarcnt", "appraisal"),
];

/// FIPS county code to county label
pub const COUNTY_NAMES: &[(f64, &str)] = &[
    (6037.0, "LA County"),
    (6059.0, "Orange County"),
    (6111.0, "Ventura County"),
];

/// One entry of the rename table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// One entry of the county-code map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyName {
    pub code: f64,
    pub name: String,
}

/// How the half-bath count is derived from total and full bath counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalfBathRule {
    /// Name of the derived column
    pub column: String,
    /// Total bathroom count (half baths count as 0.5)
    pub total: String,
    /// Full bathroom count
    pub full: String,
    pub divisor: f64,
}

impl Default for HalfBathRule {
    fn default() -> Self {
        Self {
            column: "half_bath".to_string(),
            total: "bathroomcnt".to_string(),
            full: "fullbathcnt".to_string(),
            divisor: 0.5,
        }
    }
}

/// Fixed drop/derive/rename/recode tables for the cleaning stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    pub redundant_columns: Vec<String>,
    pub half_bath: HalfBathRule,
    pub renames: Vec<Rename>,
    /// County column, by its name after renaming
    pub county_column: String,
    pub county_names: Vec<CountyName>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            redundant_columns: REDUNDANT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            half_bath: HalfBathRule::default(),
            renames: COLUMN_RENAMES
                .iter()
                .map(|(from, to)| Rename {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
            county_column: "county".to_string(),
            county_names: COUNTY_NAMES
                .iter()
                .map(|(code, name)| CountyName {
                    code: *code,
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

impl CleaningRules {
    fn county_label(&self, code: f64) -> Option<&str> {
        self.county_names
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }
}

/// A cleaned dataset and the redundant columns actually removed from it
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub dropped_columns: Vec<String>,
}

/// Run the cleaning steps in order. The input is left untouched.
pub fn clean(dataset: &Dataset, rules: &CleaningRules) -> Cleaned {
    let mut out = dataset.clone();

    drop_incomplete_rows(&mut out);

    let dropped = out.drop_columns(&rules.redundant_columns);
    debug!(columns = ?dropped, "dropped redundant columns");

    add_half_bath(&mut out, &rules.half_bath);

    let pairs: Vec<(&str, &str)> = rules
        .renames
        .iter()
        .map(|r| (r.from.as_str(), r.to.as_str()))
        .collect();
    let renamed = out.rename_columns(&pairs);

    let recoded = recode_county(&mut out, rules);

    info!(
        rows = out.row_count(),
        columns = out.column_count(),
        dropped_columns = dropped.len(),
        renamed,
        recoded,
        missing_cells = out.missing_cell_count(),
        "cleaned dataset"
    );
    Cleaned {
        dataset: out,
        dropped_columns: dropped,
    }
}

/// Listwise deletion: keep only rows without any missing cell
fn drop_incomplete_rows(dataset: &mut Dataset) {
    let before = dataset.row_count();
    let keep: Vec<bool> = (0..before)
        .map(|row| !dataset.row(row).any(Value::is_missing))
        .collect();
    dataset.retain_rows(&keep);
    debug!(removed = before - dataset.row_count(), "dropped incomplete rows");
}

/// `(total - full) / divisor`, appended (or replaced) as a numeric column
fn add_half_bath(dataset: &mut Dataset, rule: &HalfBathRule) {
    let (Some(total), Some(full)) = (dataset.column(&rule.total), dataset.column(&rule.full))
    else {
        warn!(
            total = %rule.total,
            full = %rule.full,
            "bath count columns absent, {} not derived",
            rule.column
        );
        return;
    };

    let values: Option<Vec<Value>> = total
        .values
        .iter()
        .zip(&full.values)
        .map(|(t, f)| Some(Value::Number((t.as_f64()? - f.as_f64()?) / rule.divisor)))
        .collect();

    let Some(values) = values else {
        warn!("non-numeric bath counts, {} not derived", rule.column);
        return;
    };

    // Lengths come from existing columns, so this cannot fail
    if let Err(e) = dataset.set_column(Column::new(rule.column.clone(), DType::Numeric, values)) {
        warn!(error = %e, "could not add {}", rule.column);
    }
}

/// Replace known county codes with labels; other values stay as they are.
/// Returns the number of recoded cells.
fn recode_county(dataset: &mut Dataset, rules: &CleaningRules) -> usize {
    let Some(county) = dataset.column(&rules.county_column) else {
        return 0;
    };

    let mut recoded = 0;
    let values: Vec<Value> = county
        .values
        .iter()
        .map(|value| {
            match value.as_f64().and_then(|code| rules.county_label(code)) {
                Some(label) => {
                    recoded += 1;
                    Value::Text(label.to_string())
                }
                None => value.clone(),
            }
        })
        .collect();

    let dtype = if recoded > 0 { DType::Text } else { county.dtype };
    let column = Column::new(rules.county_column.clone(), dtype, values);
    if let Err(e) = dataset.set_column(column) {
        warn!(error = %e, "could not recode {}", rules.county_column);
        return 0;
    }
    recoded
}
