use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clean::CleaningRules;
use crate::error::Error;
use crate::filter::UnitRule;
use crate::types::{FillRatio, Result};

/// Fill-ratio thresholds for the pruning stage.
///
/// Either may be left out of a config file; the caller must then supply it
/// before the pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_col_fill_ratio: Option<FillRatio>,
    pub min_row_fill_ratio: Option<FillRatio>,
}

impl Thresholds {
    /// Both ratios, or an error naming the first one missing
    pub fn resolve(&self) -> Result<(FillRatio, FillRatio)> {
        let col = self.min_col_fill_ratio.ok_or_else(|| {
            Error::InvalidInput("min_col_fill_ratio is required".to_string())
        })?;
        let row = self.min_row_fill_ratio.ok_or_else(|| {
            Error::InvalidInput("min_row_fill_ratio is required".to_string())
        })?;
        Ok((col, row))
    }
}

/// Everything the preparation pipeline needs besides the data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub thresholds: Thresholds,
    pub unit_rule: UnitRule,
    pub cleaning: CleaningRules,
}

impl PrepareConfig {
    /// Read a TOML config file; absent sections fall back to the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: PrepareConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The rename table must be a bijection
    pub fn validate(&self) -> Result<()> {
        let mut sources = HashSet::new();
        let mut targets = HashSet::new();

        for rename in &self.cleaning.renames {
            if !sources.insert(rename.from.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Column '{}' is renamed more than once",
                    rename.from
                )));
            }
            if !targets.insert(rename.to.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "More than one column is renamed to '{}'",
                    rename.to
                )));
            }
        }

        if self.cleaning.half_bath.divisor == 0.0 {
            return Err(Error::InvalidInput(
                "half_bath divisor must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        let config = PrepareConfig::from_toml("").unwrap();
        assert_eq!(config, PrepareConfig::default());
        assert_eq!(config.unit_rule.column, "unitcnt");
        assert_eq!(config.cleaning.renames.len(), 9);
        assert!(config.thresholds.resolve().is_err());
    }

    #[test]
    fn test_thresholds_from_toml() {
        let config = PrepareConfig::from_toml(
            "[thresholds]\nmin_col_fill_ratio = 0.6\nmin_row_fill_ratio = 0.75\n",
        )
        .unwrap();

        let (col, row) = config.thresholds.resolve().unwrap();
        assert_eq!(col.get(), 0.6);
        assert_eq!(row.get(), 0.75);
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let result = PrepareConfig::from_toml("[thresholds]\nmin_col_fill_ratio = 1.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_cleaning_tables() {
        let content = r#"
[unit_rule]
excluded = [2.0, 3.0, 4.0]

[cleaning]
redundant_columns = ["roomcnt"]
county_column = "county"

[[cleaning.renames]]
from = "fips"
to = "county"

[[cleaning.county_names]]
code = 6037.0
name = "Los Angeles"
"#;
        let config = PrepareConfig::from_toml(content).unwrap();

        assert_eq!(config.unit_rule.column, "unitcnt");
        assert_eq!(config.unit_rule.excluded, vec![2.0, 3.0, 4.0]);
        assert_eq!(config.cleaning.redundant_columns, vec!["roomcnt"]);
        assert_eq!(config.cleaning.renames.len(), 1);
        assert_eq!(config.cleaning.county_names[0].name, "Los Angeles");
        assert_eq!(config.cleaning.half_bath.divisor, 0.5);
    }

    #[test]
    fn test_rename_must_be_bijection() {
        let content = r#"
[[cleaning.renames]]
from = "a"
to = "x"

[[cleaning.renames]]
from = "b"
to = "x"
"#;
        assert!(PrepareConfig::from_toml(content).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(file, "[thresholds]\nmin_row_fill_ratio = 0.5\n").unwrap();

        let config = PrepareConfig::load(file.path()).unwrap();
        assert_eq!(config.thresholds.min_row_fill_ratio.unwrap().get(), 0.5);
        assert!(config.thresholds.min_col_fill_ratio.is_none());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = PrepareConfig::from_toml(include_str!("../config/zillow.toml")).unwrap();

        assert_eq!(config.unit_rule, UnitRule::default());
        assert_eq!(config.cleaning, CleaningRules::default());
        assert!(config.thresholds.resolve().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(PrepareConfig::load(Path::new("/nonexistent/prep.toml")).is_err());
    }
}
