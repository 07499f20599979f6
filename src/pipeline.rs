use serde::Serialize;
use tracing::info;

use crate::clean::clean;
use crate::config::PrepareConfig;
use crate::filter::{filter_single_unit, prune};
use crate::profile::{profile, MissingnessReport};
use crate::types::{Dataset, Result};

/// Shape change produced by one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_in: usize,
    pub columns_out: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_columns: Vec<String>,
}

impl StageSummary {
    /// Summary for a stage that only removes columns, so anything missing
    /// from `after` was dropped
    fn between(stage: &'static str, before: &Dataset, after: &Dataset) -> Self {
        let dropped_columns = before
            .column_names()
            .into_iter()
            .filter(|name| !after.has_column(name))
            .map(str::to_string)
            .collect();
        Self::new(stage, before, after, dropped_columns)
    }

    fn new(
        stage: &'static str,
        before: &Dataset,
        after: &Dataset,
        dropped_columns: Vec<String>,
    ) -> Self {
        Self {
            stage,
            rows_in: before.row_count(),
            rows_out: after.row_count(),
            columns_in: before.column_count(),
            columns_out: after.column_count(),
            dropped_columns,
        }
    }
}

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Missingness of the raw snapshot
    pub missingness: MissingnessReport,
    pub dataset: Dataset,
    pub stages: Vec<StageSummary>,
}

/// Profile, filter and clean a raw snapshot.
///
/// Fails only when the config does not supply both fill ratios.
pub fn run(raw: Dataset, config: &PrepareConfig) -> Result<PipelineOutcome> {
    let (min_col_fill, min_row_fill) = config.thresholds.resolve()?;

    let missingness = profile(&raw);
    let mut stages = Vec::with_capacity(3);

    let single_unit = filter_single_unit(&raw, &config.unit_rule);
    stages.push(StageSummary::between("single_unit", &raw, &single_unit));

    let pruned = prune(&single_unit, min_col_fill, min_row_fill);
    stages.push(StageSummary::between("prune", &single_unit, &pruned));

    let cleaned = clean(&pruned, &config.cleaning);
    stages.push(StageSummary::new(
        "clean",
        &pruned,
        &cleaned.dataset,
        cleaned.dropped_columns,
    ));

    for stage in &stages {
        info!(
            stage = stage.stage,
            rows_in = stage.rows_in,
            rows_out = stage.rows_out,
            columns_in = stage.columns_in,
            columns_out = stage.columns_out,
            "stage finished"
        );
    }

    Ok(PipelineOutcome {
        missingness,
        dataset: cleaned.dataset,
        stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::REDUNDANT_COLUMNS;
    use crate::config::Thresholds;
    use crate::types::{Column, DType, FillRatio, Value};

    fn numeric(name: &str, cells: &[Option<f64>]) -> Column {
        let values = cells
            .iter()
            .map(|c| c.map(Value::Number).unwrap_or(Value::Missing))
            .collect();
        Column::new(name, DType::Numeric, values)
    }

    fn config(col: f64, row: f64) -> PrepareConfig {
        PrepareConfig {
            thresholds: Thresholds {
                min_col_fill_ratio: Some(FillRatio::new(col).unwrap()),
                min_row_fill_ratio: Some(FillRatio::new(row).unwrap()),
            },
            ..PrepareConfig::default()
        }
    }

    fn snapshot() -> Dataset {
        Dataset::from_columns(vec![
            numeric("parcelid", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0].map(Some)),
            numeric("unitcnt", &[Some(1.0), Some(2.0), None, Some(1.0), Some(3.0), Some(1.0)]),
            numeric("bathroomcnt", &[Some(2.5), Some(1.0), Some(2.0), None, Some(3.0), Some(1.0)]),
            numeric("fullbathcnt", &[Some(2.0), Some(1.0), Some(2.0), None, Some(3.0), Some(1.0)]),
            numeric("bedroomcnt", &[3.0, 2.0, 4.0, 3.0, 5.0, 2.0].map(Some)),
            numeric("fips", &[6037.0, 6059.0, 6111.0, 6037.0, 6037.0, 1234.0].map(Some)),
            numeric("poolcnt", &[None, None, None, None, Some(1.0), None]),
            numeric("roomcnt", &[Some(0.0); 6]),
        ])
        .unwrap()
    }

    #[test]
    fn test_run_end_to_end() {
        let outcome = run(snapshot(), &config(0.5, 0.5)).unwrap();
        let ds = &outcome.dataset;

        assert_eq!(outcome.missingness.len(), 8);
        assert_eq!(ds.missing_cell_count(), 0);
        // poolcnt pruned, unitcnt kept but its missing row removed by listwise deletion
        assert!(!ds.has_column("poolcnt"));
        assert_eq!(
            ds.column("parcelid").unwrap().values,
            vec![Value::Number(1.0), Value::Number(6.0)]
        );
        assert_eq!(
            ds.column("half_bath").unwrap().values,
            vec![Value::Number(1.0), Value::Number(0.0)]
        );
        assert_eq!(
            ds.column("county").unwrap().values,
            vec![Value::Text("LA County".to_string()), Value::Number(1234.0)]
        );
        for redundant in REDUNDANT_COLUMNS {
            assert!(!ds.has_column(redundant));
        }
    }

    #[test]
    fn test_stage_summaries() {
        let outcome = run(snapshot(), &config(0.5, 0.5)).unwrap();
        let stages = &outcome.stages;

        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].stage, "single_unit");
        assert_eq!(stages[0].rows_in, 6);
        assert_eq!(stages[0].rows_out, 4);
        assert_eq!(stages[1].dropped_columns, vec!["poolcnt".to_string()]);
        assert_eq!(stages[2].rows_out, outcome.dataset.row_count());
        assert_eq!(stages[2].dropped_columns, vec!["roomcnt".to_string()]);
    }

    #[test]
    fn test_clean_summary_lists_only_dropped_columns() {
        let raw = Dataset::from_columns(vec![
            numeric("bathroomcnt", &[Some(2.0)]),
            numeric("fullbathcnt", &[Some(2.0)]),
            numeric("fips", &[Some(6037.0)]),
            numeric("roomcnt", &[Some(0.0)]),
        ])
        .unwrap();
        let outcome = run(raw, &config(0.5, 0.5)).unwrap();
        let clean = &outcome.stages[2];

        assert_eq!(clean.stage, "clean");
        assert_eq!(clean.dropped_columns, vec!["roomcnt".to_string()]);
        assert_eq!(clean.columns_in, 4);
        assert_eq!(clean.columns_out, 4);
    }

    #[test]
    fn test_run_requires_thresholds() {
        assert!(run(snapshot(), &PrepareConfig::default()).is_err());
    }

    #[test]
    fn test_run_on_empty_snapshot() {
        let raw =
            Dataset::from_columns(vec![numeric("unitcnt", &[]), numeric("fips", &[])]).unwrap();
        let outcome = run(raw, &config(0.5, 0.5)).unwrap();

        assert!(outcome.missingness.iter().all(|c| c.pct_rows_missing.is_nan()));
        assert_eq!(outcome.dataset.row_count(), 0);
        assert_eq!(outcome.dataset.column_names(), vec!["unitcnt", "county"]);
    }
}
