use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::pipeline::{PipelineOutcome, StageSummary};
use crate::profile::MissingnessReport;
use crate::source::SourceInfo;
use crate::types::{Dataset, FillRatio, Result};

/// Report format version
pub const REPORT_VERSION: &str = "1.0.0";

/// JSON document written by `profile`
#[derive(Debug, Serialize)]
pub struct ProfileDocument<'a> {
    pub version: &'static str,
    pub source: &'a SourceInfo,
    pub missingness: &'a MissingnessReport,
}

impl<'a> ProfileDocument<'a> {
    pub fn new(source: &'a SourceInfo, missingness: &'a MissingnessReport) -> Self {
        Self {
            version: REPORT_VERSION,
            source,
            missingness,
        }
    }
}

/// JSON document written by `prepare --summary`
#[derive(Debug, Serialize)]
pub struct PrepareDocument<'a> {
    pub version: &'static str,
    pub source: &'a SourceInfo,
    pub min_col_fill_ratio: FillRatio,
    pub min_row_fill_ratio: FillRatio,
    pub missingness: &'a MissingnessReport,
    pub stages: &'a [StageSummary],
    pub output_columns: Vec<&'a str>,
}

impl<'a> PrepareDocument<'a> {
    pub fn new(
        source: &'a SourceInfo,
        ratios: (FillRatio, FillRatio),
        outcome: &'a PipelineOutcome,
    ) -> Self {
        Self {
            version: REPORT_VERSION,
            source,
            min_col_fill_ratio: ratios.0,
            min_row_fill_ratio: ratios.1,
            missingness: &outcome.missingness,
            stages: &outcome.stages,
            output_columns: outcome.dataset.column_names(),
        }
    }
}

/// Write a document to a JSON file
pub fn write_json_file<T: Serialize>(document: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

/// Write a document to a JSON string
pub fn to_json_string<T: Serialize>(document: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Write a document to stdout
pub fn write_json_stdout<T: Serialize>(document: &T) -> Result<()> {
    let json = to_json_string(document)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}

/// Write a dataset as CSV with a header row
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    // csv would write each empty record as `""`
    if dataset.column_count() == 0 {
        warn!(rows = dataset.row_count(), "dataset has no columns, writing an empty file");
        return Ok(());
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.column_names())?;

    for row in 0..dataset.row_count() {
        csv_writer.write_record(dataset.row(row).map(|v| v.to_string()))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write a dataset to a CSV file
pub fn write_csv_file(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(dataset, std::io::BufWriter::new(file))
}
