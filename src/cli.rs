use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tracing::info;

use crate::config::PrepareConfig;
use crate::output::{self, PrepareDocument, ProfileDocument};
use crate::pipeline;
use crate::profile::profile;
use crate::source::load_snapshot;
use crate::types::{FillRatio, Result};

/// Missing-data profiling and cleaning for property transaction snapshots
#[derive(Parser, Debug)]
#[command(name = "parcel-prep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report missing values per column
    Profile {
        #[command(flatten)]
        source: SourceArgs,

        /// Output JSON file path (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Filter and clean a snapshot into an analysis-ready CSV
    Prepare {
        #[command(flatten)]
        source: SourceArgs,

        /// Output CSV file path
        #[arg(short, long)]
        out: PathBuf,

        /// TOML file with thresholds and cleaning tables
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Minimum fraction of non-missing cells to keep a column
        #[arg(long, value_parser = parse_fill_ratio)]
        min_col_fill: Option<FillRatio>,

        /// Minimum fraction of non-missing cells to keep a row
        #[arg(long, value_parser = parse_fill_ratio)]
        min_row_fill: Option<FillRatio>,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Snapshot file (CSV, TSV, Excel)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Skip the SHA-256 fingerprint of the input file
    #[arg(long, default_value_t = false)]
    pub no_hash: bool,
}

fn parse_fill_ratio(raw: &str) -> std::result::Result<FillRatio, String> {
    let ratio: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    FillRatio::new(ratio).map_err(|e| e.to_string())
}

/// Execute a parsed command
pub fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Profile { source, out } => {
            let snapshot = load_snapshot(&source.input, !source.no_hash)?;
            let report = profile(&snapshot.dataset);
            info!(
                rows = report.row_count,
                columns = report.len(),
                over_half_missing = report.columns_above(0.5).len(),
                "profiled snapshot"
            );
            let document = ProfileDocument::new(&snapshot.source, &report);

            if let Some(out_path) = out {
                output::write_json_file(&document, &out_path)?;
                info!(path = %out_path.display(), "missingness report written");
            } else {
                output::write_json_stdout(&document)?;
            }
        }
        Commands::Prepare {
            source,
            out,
            config,
            min_col_fill,
            min_row_fill,
            summary,
        } => {
            let mut config = match config {
                Some(path) => PrepareConfig::load(&path)?,
                None => PrepareConfig::default(),
            };
            // Command-line ratios win over the config file
            if min_col_fill.is_some() {
                config.thresholds.min_col_fill_ratio = min_col_fill;
            }
            if min_row_fill.is_some() {
                config.thresholds.min_row_fill_ratio = min_row_fill;
            }
            let ratios = config.thresholds.resolve()?;

            let snapshot = load_snapshot(&source.input, !source.no_hash)?;
            let outcome = pipeline::run(snapshot.dataset, &config)?;

            output::write_csv_file(&outcome.dataset, &out)?;
            info!(
                path = %out.display(),
                rows = outcome.dataset.row_count(),
                columns = outcome.dataset.column_count(),
                "cleaned dataset written"
            );

            if let Some(summary_path) = summary {
                let document = PrepareDocument::new(&snapshot.source, ratios, &outcome);
                output::write_json_file(&document, &summary_path)?;
                info!(path = %summary_path.display(), "run summary written");
            }
        }
    }

    Ok(())
}
