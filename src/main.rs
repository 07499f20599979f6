mod clean;
mod cli;
mod config;
mod error;
mod filter;
mod inference;
mod output;
mod pipeline;
mod profile;
mod readers;
mod source;
mod types;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use types::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    cli::run(cli.command)
}

/// Log to stderr so stdout stays free for JSON reports.
/// `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parcel_prep={}", default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
