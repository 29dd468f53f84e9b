//! `cubx-dependency-resolver`: resolves webpackage artifact dependencies and prints
//! the requested view as JSON.

mod cli;
mod commands;
mod errors;
mod input;
mod logging;

use crate::cli::Cli;
use crate::logging::TracingConfig;
use clap::Parser;
use tracing::instrument;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    if let Err(error) = run_main().await {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> miette::Result<()> {
    // Usage errors exit with status 2 from here
    let cli = Cli::parse();

    logging::init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        ..Default::default()
    })?;

    run_cli(&cli).await
}

#[instrument(name = "cubx_cli", skip(cli))]
async fn run_cli(cli: &Cli) -> miette::Result<()> {
    let output = commands::execute(cli).await?;
    commands::print_json(&output)?;
    Ok(())
}
