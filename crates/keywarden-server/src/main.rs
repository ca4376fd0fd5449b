mod cli;
mod commands;

use clap::Parser;

use crate::cli::{Cli, run_cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keywarden::logging::configure_logging()?;

    let cli = Cli::parse();
    run_cli(cli).await
}
