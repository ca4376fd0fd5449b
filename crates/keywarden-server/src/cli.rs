use clap::{Parser, Subcommand};

use crate::commands::{self, root_key::InitRootKeyParams, serve::ServeParams};

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "keywarden",
    version = CLI_VERSION,
    about = "Envelope-encryption key management service"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the key management server
    Serve(ServeParams),
    /// Provision a KMS-wrapped root key blob for `serve` with a KMS key
    #[command(name = "init-root-key")]
    InitRootKey(InitRootKeyParams),
}

pub async fn run_cli(cli: Cli) -> Result<(), anyhow::Error> {
    match cli.command {
        Commands::Serve(params) => commands::serve::cmd_serve(params).await,
        Commands::InitRootKey(params) => commands::root_key::cmd_init_root_key(params).await,
    }
}
