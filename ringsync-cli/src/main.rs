//! ringsync: keep tracked files identical across client root directories.
//!
//! # Usage
//!
//! ```text
//! ringsync run [--config <path>] [--log-format text|json]
//! ringsync reconcile [--config <path>] [--path <tracked>] [--dry-run]
//! ringsync status [--config <path>] [--json]
//! ringsync config [--config <path>] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, reconcile::ReconcileArgs, run::RunArgs, status::StatusArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "ringsync",
    version,
    about = "Mirror tracked files across client root directories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile, then watch and propagate changes in the foreground.
    Run(RunArgs),

    /// Bring every client copy up to the newest one and exit.
    Reconcile(ReconcileArgs),

    /// Report which tracked paths have drifted between clients.
    Status(StatusArgs),

    /// Validate the configuration and print the resolved clients and paths.
    Config(ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Reconcile(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Config(args) => args.run(),
    }
}
