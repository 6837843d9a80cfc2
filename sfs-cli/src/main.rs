//! sfs CLI - Command-line interface
//!
//! Exercises the sfs library from the shell: coalesced existence checks,
//! hot-path budget inspection and cache warming.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::budget::BudgetArgs;
use crate::commands::exists::ExistsArgs;
use crate::commands::warm::WarmArgs;
use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Parser)]
#[command(name = "sfs")]
#[command(version = sfs::VERSION)]
#[command(about = "Hot-path caching and request coalescing for file serving", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.sfs/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether paths exist, coalescing identical concurrent checks
    Exists(ExistsArgs),
    /// Show the hot-path cache budget derived from free memory
    Budget(BudgetArgs),
    /// Load files, serve them and fill the hot-path cache
    Warm(WarmArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Exists(args) => {
            runner.log_startup("exists");
            commands::exists::run(args).await
        }
        Commands::Budget(args) => {
            runner.log_startup("budget");
            commands::budget::run(args, runner.config());
            Ok(())
        }
        Commands::Warm(args) => {
            runner.log_startup("warm");
            commands::warm::run(args, runner.create_factory()).await
        }
    }
}
