//! joinscope CLI - device join-state reconciliation
//!
//! Pulls device inventories from the on-premises directory, the cloud
//! identity service and the device-management service, then lets operators:
//! - Refresh and cache a reconciled snapshot
//! - Query devices by category or ad-hoc filters
//! - Look up a single device across all three sources
//! - Export every collection as CSV
//! - Diagnose source configuration and connectivity

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cache;
mod commands;
mod config;
mod error;
mod export;
mod output;
mod sources;

use commands::Context;
use error::CliResult;

/// joinscope - Reconcile directory, identity and device-management inventories
#[derive(Parser)]
#[command(name = "joinscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "JOINSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all three inventories and rebuild the snapshot
    Refresh(commands::refresh::RefreshArgs),

    /// Show the cached snapshot's version, age and statistics
    Status(commands::status::StatusArgs),

    /// List devices by category or filter
    Query(commands::query::QueryArgs),

    /// Report where a single device name is present
    Lookup(commands::lookup::LookupArgs),

    /// Export every collection of the snapshot as CSV
    Export(commands::export::ExportArgs),

    /// Diagnose configuration and source connectivity
    Doctor(commands::doctor::DoctorArgs),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let ctx = Context::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Refresh(args) => commands::refresh::execute(args, ctx).await,
        Commands::Status(args) => commands::status::execute(args, ctx).await,
        Commands::Query(args) => commands::query::execute(args, ctx).await,
        Commands::Lookup(args) => commands::lookup::execute(args, ctx).await,
        Commands::Export(args) => commands::export::execute(args, ctx).await,
        Commands::Doctor(args) => commands::doctor::execute(args, ctx).await,
    }
}
