//! # apx CLI entry point
//!
//! Parses command-line arguments, builds the portal client, and dispatches
//! to subcommand handlers on a single-threaded Tokio runtime.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apx_cli::diff::{run_diff, DiffArgs};
use apx_cli::listing::{run_gateways, run_history, run_records, GatewaysArgs, HistoryArgs, RecordsArgs};
use apx_cli::publish::{run_publish, run_unpublish, PublishArgs, UnpublishArgs};
use apx_cli::Context;

/// APX publish CLI
///
/// Publish API Definitions to gateways, inspect publish records and
/// history, and compare configuration snapshots.
#[derive(Parser, Debug)]
#[command(name = "apx", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Portal backend base URL. Overrides APX_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print JSON instead of text tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List gateways available as publish targets.
    Gateways(GatewaysArgs),

    /// Show the publish records of an API Definition.
    Records(RecordsArgs),

    /// Page through the publish history of an API Definition.
    History(HistoryArgs),

    /// Publish an API Definition to a gateway.
    Publish(PublishArgs),

    /// Unpublish an ACTIVE publish record.
    Unpublish(UnpublishArgs),

    /// Diff a history entry against the latest active configuration.
    Diff(DiffArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(dispatch(&cli)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    let ctx = Context::from_env(cli.base_url.as_deref(), cli.json)?;
    tracing::debug!(command = ?cli.command, "dispatching");
    match &cli.command {
        Commands::Gateways(args) => run_gateways(args, &ctx).await,
        Commands::Records(args) => run_records(args, &ctx).await,
        Commands::History(args) => run_history(args, &ctx).await,
        Commands::Publish(args) => run_publish(args, &ctx).await,
        Commands::Unpublish(args) => run_unpublish(args, &ctx).await,
        Commands::Diff(args) => run_diff(args, &ctx).await,
    }
}
