//! runledger CLI - Main Entry Point
//!
//! Bridges a browser test runner's lifecycle events to the runledger report
//! pipeline, and reads finished reports back.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod bridge;
mod commands;
mod output;

use commands::{env, ingest, summary};

/// runledger - E2E test result reporting
#[derive(Parser)]
#[command(name = "runledger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Reporting configuration file
    #[arg(long, default_value = "runledger.toml", env = "RUNLEDGER_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume runner events and write the reports
    Ingest(ingest::IngestArgs),

    /// Summarise a written detailed report
    Summary(summary::SummaryArgs),

    /// Show the environment snapshot this machine would record
    Env(env::EnvArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Ingest(args) => ingest::execute(args, &cli.config, cli.format).await,
        Commands::Summary(args) => summary::execute(args, &cli.config, cli.format),
        Commands::Env(args) => env::execute(args, cli.format),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}
