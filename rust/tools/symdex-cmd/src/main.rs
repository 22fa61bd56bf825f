use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "symdex-cmd")]
#[command(about = "Command-line utility for loading and querying symbol search indexes")]
#[command(version)]
struct Cli {
    /// Path to a JSON file with the index configuration
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load fragments and answer one or more queries
    Query {
        /// Fragment file or directory (can be specified multiple times, loaded in order)
        #[arg(short, long, required = true)]
        file: Vec<String>,

        /// Maximum number of results per query
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Query text(s)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Load fragments and display summary information
    Inspect {
        /// Increase verbosity (-v lists keys, -vv lists entries)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Fragment file or directory (can be specified multiple times, loaded in order)
        #[arg(short, long, required = true)]
        file: Vec<String>,
    },

    /// Load fragments and write the merged index as a single JSON fragment
    Convert {
        /// Fragment file or directory (can be specified multiple times, loaded in order)
        #[arg(short, long, required = true)]
        file: Vec<String>,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = utils::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Query {
            file,
            limit,
            json,
            text,
        } => commands::query::run(config, file, limit, json, text),
        Commands::Inspect { verbose, file } => commands::inspect::run(config, verbose, file),
        Commands::Convert { file, output } => commands::convert::run(config, file, output),
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
