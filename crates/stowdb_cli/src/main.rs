//! StowDB CLI
//!
//! Command-line tools for StowDB snapshots saved in a file store.
//!
//! # Commands
//!
//! - `inspect` - Display collections and record counts
//! - `query` - Filter and project the records of one collection
//! - `verify` - Check a snapshot's structural integrity

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// StowDB command-line snapshot tools.
#[derive(Parser)]
#[command(name = "stowdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the file store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Name the database was saved under
    #[arg(global = true, short, long, default_value = "app")]
    name: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display collections and record counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print records of one collection
    Query {
        /// Collection to read
        #[arg(short, long)]
        collection: String,

        /// Filter as JSON, e.g. '{"age": {"gte": 18}, "name": "Tom"}'
        #[arg(short = 'w', long = "where")]
        filter: Option<String>,

        /// Fields to keep (system fields are always kept)
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Verify snapshot integrity
    Verify,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &cli.name, &format)?;
        }
        Commands::Query {
            collection,
            filter,
            select,
            limit,
        } => {
            let path = cli.path.ok_or("Store path required for query")?;
            let request = commands::query::Request {
                collection,
                filter,
                select,
                limit,
            };
            commands::query::run(&path, &cli.name, &request)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path, &cli.name)?;
        }
        Commands::Version => {
            println!("StowDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("StowDB Core v{}", stowdb_core::VERSION);
        }
    }

    Ok(())
}
