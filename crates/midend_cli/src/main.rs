//! Midend CLI
//!
//! Command-line tools for inspecting midend record logs.
//!
//! # Commands
//!
//! - `replay` - Reduce a JSON-lines record log into cache state
//! - `classify` - Show the lifecycle phase of type strings

mod commands;

use clap::{Parser, Subcommand};
use commands::replay::MergeMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Midend command-line tools.
#[derive(Parser)]
#[command(name = "midend")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a JSON-lines record log and print the final cache state
    Replay {
        /// Record log, one JSON record per line
        file: PathBuf,

        /// Entity type to collect (repeatable)
        #[arg(short, long = "entity")]
        entities: Vec<String>,

        /// Merge policy for stored entities
        #[arg(short, long, value_enum, default_value = "top")]
        merge: MergeMode,

        /// Print only the indexes
        #[arg(long)]
        indexes_only: bool,
    },

    /// Classify type strings by lifecycle phase
    Classify {
        /// Type strings to classify
        #[arg(required = true)]
        types: Vec<String>,

        /// Also report whether each type lies under this base
        #[arg(short, long)]
        base: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            file,
            entities,
            merge,
            indexes_only,
        } => {
            commands::replay::run(&file, entities, merge, indexes_only)?;
        }
        Commands::Classify { types, base } => {
            commands::classify::run(&types, base.as_deref())?;
        }
        Commands::Version => {
            println!("midend CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
