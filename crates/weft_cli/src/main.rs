//! Weft CLI
//!
//! Command-line tools for Weft store management.
//!
//! # Commands
//!
//! - `inspect` - Display store statistics and metadata
//! - `verify` - Verify journal integrity
//! - `compact` - Rewrite the journal as a single frame
//! - `dump-journal` - List journal frames for debugging
//! - `version-vector` - Print the store's version vectors or sync blob

mod commands;
mod error;

use clap::{Parser, Subcommand, ValueEnum};
use error::{CliError, CliResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Weft command-line store tools.
#[derive(Parser)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store statistics and metadata
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Verify journal integrity
    Verify,

    /// Rewrite the journal as a single frame
    Compact {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// List journal frames for debugging
    DumpJournal {
        /// Maximum number of frames to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the store's version vectors
    VersionVector {
        /// Print the encoded sync blob as hex instead
        #[arg(long)]
        blob: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let path = |command| cli.path.clone().ok_or(CliError::MissingPath(command));
    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&path("inspect")?, format),
        Commands::Verify => commands::verify::run(&path("verify")?),
        Commands::Compact { dry_run } => commands::compact::run(&path("compact")?, dry_run),
        Commands::DumpJournal { limit, format } => {
            commands::dump_journal::run(&path("dump-journal")?, limit, format)
        }
        Commands::VersionVector { blob, format } => {
            commands::version_vector::run(&path("version-vector")?, blob, format)
        }
        Commands::Version => {
            println!("Weft CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Snapshot format v{}", weft_core::SNAPSHOT_ENVELOPE.version());
            Ok(())
        }
    }
}
