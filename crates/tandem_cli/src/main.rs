//! Tandem CLI
//!
//! Command-line tools for inspecting deltas and exported document logs.
//!
//! # Commands
//!
//! - `diff` - Build the delta between two text files
//! - `apply` - Apply a delta to a text file
//! - `compose` - Compose two deltas into one
//! - `transform` - Transform two concurrent deltas
//! - `replay` - Print a document's content at a version
//! - `history` - List a document's log with change summaries
//! - `verify` - Check a document log for consistency

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tandem command-line tools.
#[derive(Parser)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to an exported document (JSON)
    #[arg(global = true, short, long)]
    document: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the delta turning one text file into another
    Diff {
        /// Original text
        old: PathBuf,
        /// Edited text
        new: PathBuf,
    },

    /// Apply a delta (JSON) to a text file
    Apply {
        /// Text to edit
        content: PathBuf,
        /// Delta to apply
        delta: PathBuf,
    },

    /// Compose two deltas (JSON) applied one after the other
    Compose {
        /// Delta applied first
        first: PathBuf,
        /// Delta applied second
        second: PathBuf,
    },

    /// Transform two deltas (JSON) made against the same text
    Transform {
        /// Delta sequenced first (wins insert ties)
        a: PathBuf,
        /// Delta sequenced second
        b: PathBuf,
    },

    /// Print the document content at a version
    Replay {
        /// Version to reconstruct (default: latest)
        #[arg(long)]
        version: Option<u64>,
    },

    /// List the document log
    History {
        /// Only entries after this version
        #[arg(short, long, default_value = "0")]
        since: u64,

        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify a document log
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
        Commands::Diff { old, new } => commands::diff::run(&old, &new)?,
        Commands::Apply { content, delta } => commands::apply::run(&content, &delta)?,
        Commands::Compose { first, second } => commands::compose::run(&first, &second)?,
        Commands::Transform { a, b } => commands::transform::run(&a, &b)?,
        Commands::Replay { version } => {
            let path = cli.document.ok_or("Document path required for replay")?;
            commands::replay::run(&path, version)?;
        }
        Commands::History {
            since,
            limit,
            format,
        } => {
            let path = cli.document.ok_or("Document path required for history")?;
            commands::history::run(&path, since, limit, &format)?;
        }
        Commands::Verify => {
            let path = cli.document.ok_or("Document path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Version => {
            println!("Tandem CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
