//! Replog CLI
//!
//! Command-line tools for exercising a replication backlog.
//!
//! # Commands
//!
//! - `replay` - Feed a record stream through a backlog and inspect the result
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::replay::{Delimiter, ReplayOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replog command-line backlog tools.
#[derive(Parser)]
#[command(name = "replog")]
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
    /// Feed records through a backlog and report its state
    Replay {
        /// Input file of records ("-" for stdin)
        input: PathBuf,

        /// Backlog capacity in bytes
        #[arg(short, long, default_value_t = 1024 * 1024)]
        capacity: usize,

        /// Default block size in bytes
        #[arg(short, long, default_value_t = 16 * 1024)]
        block_size: usize,

        /// How the input is split into records
        #[arg(short, long, value_enum, default_value_t = Delimiter::Newline)]
        delimiter: Delimiter,

        /// Record size when no delimiter is used
        #[arg(long, default_value_t = 64)]
        chunk: usize,

        /// Read the backlog from this offset after replaying
        #[arg(long)]
        from: Option<u64>,

        /// Write the range read with --from to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
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

    match cli.command {
        Commands::Replay {
            input,
            capacity,
            block_size,
            delimiter,
            chunk,
            from,
            output,
            format,
        } => {
            let options = ReplayOptions {
                input,
                capacity,
                block_size,
                delimiter,
                chunk,
                from,
                output,
            };
            commands::replay::run(&options, &format)?;
        }
        Commands::Version => {
            println!("Replog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Replog Core v{}", replog_core::VERSION);
        }
    }

    Ok(())
}
