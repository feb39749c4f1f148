//! chunkfile CLI
//!
//! Command-line tools for chunk containers.
//!
//! # Commands
//!
//! - `info` - Print identifier, index, sizes and version of every chunk
//! - `merge` - Combine two containers with disjoint identifiers
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// chunkfile container tools.
#[derive(Parser)]
#[command(name = "chunkfile")]
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
    /// Print information about all chunks in a file
    Info {
        /// Container to inspect
        input: PathBuf,

        /// Output JSON instead of text
        #[arg(short, long)]
        json: bool,
    },

    /// Merge two chunk files
    Merge {
        /// First input container
        input1: PathBuf,

        /// Second input container
        input2: PathBuf,

        /// Output container (overwritten)
        output: PathBuf,

        /// Compress chunk data with zstd
        #[arg(short, long)]
        compress: bool,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
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

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Info { input, json } => {
            commands::info::run(&input, json)?;
        }
        Commands::Merge {
            input1,
            input2,
            output,
            compress,
        } => {
            commands::merge::run(&input1, &input2, &output, compress)?;
        }
        Commands::Version => {
            println!("chunkfile CLI v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Container format v{}",
                chunkfile_core::format::FORMAT_VERSION
            );
        }
    }

    Ok(())
}
