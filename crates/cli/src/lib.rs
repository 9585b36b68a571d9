//! Carto CLI library — exposed for integration tests.

pub mod commands;
pub mod logging;
pub mod mcp;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "carto")]
#[command(about = "Build a code knowledge graph from a multi-language source tree", long_about = None)]
#[command(version = carto_core::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a directory into the graph store
    Analyze {
        /// Directory to analyze
        directory: PathBuf,

        /// Comma-separated extensions to analyze (overrides defaults)
        #[arg(short = 'e', long)]
        extensions: Option<String>,

        /// Additional ignore globs, appended to the built-in list
        #[arg(short = 'i', long)]
        ignore: Vec<String>,

        /// Re-apply store schema before writing
        #[arg(long)]
        update_schema: bool,

        /// Delete all nodes and relationships before writing
        #[arg(long)]
        reset_db: bool,

        /// Path of the embedded graph store (defaults to in-memory)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Upsert batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Serve the run_analyzer tool over MCP on stdio
    Mcp,
}

/// Entry point shared by the binary and tests. Returns the process exit
/// code.
pub fn run(cli: Cli) -> i32 {
    match cli.command {
        Commands::Analyze {
            directory,
            extensions,
            ignore,
            update_schema,
            reset_db,
            db_path,
            batch_size,
        } => commands::analyze::run(
            &directory,
            extensions.as_deref(),
            ignore,
            update_schema,
            reset_db,
            db_path,
            batch_size,
        ),
        Commands::Mcp => match mcp::run_server() {
            Ok(()) => 0,
            Err(err) => {
                tracing::error!(error = %err, "MCP server failed");
                1
            }
        },
    }
}
