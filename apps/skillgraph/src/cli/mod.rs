//! # Skill Graph CLI Module
//!
//! This module implements the CLI interface for skillgraph.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP validation service
//! - `build` - Build a skill graph from a directory of markdown files
//! - `validate` - Score a skill graph JSON document
//! - `rubric` - Show the scoring rubric

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use skillgraph_core::SkillGraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// skillgraph - Markdown skill graphs
///
/// Turns interlinked markdown documents into a typed knowledge graph and
/// scores its structural quality.
#[derive(Parser, Debug)]
#[command(name = "skillgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build a skill graph from a directory of markdown files
    Build {
        /// Directory to scan for .md files
        dir: PathBuf,

        /// Write the graph JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a skill graph JSON document
    Validate {
        /// Graph file, either `{ "graph": ... }` or the graph itself
        file: PathBuf,
    },

    /// Show the scoring rubric
    Rubric,
}

impl Cli {
    /// Whether this invocation starts the long-running server.
    pub fn is_server(&self) -> bool {
        matches!(self.command, Some(Commands::Server { .. }))
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SkillGraphError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port, config }) => {
            cmd_server(host, port, config.as_deref()).await
        }
        Some(Commands::Build { dir, output }) => cmd_build(&dir, output.as_deref(), json_mode),
        Some(Commands::Validate { file }) => cmd_validate(&file, json_mode),
        Some(Commands::Rubric) => cmd_rubric(json_mode),
        None => Cli::command()
            .print_help()
            .map_err(|e| SkillGraphError::IoError(format!("Print help: {}", e))),
    }
}
