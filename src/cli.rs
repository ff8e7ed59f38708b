//! Command-line interface for tictactoe_api.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe API - hosted games against a random opponent
#[derive(Parser, Debug)]
#[command(name = "tictactoe_api")]
#[command(about = "Tic-tac-toe game service with scores and rankings", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game service (applies migrations first)
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Send reminder mail for every unfinished game once
    Remind,

    /// Recount active games into the cache once
    RefreshActive,
}
