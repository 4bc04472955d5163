//! Command-line interface for checkers_client.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Checkers client - play a server-hosted game from the terminal
#[derive(Parser, Debug)]
#[command(name = "checkers_client")]
#[command(about = "Real-time checkers client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "checkers_client.toml", global = true)]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a game and play it from stdin
    Play {
        /// Game to open
        #[arg(long)]
        game_id: u64,

        /// Access token to store before connecting
        #[arg(long, requires = "refresh_token")]
        token: Option<String>,

        /// Refresh token to store before connecting
        #[arg(long, requires = "token")]
        refresh_token: Option<String>,

        /// Username the tokens belong to
        #[arg(long, requires = "token")]
        username: Option<String>,
    },

    /// Delete stored credentials
    Logout,
}
