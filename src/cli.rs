//! Command-line interface for crossline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Crossline - tic-tac-toe against remote players or a local bot
#[derive(Parser, Debug)]
#[command(name = "crossline")]
#[command(about = "Tic-tac-toe client for a Crossline game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "crossline.toml")]
    pub config: PathBuf,

    /// Game server URL (HTTP), overrides config and environment
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Game server WebSocket URL, overrides config and environment
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal UI
    Play,

    /// Print one sample of the server counters
    Stats,

    /// Print a player's record against the bot
    OfflineStats {
        /// Player id issued by the server
        #[arg(long)]
        player_id: u64,
    },
}
