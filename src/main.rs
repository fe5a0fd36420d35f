//! Crossline - Unified CLI

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use crossline::transport::{HttpSessionService, SessionService};
use crossline::{ClientConfig, tui};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,crossline=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play => {
            init_file_logging()?;
            tui::run_tui(load_config(&cli)?).await
        }
        Command::Stats => {
            init_stderr_logging();
            print_stats(load_config(&cli)?).await
        }
        Command::OfflineStats { player_id } => {
            init_stderr_logging();
            print_offline_stats(load_config(&cli)?, player_id).await
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Logs go to a file so they do not corrupt the terminal UI.
fn init_file_logging() -> Result<()> {
    let log_file = std::fs::File::create("crossline.log")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config file, then environment, then flags.
#[instrument(skip(cli), fields(path = %cli.config.display()))]
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(Some(cli.config.as_path()))?;
    if let Some(url) = &cli.server_url {
        config = config.with_server_url(url.clone());
    }
    if let Some(url) = &cli.ws_url {
        config = config.with_ws_url(url.clone());
    }
    info!(server_url = %config.server_url(), ws_url = %config.ws_url(), "Configuration resolved");
    Ok(config)
}

async fn print_stats(config: ClientConfig) -> Result<()> {
    let service = HttpSessionService::from_config(&config);
    let stats = service.fetch_stats().await?;
    println!("Online players: {}", stats.online);
    println!("Active games:   {}", stats.games);
    if let Some(total) = stats.total_games {
        println!("Total games:    {}", total);
    }
    Ok(())
}

async fn print_offline_stats(config: ClientConfig, player_id: u64) -> Result<()> {
    let service = HttpSessionService::from_config(&config);
    let stats = service.fetch_offline_stats(player_id).await?;
    println!(
        "Player {}: {} wins, {} losses, {} draws",
        player_id, stats.wins, stats.losses, stats.draws
    );
    Ok(())
}
