//! GameHub headless runner entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Command};
use config::Config;
use error::CliError;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Play(args) => commands::play(&config, args).await,
        Command::Leaderboard { game_id } => commands::leaderboard(&config, &game_id).await,
        Command::WatchLink { game_id } => {
            commands::print_watch_link(&config, &game_id);
            Ok(())
        }
        Command::Token { game_id, role } => {
            let rendered = commands::issue_token(&config, &game_id, role.into()).await?;
            println!("{rendered}");
            Ok(())
        }
    }
}
