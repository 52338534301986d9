//! Command-line surface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use gamehub_core::token::ParticipantRole;

#[derive(Parser, Debug)]
#[command(name = "gamehub")]
#[command(about = "Headless GameHub play session runner", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game until interrupted, then save the score
    Play(PlayArgs),

    /// Print a game's leaderboard as JSON
    Leaderboard {
        /// Catalog game id
        #[arg(long)]
        game_id: String,
    },

    /// Print the shareable watch link of a game
    WatchLink {
        /// Catalog game id
        #[arg(long)]
        game_id: String,
    },

    /// Issue a room credential for an external relay client
    Token {
        /// Catalog game id; also the room name
        #[arg(long)]
        game_id: String,

        /// Role to join as
        #[arg(long, value_enum, default_value_t = RoleArg::Viewer)]
        role: RoleArg,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Streamer,
    Viewer,
}

impl From<RoleArg> for ParticipantRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Streamer => Self::Streamer,
            RoleArg::Viewer => Self::Viewer,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Catalog game id
    #[arg(long)]
    pub game_id: String,

    /// Display name of the game
    #[arg(long)]
    pub name: String,

    /// Hosted game URL
    #[arg(long)]
    pub url: String,

    /// Leave automatically after this many seconds
    #[arg(long, env = "GAMEHUB_PLAY_SECS")]
    pub duration_secs: Option<u64>,
}
