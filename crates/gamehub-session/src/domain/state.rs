//! Session lifecycle state.

use std::fmt;

use chrono::{DateTime, Utc};
use gamehub_core::ids::SessionId;
use serde::Serialize;

use super::game::PlayableGame;

/// Where a play session is in its lifecycle.
///
/// `Idle → Playing → ExitRequested → Saving → Terminated`, with
/// `ExitRequested → Playing` on cancel and `Terminated → Playing` on restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No game running.
    #[default]
    Idle,
    /// The game is embedded and the score is ticking.
    Playing,
    /// The exit prompt is showing; the score is frozen.
    ExitRequested,
    /// The final score is being submitted.
    Saving,
    /// The session has ended.
    Terminated,
}

impl SessionState {
    /// Whether a new session may begin from this state.
    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Terminated)
    }

    /// Stable lowercase name, used in logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::ExitRequested => "exit_requested",
            Self::Saving => "saving",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One player's run of one game.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Unique per start and restart.
    pub session_id: SessionId,
    /// The game being played.
    pub game: PlayableGame,
    /// Lifecycle state.
    pub state: SessionState,
    /// Last displayed score.
    pub score: u32,
    /// When play began.
    pub started_at: DateTime<Utc>,
}

impl GameSession {
    /// A freshly started session.
    #[must_use]
    pub fn begin(game: PlayableGame, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::generate(),
            game,
            state: SessionState::Playing,
            score: 0,
            started_at,
        }
    }
}
