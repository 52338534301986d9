//! Score and leaderboard service abstractions.
//!
//! Persistence of scores lives in an external score service; the session
//! only submits final scores and reads the per-game top list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::GameId;

/// One row of a game's leaderboard, in the order the service returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player display name.
    pub display_name: String,
    /// Accumulated score for the game.
    pub score: u64,
}

/// Sink for final session scores.
#[async_trait]
pub trait ScoreSink: Send + Sync {
    /// Records `score` for the authenticated player on `game_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ScoreSaveFailed` if the service rejects the
    /// submission or cannot be reached.
    async fn submit_score(&self, game_id: &GameId, score: u32) -> Result<(), DomainError>;
}

/// Read-only source of per-game leaderboards.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    /// Returns the top entries for `game_id`, best first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::LeaderboardFetchFailed` on any transport or
    /// decoding failure.
    async fn top_scores(&self, game_id: &GameId) -> Result<Vec<LeaderboardEntry>, DomainError>;
}
