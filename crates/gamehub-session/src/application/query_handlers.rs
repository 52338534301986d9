//! Query handlers for the Play Session context.
//!
//! Read-only projections fetched from external collaborators. Failures
//! degrade to empty views rather than erroring.

use gamehub_core::ids::GameId;
use gamehub_core::repository::LeaderboardSource;
use serde::Serialize;
use tracing::{instrument, warn};

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// 1-based position in server order.
    pub rank: usize,
    /// The player's display name.
    pub display_name: String,
    /// The player's total score.
    pub score: u64,
}

/// Read-only leaderboard of one game.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    /// The game the board belongs to.
    pub game_id: GameId,
    /// Rows in server order.
    pub entries: Vec<RankedEntry>,
}

impl LeaderboardView {
    /// Whether the board has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches the top scores of `game_id`.
///
/// A failed fetch is logged and yields an empty view.
#[instrument(skip(game_id, source), fields(game_id = %game_id))]
pub async fn get_leaderboard(game_id: &GameId, source: &dyn LeaderboardSource) -> LeaderboardView {
    let entries = match source.top_scores(game_id).await {
        Ok(entries) => entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| RankedEntry {
                rank: i + 1,
                display_name: entry.display_name,
                score: entry.score,
            })
            .collect(),
        Err(err) => {
            warn!(error = %err, "leaderboard unavailable, showing empty board");
            Vec::new()
        }
    };

    LeaderboardView {
        game_id: game_id.clone(),
        entries,
    }
}
