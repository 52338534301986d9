//! Leaderboard read client.

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::ids::GameId;
use gamehub_core::repository::{LeaderboardEntry, LeaderboardSource};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, check_status};

const TOP_PATH: &str = "/api/v1/leaderboard/top";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardRow {
    user: LeaderboardUser,
    #[serde(default)]
    total_score: f64,
}

#[derive(Debug, Deserialize)]
struct LeaderboardUser {
    #[serde(default)]
    name: String,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(row: LeaderboardRow) -> Self {
        let score = if row.total_score.is_finite() && row.total_score > 0.0 {
            row.total_score.round() as u64
        } else {
            0
        };
        Self {
            display_name: row.user.name,
            score,
        }
    }
}

/// Fetches top scores per game. One request per call; nothing is cached.
#[derive(Debug, Clone)]
pub struct HttpLeaderboardClient {
    api: ApiClient,
}

impl HttpLeaderboardClient {
    /// Creates a client on `api`.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl LeaderboardSource for HttpLeaderboardClient {
    #[instrument(skip(self, game_id), fields(game_id = %game_id))]
    async fn top_scores(&self, game_id: &GameId) -> Result<Vec<LeaderboardEntry>, DomainError> {
        let response = self
            .api
            .http()
            .get(self.api.url(TOP_PATH))
            .query(&[("gameId", game_id.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "leaderboard request failed");
                DomainError::LeaderboardFetchFailed("leaderboard service is unreachable".to_owned())
            })?;

        let response = check_status(response, "leaderboard service")
            .await
            .map_err(DomainError::LeaderboardFetchFailed)?;

        let rows: Vec<LeaderboardRow> = response.json().await.map_err(|e| {
            DomainError::LeaderboardFetchFailed(format!("malformed leaderboard response: {e}"))
        })?;
        debug!(rows = rows.len(), "leaderboard loaded");
        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }
}
