//! Score submission client.

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::ids::GameId;
use gamehub_core::repository::ScoreSink;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::api::{ApiClient, check_status};

const PLAY_PATH: &str = "/api/v1/play/game";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayRequest<'a> {
    game_id: &'a str,
    score_value: u32,
}

/// Submits final scores on behalf of the signed-in player.
#[derive(Clone)]
pub struct HttpScoreSink {
    api: ApiClient,
    bearer_token: Option<String>,
}

impl HttpScoreSink {
    /// Creates a sink authenticating with `bearer_token`. Without a token
    /// every submission fails before reaching the network.
    #[must_use]
    pub fn new(api: ApiClient, bearer_token: Option<String>) -> Self {
        Self {
            api,
            bearer_token: bearer_token.filter(|t| !t.is_empty()),
        }
    }
}

impl std::fmt::Debug for HttpScoreSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpScoreSink")
            .field("api", &self.api)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl ScoreSink for HttpScoreSink {
    #[instrument(skip(self, game_id), fields(game_id = %game_id))]
    async fn submit_score(&self, game_id: &GameId, score: u32) -> Result<(), DomainError> {
        let Some(token) = self.bearer_token.as_deref() else {
            return Err(DomainError::ScoreSaveFailed(
                "no bearer token available".to_owned(),
            ));
        };

        let response = self
            .api
            .http()
            .post(self.api.url(PLAY_PATH))
            .bearer_auth(token)
            .json(&PlayRequest {
                game_id: game_id.as_str(),
                score_value: score,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "score submission failed");
                DomainError::ScoreSaveFailed("score service is unreachable".to_owned())
            })?;

        check_status(response, "score service")
            .await
            .map(|_| ())
            .map_err(DomainError::ScoreSaveFailed)
    }
}
