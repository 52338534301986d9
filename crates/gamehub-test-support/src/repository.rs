//! Test score and leaderboard services.

use std::sync::Mutex;

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::ids::GameId;
use gamehub_core::repository::{LeaderboardEntry, LeaderboardSource, ScoreSink};

/// A score sink that records every submission and succeeds. Each call
/// yields once before recording, so concurrent callers interleave.
#[derive(Debug, Default)]
pub struct RecordingScoreSink {
    submitted: Mutex<Vec<(GameId, u32)>>,
}

impl RecordingScoreSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all submissions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn submissions(&self) -> Vec<(GameId, u32)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreSink for RecordingScoreSink {
    async fn submit_score(&self, game_id: &GameId, score: u32) -> Result<(), DomainError> {
        tokio::task::yield_now().await;
        self.submitted.lock().unwrap().push((game_id.clone(), score));
        Ok(())
    }
}

/// A score sink that counts calls and always fails.
#[derive(Debug, Default)]
pub struct FailingScoreSink {
    calls: Mutex<usize>,
}

impl FailingScoreSink {
    /// Creates the sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of submissions attempted.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ScoreSink for FailingScoreSink {
    async fn submit_score(&self, _game_id: &GameId, _score: u32) -> Result<(), DomainError> {
        *self.calls.lock().unwrap() += 1;
        Err(DomainError::ScoreSaveFailed("connection refused".into()))
    }
}

/// A leaderboard that returns the same entries for every game.
#[derive(Debug, Default)]
pub struct StaticLeaderboardSource(pub Vec<LeaderboardEntry>);

#[async_trait]
impl LeaderboardSource for StaticLeaderboardSource {
    async fn top_scores(&self, _game_id: &GameId) -> Result<Vec<LeaderboardEntry>, DomainError> {
        Ok(self.0.clone())
    }
}

/// A leaderboard that is always unavailable.
#[derive(Debug)]
pub struct FailingLeaderboardSource;

#[async_trait]
impl LeaderboardSource for FailingLeaderboardSource {
    async fn top_scores(&self, _game_id: &GameId) -> Result<Vec<LeaderboardEntry>, DomainError> {
        Err(DomainError::LeaderboardFetchFailed("service unavailable".into()))
    }
}
