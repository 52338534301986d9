//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// The `Display` output of every variant is a human-readable sentence; the
/// session and room keep it as their banner text once an operation settles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The game reference handed to a session start is unusable.
    #[error("invalid game data: {0}")]
    InvalidGameData(String),

    /// The user (or platform) refused a screen, camera or microphone prompt.
    #[error("media permission denied: {0}")]
    MediaPermissionDenied(String),

    /// The screen capture produced no video track.
    #[error("no video track available in the captured stream")]
    NoVideoTrack,

    /// The media relay could not be reached or rejected the join.
    #[error("room connection failed: {0}")]
    RoomConnectionFailed(String),

    /// The media relay dropped an established connection.
    #[error("room disconnected")]
    RoomDisconnected,

    /// The token service did not return a usable room credential.
    #[error("token issue failed: {0}")]
    TokenIssueFailed(String),

    /// The score service rejected or never received a score.
    #[error("score save failed: {0}")]
    ScoreSaveFailed(String),

    /// The leaderboard could not be loaded.
    #[error("leaderboard fetch failed: {0}")]
    LeaderboardFetchFailed(String),

    /// An operation was invoked from a state that does not permit it.
    #[error("cannot {operation} while {from}")]
    InvalidTransition {
        /// The state the caller was in.
        from: String,
        /// The rejected operation.
        operation: &'static str,
    },
}

impl DomainError {
    /// Whether retrying the same operation may succeed once the user acts
    /// (grants a permission, regains connectivity).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MediaPermissionDenied(_)
                | Self::NoVideoTrack
                | Self::RoomConnectionFailed(_)
                | Self::RoomDisconnected
                | Self::TokenIssueFailed(_)
        )
    }
}
