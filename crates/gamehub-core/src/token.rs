//! Room credential issuance abstraction.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::ids::GameId;

/// The two mutually exclusive participant roles in a broadcast room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Publishes screen, webcam and microphone tracks.
    Streamer,
    /// Subscribes to the streamer's tracks only.
    Viewer,
}

impl ParticipantRole {
    /// Whether the role is granted publish rights.
    #[must_use]
    pub fn can_publish(self) -> bool {
        matches!(self, Self::Streamer)
    }

    /// Lowercase wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Streamer => "streamer",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single token request. A new request, with a new
/// identity, is built for every join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Room to join; always the game identifier.
    pub room: GameId,
    /// Participant identity presented to the relay.
    pub identity: String,
    /// Requested role.
    pub role: ParticipantRole,
}

impl TokenRequest {
    /// Builds a request for `role` in the room of `game_id` with a fresh
    /// `user-<uuid>` identity.
    #[must_use]
    pub fn fresh(game_id: &GameId, role: ParticipantRole) -> Self {
        Self {
            room: game_id.clone(),
            identity: format!("user-{}", Uuid::new_v4()),
            role,
        }
    }
}

/// A signed room credential. The value is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct RoomToken(String);

impl RoomToken {
    /// Wraps a signed credential.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw credential for handing to the room transport.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomToken([REDACTED])")
    }
}

/// Issues room credentials.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Requests a credential for `request`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TokenIssueFailed` if the service is unreachable
    /// or responds without a token.
    async fn issue_token(&self, request: &TokenRequest) -> Result<RoomToken, DomainError>;
}
