//! Game references handed to a session start.

use gamehub_core::error::DomainError;
use gamehub_core::ids::GameId;
use serde::{Deserialize, Serialize};
use url::Url;

/// A catalog game as the portal passes it in, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRef {
    /// Catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL of the hosted, embeddable game.
    pub hosted_url: String,
}

impl GameRef {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, hosted_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hosted_url: hosted_url.into(),
        }
    }

    /// Checks the reference is playable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidGameData` if the id or name is blank, or
    /// if the hosted URL does not parse as an `http`/`https` URL.
    pub fn validate(&self) -> Result<PlayableGame, DomainError> {
        let id = GameId::new(self.id.as_str());
        if id.is_empty() {
            return Err(DomainError::InvalidGameData("game id is missing".into()));
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidGameData(format!(
                "game {id} has no display name"
            )));
        }

        let url = Url::parse(self.hosted_url.trim()).map_err(|e| {
            DomainError::InvalidGameData(format!("game {id} has a malformed url: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidGameData(format!(
                "game {id} url must be http or https, got {}",
                url.scheme()
            )));
        }

        Ok(PlayableGame {
            id,
            name: name.to_owned(),
            url,
        })
    }
}

/// A validated game, ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableGame {
    id: GameId,
    name: String,
    url: Url,
}

impl PlayableGame {
    /// The catalog identifier; also the broadcast room name.
    #[must_use]
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The embeddable URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}
