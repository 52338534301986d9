//! Shareable watch links.

use gamehub_core::ids::GameId;

const WATCH_PREFIX: &str = "/watch/";

/// Builds the link a viewer opens to watch `game_id`:
/// `<origin>/watch/<gameId>`. Independent of any room connection.
#[must_use]
pub fn watch_link(origin: &str, game_id: &GameId) -> String {
    format!("{}{WATCH_PREFIX}{game_id}", origin.trim_end_matches('/'))
}

/// Resolves a watch route path back to the game it names.
#[must_use]
pub fn game_id_from_watch_path(path: &str) -> Option<GameId> {
    let id = path.strip_prefix(WATCH_PREFIX)?.trim_end_matches('/');
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(GameId::new(id))
}
