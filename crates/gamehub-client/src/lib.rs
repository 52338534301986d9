//! HTTP implementations of the GameHub collaborator ports.
//!
//! Each client wraps a shared [`ApiClient`] and maps transport and status
//! failures onto the matching `DomainError` variant.

mod api;
pub mod leaderboard;
pub mod score;
pub mod token;

pub use api::{ApiClient, ClientError, DEFAULT_REQUEST_TIMEOUT};
pub use leaderboard::HttpLeaderboardClient;
pub use score::HttpScoreSink;
pub use token::HttpTokenIssuer;
