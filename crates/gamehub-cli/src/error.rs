//! GameHub runner error types.

use gamehub_client::ClientError;
use gamehub_core::error::DomainError;
use thiserror::Error;

use crate::config::ConfigError;

/// Startup and runtime errors for the runner.
#[derive(Debug, Error)]
pub enum CliError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be set up.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// A session operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Output could not be rendered.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Signal handling or I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
