//! Shared HTTP plumbing.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default timeout for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API base URL does not parse.
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// An HTTP client bound to the portal API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8080`).
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidBaseUrl` if `base_url` does not parse
    /// - `ClientError::Build` if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_owned(),
        })
    }

    /// Absolute URL of `path`, which must start with `/`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}

/// Passes a successful response through; otherwise describes the failure.
pub(crate) async fn check_status(response: Response, service: &str) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, service, "request rejected");
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("{service} refused the credentials ({status})")
        }
        s if s.is_server_error() => format!("{service} is unavailable ({status})"),
        _ => format!("{service} rejected the request ({status})"),
    })
}
