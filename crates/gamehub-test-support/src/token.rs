//! Test token issuers.

use std::sync::Mutex;

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::token::{RoomToken, TokenIssuer, TokenRequest};

/// A token issuer that records every request and returns `token-<n>`.
#[derive(Debug, Default)]
pub struct RecordingTokenIssuer {
    requests: Mutex<Vec<TokenRequest>>,
}

impl RecordingTokenIssuer {
    /// Creates the issuer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all requests received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenIssuer for RecordingTokenIssuer {
    async fn issue_token(&self, request: &TokenRequest) -> Result<RoomToken, DomainError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(RoomToken::new(format!("token-{}", requests.len())))
    }
}

/// A token issuer that is always unreachable.
#[derive(Debug)]
pub struct FailingTokenIssuer;

#[async_trait]
impl TokenIssuer for FailingTokenIssuer {
    async fn issue_token(&self, _request: &TokenRequest) -> Result<RoomToken, DomainError> {
        Err(DomainError::TokenIssueFailed("connection refused".into()))
    }
}
