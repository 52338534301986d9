//! Room token service client.

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::token::{ParticipantRole, RoomToken, TokenIssuer, TokenRequest};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::api::{ApiClient, check_status};

const TOKEN_PATH: &str = "/api/livekit/token";

/// Token request body. Carries both the room and game naming so either
/// token endpoint accepts it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequestBody<'a> {
    room_name: &'a str,
    game_id: &'a str,
    identity: &'a str,
    can_publish: bool,
    role: ParticipantRole,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Requests a fresh room credential for every join.
#[derive(Debug, Clone)]
pub struct HttpTokenIssuer {
    api: ApiClient,
}

impl HttpTokenIssuer {
    /// Creates an issuer on `api`.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TokenIssuer for HttpTokenIssuer {
    #[instrument(skip(self, request), fields(game_id = %request.room, role = %request.role))]
    async fn issue_token(&self, request: &TokenRequest) -> Result<RoomToken, DomainError> {
        let body = TokenRequestBody {
            room_name: request.room.as_str(),
            game_id: request.room.as_str(),
            identity: &request.identity,
            can_publish: request.role.can_publish(),
            role: request.role,
        };

        let response = self
            .api
            .http()
            .post(self.api.url(TOKEN_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "token request failed");
                DomainError::TokenIssueFailed("token service is unreachable".to_owned())
            })?;

        let response = check_status(response, "token service")
            .await
            .map_err(DomainError::TokenIssueFailed)?;

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            DomainError::TokenIssueFailed(format!("malformed token response: {e}"))
        })?;
        if parsed.token.is_empty() {
            return Err(DomainError::TokenIssueFailed(
                "token service returned an empty token".to_owned(),
            ));
        }
        Ok(RoomToken::new(parsed.token))
    }
}

#[cfg(test)]
mod tests {
    use gamehub_core::ids::GameId;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::DEFAULT_REQUEST_TIMEOUT;

    fn issuer(server: &MockServer) -> HttpTokenIssuer {
        HttpTokenIssuer::new(ApiClient::new(&server.uri(), DEFAULT_REQUEST_TIMEOUT).unwrap())
    }

    #[tokio::test]
    async fn test_issue_token_for_streamer_requests_publish_rights() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_partial_json(serde_json::json!({
                "roomName": "g1",
                "gameId": "g1",
                "canPublish": true,
                "role": "streamer"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "jwt-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let request = TokenRequest::fresh(&GameId::new("g1"), ParticipantRole::Streamer);

        // Act
        let token = issuer(&server).issue_token(&request).await.unwrap();

        // Assert
        assert_eq!(token.expose(), "jwt-1");
    }

    #[tokio::test]
    async fn test_issue_token_for_viewer_is_subscribe_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_partial_json(serde_json::json!({
                "canPublish": false,
                "role": "viewer"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "jwt-2" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let request = TokenRequest::fresh(&GameId::new("g1"), ParticipantRole::Viewer);

        let token = issuer(&server).issue_token(&request).await.unwrap();

        assert_eq!(token.expose(), "jwt-2");
    }

    #[tokio::test]
    async fn test_issue_token_maps_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let request = TokenRequest::fresh(&GameId::new("g1"), ParticipantRole::Viewer);

        let result = issuer(&server).issue_token(&request).await;

        match result {
            Err(DomainError::TokenIssueFailed(msg)) => assert!(msg.contains("unavailable")),
            other => panic!("expected TokenIssueFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_issue_token_rejects_empty_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "" })),
            )
            .mount(&server)
            .await;
        let request = TokenRequest::fresh(&GameId::new("g1"), ParticipantRole::Streamer);

        let result = issuer(&server).issue_token(&request).await;

        assert!(matches!(result, Err(DomainError::TokenIssueFailed(_))));
    }
}
