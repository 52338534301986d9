//! Boundaries to the platform media stack and the media relay SDK.

use std::sync::Arc;

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::token::RoomToken;
use tokio::sync::mpsc;
use url::Url;

use super::sinks::SinkId;
use super::tracks::{MediaStream, MediaTrack, RemoteTrack};

/// Platform capture devices. Each call is an independent permission prompt.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Prompts for a screen capture.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MediaPermissionDenied` if the prompt is refused.
    async fn capture_screen(&self) -> Result<MediaStream, DomainError>;

    /// Prompts for webcam video plus microphone audio.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MediaPermissionDenied` if the prompt is refused.
    async fn capture_camera(&self) -> Result<MediaStream, DomainError>;
}

/// Notifications delivered by the relay for a joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A remote track became available to this participant.
    TrackSubscribed(RemoteTrack),
    /// A remote track went away.
    TrackUnsubscribed {
        /// Relay-assigned track identifier.
        sid: String,
    },
    /// The relay closed the connection.
    Disconnected,
}

/// An open connection to a relay room.
#[async_trait]
pub trait RoomConnection: Send + Sync {
    /// Publishes a local track under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RoomConnectionFailed` if the relay rejects the
    /// publication.
    async fn publish(&self, track: Arc<dyn MediaTrack>, name: &str) -> Result<(), DomainError>;

    /// Leaves the room. Idempotent.
    async fn disconnect(&self);
}

/// A successful join: the connection and its event feed.
pub struct ConnectedRoom {
    /// The joined room.
    pub connection: Arc<dyn RoomConnection>,
    /// Room events, in delivery order. Closes when the relay goes away.
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
}

/// The relay client.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Joins the room encoded in `token` on the relay at `server_url`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RoomConnectionFailed` if the join fails.
    async fn connect(&self, server_url: &Url, token: &RoomToken)
    -> Result<ConnectedRoom, DomainError>;
}

/// Display elements the viewer renders remote video into. The broadcast
/// room is the only writer.
pub trait MediaSinks: Send + Sync {
    /// Attaches `track` to the element named `sink`.
    fn attach(&self, sink: &SinkId, track: &RemoteTrack);
}
