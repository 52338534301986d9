//! Broadcast room lifecycle.
//!
//! A [`BroadcastRoom`] owns at most one relay connection and the local media
//! tracks it publishes. Every exit path releases both: a successful
//! [`BroadcastRoom::stop`], a failed join (rolled back before the error is
//! returned), a relay-side disconnect, and dropping the room.

use std::collections::HashSet;
use std::sync::Arc;

use gamehub_core::error::DomainError;
use gamehub_core::ids::GameId;
use gamehub_core::token::{ParticipantRole, TokenIssuer, TokenRequest};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::domain::ports::{MediaDevices, MediaSinks, RoomConnection, RoomEvent, RoomTransport};
use crate::domain::sinks::{SinkLayout, SinkRouter};
use crate::domain::tracks::{LocalTrack, MediaKind, MediaStream, TrackKind};

/// Banner shown to a viewer whose join failed.
pub const VIEWER_CONNECT_FAILED: &str = "Failed to connect to stream";

/// Relay connection state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection held.
    #[default]
    Disconnected,
    /// A join is in progress.
    Connecting,
    /// Joined and, for a streamer, publishing.
    Connected,
    /// The last join failed or the relay dropped the room. Nothing is held;
    /// the next join clears it.
    Error,
}

/// Static room settings.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// WebSocket URL of the media relay.
    pub server_url: Url,
    /// Viewer page variant used to route subscribed video.
    pub layout: SinkLayout,
}

impl RoomConfig {
    /// Validates the relay URL.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RoomConnectionFailed` if `server_url` does not
    /// parse.
    pub fn new(server_url: &str, layout: SinkLayout) -> Result<Self, DomainError> {
        let server_url = Url::parse(server_url).map_err(|e| {
            DomainError::RoomConnectionFailed(format!("invalid relay url '{server_url}': {e}"))
        })?;
        Ok(Self { server_url, layout })
    }
}

/// Collaborators a room needs.
#[derive(Clone)]
pub struct BroadcastDeps {
    /// Issues streamer and viewer credentials.
    pub token_issuer: Arc<dyn TokenIssuer>,
    /// Screen, camera and microphone capture.
    pub devices: Arc<dyn MediaDevices>,
    /// The relay client.
    pub transport: Arc<dyn RoomTransport>,
    /// Viewer display elements.
    pub sinks: Arc<dyn MediaSinks>,
}

/// A broadcast of one game, as streamer or viewer.
pub struct BroadcastRoom {
    config: RoomConfig,
    deps: BroadcastDeps,
    router: SinkRouter,
    room_name: Option<GameId>,
    role: Option<ParticipantRole>,
    local_tracks: Vec<LocalTrack>,
    connection_state: ConnectionState,
    connection: Option<Arc<dyn RoomConnection>>,
    events: Option<UnboundedReceiver<RoomEvent>>,
    attached: HashSet<String>,
    last_error: Option<String>,
}

impl BroadcastRoom {
    /// Creates an idle room.
    #[must_use]
    pub fn new(config: RoomConfig, deps: BroadcastDeps) -> Self {
        let router = SinkRouter::for_layout(config.layout);
        Self {
            config,
            deps,
            router,
            room_name: None,
            role: None,
            local_tracks: Vec::new(),
            connection_state: ConnectionState::Disconnected,
            connection: None,
            events: None,
            attached: HashSet::new(),
            last_error: None,
        }
    }

    /// The joined room's name, while a join is active.
    #[must_use]
    pub fn room_name(&self) -> Option<&GameId> {
        self.room_name.as_ref()
    }

    /// The held role, while a join is active.
    #[must_use]
    pub fn role(&self) -> Option<ParticipantRole> {
        self.role
    }

    /// Current relay connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    /// Local tracks currently held.
    #[must_use]
    pub fn local_tracks(&self) -> &[LocalTrack] {
        &self.local_tracks
    }

    /// The banner text of the last failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a join is active or in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.role.is_some()
    }

    /// Starts broadcasting the game as streamer.
    ///
    /// The streamer token and both capture prompts are requested
    /// concurrently; tracks are then published one at a time in
    /// [`TrackKind::PUBLISH_ORDER`]. On failure everything acquired so far is
    /// released before the error is returned.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition` if the room is already active
    /// - `DomainError::MediaPermissionDenied` if a capture prompt is refused
    /// - `DomainError::NoVideoTrack` if the screen capture has no video
    /// - `DomainError::TokenIssueFailed` / `RoomConnectionFailed` from the
    ///   token service and relay
    #[instrument(skip(self, game_id), fields(game_id = %game_id, role = "streamer"))]
    pub async fn go_live(&mut self, game_id: &GameId) -> Result<(), DomainError> {
        self.begin(game_id, ParticipantRole::Streamer, "go live")?;

        match self.try_go_live(game_id).await {
            Ok(()) => {
                self.connection_state = ConnectionState::Connected;
                info!(tracks = self.local_tracks.len(), "broadcast live");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "go live failed, releasing acquired media");
                self.release().await;
                self.connection_state = ConnectionState::Error;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn try_go_live(&mut self, game_id: &GameId) -> Result<(), DomainError> {
        let deps = self.deps.clone();
        let request = TokenRequest::fresh(game_id, ParticipantRole::Streamer);

        let (token, screen, camera) = tokio::join!(
            deps.token_issuer.issue_token(&request),
            deps.devices.capture_screen(),
            deps.devices.capture_camera(),
        );

        // Take ownership of whatever was granted before looking at failures.
        let screen_videos = screen.map(|stream| self.adopt_screen(stream));
        let camera = camera.map(|stream| self.adopt_camera(stream));

        if screen_videos? == 0 {
            return Err(DomainError::NoVideoTrack);
        }
        camera?;
        let token = token?;

        let joined = deps
            .transport
            .connect(&self.config.server_url, &token)
            .await?;
        let connection = Arc::clone(&joined.connection);
        self.connection = Some(joined.connection);
        self.events = Some(joined.events);

        for kind in TrackKind::PUBLISH_ORDER {
            let tracks: Vec<_> = self
                .local_tracks
                .iter()
                .filter(|local| local.kind == kind)
                .map(|local| Arc::clone(&local.track))
                .collect();
            for track in tracks {
                connection.publish(track, kind.publication_name()).await?;
                debug!(kind = %kind, "track published");
            }
        }

        Ok(())
    }

    /// Keeps the screen's video tracks; any other track in the capture is
    /// stopped. Returns the number of video tracks kept.
    fn adopt_screen(&mut self, stream: MediaStream) -> usize {
        let mut kept = 0;
        for track in stream.into_tracks() {
            if track.media_kind() == MediaKind::Video {
                self.local_tracks.push(LocalTrack {
                    kind: TrackKind::Screen,
                    track,
                });
                kept += 1;
            } else {
                track.stop();
            }
        }
        kept
    }

    fn adopt_camera(&mut self, stream: MediaStream) {
        for track in stream.into_tracks() {
            let kind = match track.media_kind() {
                MediaKind::Video => TrackKind::Webcam,
                MediaKind::Audio => TrackKind::Audio,
            };
            self.local_tracks.push(LocalTrack { kind, track });
        }
    }

    /// Joins the game's room as a subscribe-only viewer.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition` if the room is already active
    /// - `DomainError::TokenIssueFailed` / `RoomConnectionFailed` if the join
    ///   fails; the banner then reads [`VIEWER_CONNECT_FAILED`]
    #[instrument(skip(self, game_id), fields(game_id = %game_id, role = "viewer"))]
    pub async fn watch(&mut self, game_id: &GameId) -> Result<(), DomainError> {
        self.begin(game_id, ParticipantRole::Viewer, "watch")?;

        let deps = self.deps.clone();
        let request = TokenRequest::fresh(game_id, ParticipantRole::Viewer);
        let joined = match deps.token_issuer.issue_token(&request).await {
            Ok(token) => deps.transport.connect(&self.config.server_url, &token).await,
            Err(err) => Err(err),
        };

        match joined {
            Ok(joined) => {
                self.connection = Some(joined.connection);
                self.events = Some(joined.events);
                self.connection_state = ConnectionState::Connected;
                info!("watching broadcast");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "viewer join failed");
                self.release().await;
                self.connection_state = ConnectionState::Error;
                self.last_error = Some(VIEWER_CONNECT_FAILED.to_owned());
                Err(err)
            }
        }
    }

    fn begin(
        &mut self,
        game_id: &GameId,
        role: ParticipantRole,
        operation: &'static str,
    ) -> Result<(), DomainError> {
        if let Some(current) = self.role {
            return Err(DomainError::InvalidTransition {
                from: format!("already joined as {current}"),
                operation,
            });
        }
        self.room_name = Some(game_id.clone());
        self.role = Some(role);
        self.connection_state = ConnectionState::Connecting;
        self.last_error = None;
        Ok(())
    }

    /// Applies one relay event.
    ///
    /// Subscribed remote video is attached to the sink its publication name
    /// routes to; a track already attached is left alone.
    pub fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::TrackSubscribed(track) => {
                if self.role != Some(ParticipantRole::Viewer) || track.kind != MediaKind::Video {
                    return;
                }
                if !self.attached.insert(track.sid.clone()) {
                    debug!(sid = %track.sid, "track already attached");
                    return;
                }
                let sink = self.router.route(&track.publication_name);
                info!(sid = %track.sid, name = %track.publication_name, sink = %sink, "attaching remote track");
                self.deps.sinks.attach(sink, &track);
            }
            RoomEvent::TrackUnsubscribed { sid } => {
                self.attached.remove(&sid);
            }
            RoomEvent::Disconnected => {
                if self.role.is_none() {
                    return;
                }
                warn!("relay closed the room connection");
                self.connection = None;
                self.release_now();
                self.connection_state = ConnectionState::Error;
                self.last_error = Some(DomainError::RoomDisconnected.to_string());
            }
        }
    }

    /// Applies every queued relay event without waiting. Returns the number
    /// of events applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(events) = self.events.as_mut() else {
                break;
            };
            match events.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.handle_event(RoomEvent::Disconnected);
                    self.events = None;
                    applied += 1;
                    break;
                }
            }
        }
        applied
    }

    /// Applies relay events as they arrive until the room is no longer
    /// connected.
    pub async fn run_until_disconnected(&mut self) {
        loop {
            let Some(events) = self.events.as_mut() else {
                return;
            };
            let event = events.recv().await.unwrap_or(RoomEvent::Disconnected);
            let closed = event == RoomEvent::Disconnected;
            self.handle_event(event);
            if closed {
                self.events = None;
                return;
            }
        }
    }

    /// Stops every local track and leaves the room.
    #[instrument(skip(self), fields(game_id = ?self.room_name))]
    pub async fn stop(&mut self) {
        if self.is_active() {
            info!("stopping broadcast");
        }
        self.release().await;
    }

    async fn release(&mut self) {
        let connection = self.connection.take();
        self.release_now();
        if let Some(connection) = connection {
            connection.disconnect().await;
        }
    }

    /// Releases everything that can be released synchronously. The
    /// connection must already have been taken.
    fn release_now(&mut self) {
        for local in self.local_tracks.drain(..) {
            local.track.stop();
        }
        self.events = None;
        self.attached.clear();
        self.room_name = None;
        self.role = None;
        self.connection_state = ConnectionState::Disconnected;
    }
}

impl Drop for BroadcastRoom {
    fn drop(&mut self) {
        let connection = self.connection.take();
        self.release_now();
        let Some(connection) = connection else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    connection.disconnect().await;
                });
            }
            Err(_) => warn!("room dropped outside a runtime, relay disconnect skipped"),
        }
    }
}

impl std::fmt::Debug for BroadcastRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastRoom")
            .field("room_name", &self.room_name)
            .field("role", &self.role)
            .field("connection_state", &self.connection_state)
            .field("local_tracks", &self.local_tracks.len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
