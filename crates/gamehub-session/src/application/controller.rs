//! Play session controller.
//!
//! [`SessionController`] owns one [`GameSession`] and drives it through
//! `Idle → Playing → ExitRequested → Saving → Terminated`. It keeps the score
//! ticking while playing, persists the final score on confirmed exit, and
//! owns the session's single broadcast room.
//!
//! All methods take `&self`. Synchronous state sits behind a
//! `parking_lot::Mutex` that is never held across an `.await`; the room
//! lives behind an async mutex because its operations suspend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use gamehub_broadcast::application::room::{
    BroadcastDeps, BroadcastRoom, ConnectionState, RoomConfig,
};
use gamehub_core::clock::Clock;
use gamehub_core::error::DomainError;
use gamehub_core::ids::{GameId, SessionId};
use gamehub_core::repository::ScoreSink;
use gamehub_core::scheduler::{TickHandle, TickScheduler};
use gamehub_core::token::ParticipantRole;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::game::{GameRef, PlayableGame};
use crate::domain::navigation::{BackNavigation, NavigationGuard, UnloadEvent};
use crate::domain::score::ScoreEngine;
use crate::domain::state::{GameSession, SessionState};

/// The confirmation shown when leaving with a positive score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPrompt {
    /// The score that would be saved.
    pub score: u32,
    /// Text for the confirmation surface.
    pub message: String,
}

impl ExitPrompt {
    fn for_score(score: u32) -> Self {
        Self {
            score,
            message: format!("Your current score is {score}. Are you sure you want to quit?"),
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    /// The game that was played.
    pub game_id: GameId,
    /// Score at the moment of exit.
    pub final_score: u32,
    /// Whether the score sink accepted the score.
    pub saved: bool,
}

/// Result of [`SessionController::request_exit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitDecision {
    /// Nothing to save; the session has ended.
    Exited(ExitReport),
    /// The player must confirm or cancel.
    ConfirmationRequired(ExitPrompt),
}

/// Result of [`SessionController::confirm_exit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The save ran and the session has ended.
    Completed(ExitReport),
    /// Another confirmation is already saving; nothing was done.
    AlreadySaving,
}

/// Snapshot of the session's broadcast room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastStatus {
    /// Streamer or viewer.
    pub role: ParticipantRole,
    /// Relay connection state.
    pub connection_state: ConnectionState,
    /// Local tracks held.
    pub local_tracks: usize,
}

#[derive(Debug, Default)]
struct SessionInner {
    session: Option<GameSession>,
    engine: ScoreEngine,
    ticker: Option<TickHandle>,
    banner: Option<String>,
    /// Bumped whenever the session ends, so a room join that outlives its
    /// session can tell.
    generation: u64,
}

impl SessionInner {
    fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, |session| session.state)
    }

    fn score(&self) -> u32 {
        self.session.as_ref().map_or(0, |session| session.score)
    }

    fn on_frame(&mut self, clock: &dyn Clock) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != SessionState::Playing {
            return;
        }
        if let Some(score) = self.engine.sample(clock) {
            session.score = score;
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn end(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.stop_ticker();
        self.engine.reset();
        if let Some(session) = self.session.as_mut() {
            session.state = SessionState::Terminated;
            session.score = 0;
        }
    }

    fn invalid(&self, operation: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            from: self.state().to_string(),
            operation,
        }
    }
}

/// Releases the save guard however `confirm_exit` finishes.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one player's play session.
pub struct SessionController {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn TickScheduler>,
    score_sink: Arc<dyn ScoreSink>,
    broadcast: Option<(RoomConfig, BroadcastDeps)>,
    inner: Arc<Mutex<SessionInner>>,
    saving: AtomicBool,
    room: tokio::sync::Mutex<Option<BroadcastRoom>>,
}

impl SessionController {
    /// Creates an idle controller without broadcasting.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn TickScheduler>,
        score_sink: Arc<dyn ScoreSink>,
    ) -> Self {
        Self {
            clock,
            scheduler,
            score_sink,
            broadcast: None,
            inner: Arc::new(Mutex::new(SessionInner::default())),
            saving: AtomicBool::new(false),
            room: tokio::sync::Mutex::new(None),
        }
    }

    /// Enables [`go_live`](Self::go_live) and [`watch`](Self::watch).
    #[must_use]
    pub fn with_broadcast(mut self, config: RoomConfig, deps: BroadcastDeps) -> Self {
        self.broadcast = Some((config, deps));
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    /// Last displayed score; 0 when no session is running.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.inner.lock().score()
    }

    /// Key of the current attempt.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().session.as_ref().map(|s| s.session_id)
    }

    /// The game of the current or last session.
    #[must_use]
    pub fn game(&self) -> Option<PlayableGame> {
        self.inner.lock().session.as_ref().map(|s| s.game.clone())
    }

    /// When the current attempt began.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().session.as_ref().map(|s| s.started_at)
    }

    /// Whether a final score is being saved.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Text of the last non-fatal failure.
    #[must_use]
    pub fn banner(&self) -> Option<String> {
        self.inner.lock().banner.clone()
    }

    /// Dismisses the banner.
    pub fn clear_banner(&self) {
        self.inner.lock().banner = None;
    }

    /// The pending exit confirmation, if one is showing.
    #[must_use]
    pub fn exit_prompt(&self) -> Option<ExitPrompt> {
        let inner = self.inner.lock();
        (inner.state() == SessionState::ExitRequested).then(|| ExitPrompt::for_score(inner.score()))
    }

    /// Starts playing `game`.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidGameData` if the reference is not playable
    /// - `DomainError::InvalidTransition` if a session is already running
    #[instrument(skip(self, game), fields(game_id = %game.id))]
    pub fn start(&self, game: &GameRef) -> Result<SessionId, DomainError> {
        let game = game.validate()?;
        self.begin(game, "start")
    }

    /// Plays the last game again from a zero score under a new session key.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the controller is
    /// `Idle` or `Terminated` with a previous game.
    #[instrument(skip(self))]
    pub fn restart(&self) -> Result<SessionId, DomainError> {
        let game = {
            let inner = self.inner.lock();
            match &inner.session {
                Some(session) => session.game.clone(),
                None => {
                    return Err(DomainError::InvalidTransition {
                        from: "idle without a game".to_owned(),
                        operation: "restart",
                    });
                }
            }
        };
        self.begin(game, "restart")
    }

    fn begin(&self, game: PlayableGame, operation: &'static str) -> Result<SessionId, DomainError> {
        let mut inner = self.inner.lock();
        if !inner.state().can_start() || self.is_saving() {
            return Err(inner.invalid(operation));
        }

        let now = self.clock.now();
        let session = GameSession::begin(game, now);
        let session_id = session.session_id;
        info!(%session_id, game_id = %session.game.id(), "session started");

        inner.stop_ticker();
        inner.engine.start(now);
        inner.session = Some(session);
        inner.banner = None;
        inner.ticker = Some(self.start_ticker());
        Ok(session_id)
    }

    fn start_ticker(&self) -> TickHandle {
        let inner: Weak<Mutex<SessionInner>> = Arc::downgrade(&self.inner);
        let clock = Arc::clone(&self.clock);
        self.scheduler.start(Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.lock().on_frame(clock.as_ref());
            }
        }))
    }

    /// Asks to leave the game.
    ///
    /// With a zero score the session ends at once. Otherwise the score is
    /// frozen and a confirmation is required; asking again while it shows
    /// returns the same prompt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is
    /// `Playing` or `ExitRequested`.
    #[instrument(skip(self))]
    pub async fn request_exit(&self) -> Result<ExitDecision, DomainError> {
        let (game_id, score) = {
            let mut inner = self.inner.lock();
            match inner.state() {
                SessionState::Playing => {}
                SessionState::ExitRequested => {
                    return Ok(ExitDecision::ConfirmationRequired(ExitPrompt::for_score(
                        inner.score(),
                    )));
                }
                _ => return Err(inner.invalid("request exit")),
            }

            inner.on_frame(self.clock.as_ref());
            inner.stop_ticker();
            let score = inner.score();
            let Some(session) = inner.session.as_mut() else {
                return Err(DomainError::InvalidTransition {
                    from: SessionState::Idle.to_string(),
                    operation: "request exit",
                });
            };
            let game_id = session.game.id().clone();
            if score > 0 {
                session.state = SessionState::ExitRequested;
                info!(score, "exit requested, awaiting confirmation");
                return Ok(ExitDecision::ConfirmationRequired(ExitPrompt::for_score(score)));
            }
            inner.end();
            (game_id, score)
        };

        info!("no score to save, leaving");
        self.teardown_room().await;
        Ok(ExitDecision::Exited(ExitReport {
            game_id,
            final_score: score,
            saved: false,
        }))
    }

    /// Saves the final score and ends the session.
    ///
    /// A failed save is logged and shown on the banner; the session ends
    /// regardless. Any broadcast room is torn down. While one confirmation
    /// is saving, further calls return [`ConfirmOutcome::AlreadySaving`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless an exit was requested.
    #[instrument(skip(self))]
    pub async fn confirm_exit(&self) -> Result<ConfirmOutcome, DomainError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("save already in flight");
            return Ok(ConfirmOutcome::AlreadySaving);
        }
        let _guard = SavingGuard(&self.saving);

        let (game_id, score) = {
            let mut inner = self.inner.lock();
            let invalid = inner.invalid("confirm exit");
            match inner.session.as_mut() {
                Some(session) if session.state == SessionState::ExitRequested => {
                    session.state = SessionState::Saving;
                    (session.game.id().clone(), session.score)
                }
                _ => return Err(invalid),
            }
        };

        let saved = score > 0 && self.save_score(&game_id, score).await;
        self.teardown_room().await;
        self.inner.lock().end();

        info!(final_score = score, saved, "session ended");
        Ok(ConfirmOutcome::Completed(ExitReport {
            game_id,
            final_score: score,
            saved,
        }))
    }

    async fn save_score(&self, game_id: &GameId, score: u32) -> bool {
        match self.score_sink.submit_score(game_id, score).await {
            Ok(()) => {
                info!(score, "score saved");
                true
            }
            Err(err) => {
                warn!(error = %err, score, "score save failed, leaving anyway");
                self.inner.lock().banner = Some(err.to_string());
                false
            }
        }
    }

    /// Dismisses the exit confirmation and resumes scoring.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless an exit was requested.
    pub fn cancel_exit(&self) -> Result<(), DomainError> {
        let mut inner = self.inner.lock();
        if inner.state() != SessionState::ExitRequested {
            return Err(inner.invalid("cancel exit"));
        }
        if let Some(session) = inner.session.as_mut() {
            session.state = SessionState::Playing;
        }
        inner.ticker = Some(self.start_ticker());
        debug!("exit cancelled, resuming");
        Ok(())
    }

    /// Unload hook: prevents `event` while unsaved progress exists.
    pub fn on_before_unload(&self, event: &mut UnloadEvent) -> bool {
        let mut inner = self.inner.lock();
        inner.on_frame(self.clock.as_ref());
        NavigationGuard::on_before_unload(inner.state(), inner.score(), event)
    }

    /// Back-navigation hook. When intercepted the exit flow is started and
    /// the prompt is available from [`exit_prompt`](Self::exit_prompt).
    ///
    /// # Errors
    ///
    /// Propagates errors from [`request_exit`](Self::request_exit).
    pub async fn handle_back_navigation(
        &self,
        current_route: &str,
    ) -> Result<BackNavigation, DomainError> {
        let decision = {
            let mut inner = self.inner.lock();
            inner.on_frame(self.clock.as_ref());
            NavigationGuard::on_back_navigation(inner.state(), inner.score(), current_route)
        };
        if matches!(decision, BackNavigation::Intercepted { .. }) {
            self.request_exit().await?;
        }
        Ok(decision)
    }

    /// Broadcasts the current game as streamer.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition` if not playing, if broadcasting is
    ///   not configured, or if a room is already open
    /// - `DomainError::InvalidTransition` if the session ended while joining;
    ///   the joined room is left again
    /// - any error from [`BroadcastRoom::go_live`]; the banner is set
    #[instrument(skip(self))]
    pub async fn go_live(&self) -> Result<(), DomainError> {
        let (game_id, generation) = {
            let inner = self.inner.lock();
            match &inner.session {
                Some(session) if session.state == SessionState::Playing => {
                    (session.game.id().clone(), inner.generation)
                }
                _ => return Err(inner.invalid("go live")),
            }
        };

        let mut slot = self.room.lock().await;
        let mut room = self.new_room(slot.as_ref(), "go live")?;
        match room.go_live(&game_id).await {
            Ok(()) => {
                if let Some(err) = self.outlived(generation, true, "go live") {
                    warn!("session ended while going live, leaving the room");
                    room.stop().await;
                    return Err(err);
                }
                *slot = Some(room);
                Ok(())
            }
            Err(err) => {
                self.inner.lock().banner = room.last_error().map(str::to_owned);
                Err(err)
            }
        }
    }

    /// Joins `game_id`'s broadcast as a viewer.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition` if broadcasting is not configured
    ///   or a room is already open
    /// - `DomainError::InvalidTransition` if the controller was unmounted
    ///   while joining; the joined room is left again
    /// - any error from [`BroadcastRoom::watch`]; the banner is set
    #[instrument(skip(self, game_id), fields(game_id = %game_id))]
    pub async fn watch(&self, game_id: &GameId) -> Result<(), DomainError> {
        let generation = self.inner.lock().generation;
        let mut slot = self.room.lock().await;
        let mut room = self.new_room(slot.as_ref(), "watch")?;
        match room.watch(game_id).await {
            Ok(()) => {
                if let Some(err) = self.outlived(generation, false, "watch") {
                    warn!("session ended while joining, leaving the room");
                    room.stop().await;
                    return Err(err);
                }
                *slot = Some(room);
                Ok(())
            }
            Err(err) => {
                self.inner.lock().banner = room.last_error().map(str::to_owned);
                Err(err)
            }
        }
    }

    /// The error for a join that finished after its session ended, or, when
    /// `needs_play` is set, after the player stopped playing.
    fn outlived(
        &self,
        generation: u64,
        needs_play: bool,
        operation: &'static str,
    ) -> Option<DomainError> {
        let inner = self.inner.lock();
        let playing = matches!(
            inner.state(),
            SessionState::Playing | SessionState::ExitRequested
        );
        let current = inner.generation == generation && (playing || !needs_play);
        (!current).then(|| inner.invalid(operation))
    }

    fn new_room(
        &self,
        current: Option<&BroadcastRoom>,
        operation: &'static str,
    ) -> Result<BroadcastRoom, DomainError> {
        if let Some(role) = current.and_then(BroadcastRoom::role) {
            return Err(DomainError::InvalidTransition {
                from: format!("broadcasting as {role}"),
                operation,
            });
        }
        let Some((config, deps)) = &self.broadcast else {
            return Err(DomainError::InvalidTransition {
                from: "broadcasting disabled".to_owned(),
                operation,
            });
        };
        Ok(BroadcastRoom::new(config.clone(), deps.clone()))
    }

    /// Stops broadcasting or watching.
    pub async fn stop_broadcast(&self) {
        self.teardown_room().await;
    }

    /// Applies queued relay events. A room the relay has closed is
    /// discarded and its error shown on the banner.
    pub async fn drain_room_events(&self) -> usize {
        let mut slot = self.room.lock().await;
        let Some(room) = slot.as_mut() else {
            return 0;
        };
        let applied = room.drain_events();
        if !room.is_active() {
            if let Some(err) = room.last_error() {
                self.inner.lock().banner = Some(err.to_owned());
            }
            *slot = None;
        }
        applied
    }

    /// The open room, if any.
    pub async fn broadcast_status(&self) -> Option<BroadcastStatus> {
        let slot = self.room.lock().await;
        let room = slot.as_ref()?;
        Some(BroadcastStatus {
            role: room.role()?,
            connection_state: room.connection_state(),
            local_tracks: room.local_tracks().len(),
        })
    }

    async fn teardown_room(&self) {
        let room = self.room.lock().await.take();
        if let Some(mut room) = room {
            room.stop().await;
        }
    }

    /// Host teardown. Stops the score tick at once and releases the room
    /// best-effort; a save already in flight is left to finish. A room join
    /// still in progress leaves the room itself once it sees the unmount.
    pub fn unmount(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.state() == SessionState::Saving {
                inner.stop_ticker();
                inner.generation = inner.generation.wrapping_add(1);
            } else {
                inner.end();
            }
        }
        match self.room.try_lock() {
            Ok(mut slot) => drop(slot.take()),
            Err(_) => debug!("room busy during unmount, its operation releases it"),
        }
        debug!("session unmounted");
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SessionController")
            .field("state", &inner.state())
            .field("score", &inner.score())
            .field("saving", &self.is_saving())
            .field("broadcast", &self.broadcast.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use gamehub_broadcast::domain::ports::RoomEvent;
    use gamehub_broadcast::domain::sinks::SinkLayout;
    use gamehub_test_support::{
        FailingScoreSink, FakeMediaDevices, FakeRoomTransport, ManualClock, ManualTickScheduler,
        RecordingMediaSinks, RecordingScoreSink, RecordingTokenIssuer,
    };

    use super::*;
    use crate::domain::navigation::UNSAVED_PROGRESS_MESSAGE;

    struct Fixture {
        clock: Arc<ManualClock>,
        scheduler: Arc<ManualTickScheduler>,
        sink: Arc<RecordingScoreSink>,
        devices: Arc<FakeMediaDevices>,
        relay: Arc<FakeRoomTransport>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_media(FakeMediaDevices::granting(), FakeRoomTransport::new())
        }

        fn with_media(devices: FakeMediaDevices, relay: FakeRoomTransport) -> Self {
            Self {
                clock: Arc::new(ManualClock::new(
                    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
                )),
                scheduler: Arc::new(ManualTickScheduler::new()),
                sink: Arc::new(RecordingScoreSink::new()),
                devices: Arc::new(devices),
                relay: Arc::new(relay),
            }
        }

        fn controller(&self) -> SessionController {
            SessionController::new(
                self.clock.clone(),
                self.scheduler.clone(),
                self.sink.clone(),
            )
        }

        fn broadcasting_controller(&self) -> SessionController {
            let config = RoomConfig::new("wss://relay.example.com", SinkLayout::DualStream).unwrap();
            let deps = BroadcastDeps {
                token_issuer: Arc::new(RecordingTokenIssuer::new()),
                devices: self.devices.clone(),
                transport: self.relay.clone(),
                sinks: Arc::new(RecordingMediaSinks::new()),
            };
            self.controller().with_broadcast(config, deps)
        }

        fn play(&self, controller: &SessionController, seconds: i64) {
            self.clock.advance_secs(seconds);
            self.scheduler.fire();
            assert_eq!(controller.state(), SessionState::Playing);
        }
    }

    fn game() -> GameRef {
        GameRef::new("g1", "Drift King", "https://x.io/g")
    }

    #[test]
    fn test_start_enters_playing_with_zero_score() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();

        // Act
        let session_id = controller.start(&game()).unwrap();

        // Assert
        assert_eq!(controller.state(), SessionState::Playing);
        assert_eq!(controller.score(), 0);
        assert_eq!(controller.session_id(), Some(session_id));
        assert_eq!(controller.started_at(), Some(fx.clock.now()));
        assert_eq!(fx.scheduler.active_ticks(), 1);
    }

    #[test]
    fn test_start_rejects_invalid_game_and_stays_idle() {
        let fx = Fixture::new();
        let controller = fx.controller();

        let result = controller.start(&GameRef::new("g1", "Drift King", "::nope"));

        assert!(matches!(result, Err(DomainError::InvalidGameData(_))));
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(fx.scheduler.active_ticks(), 0);
    }

    #[test]
    fn test_start_while_playing_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        let result = controller.start(&game());

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { operation: "start", .. })
        ));
    }

    #[test]
    fn test_score_after_ten_seconds_is_two() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        // Act
        fx.clock.advance_secs(10);
        fx.scheduler.fire();

        // Assert
        assert_eq!(controller.score(), 2);
    }

    #[test]
    fn test_score_never_decreases_while_playing() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 20);
        let before = controller.score();

        fx.clock.advance_secs(-60);
        fx.scheduler.fire();

        assert_eq!(before, 4);
        assert_eq!(controller.score(), 4);
    }

    #[tokio::test]
    async fn test_request_exit_at_zero_score_exits_without_saving() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        // Act
        let decision = controller.request_exit().await.unwrap();

        // Assert
        assert_eq!(
            decision,
            ExitDecision::Exited(ExitReport {
                game_id: GameId::new("g1"),
                final_score: 0,
                saved: false,
            })
        );
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(fx.sink.submissions().is_empty());
        assert_eq!(fx.scheduler.active_ticks(), 0);
    }

    #[tokio::test]
    async fn test_request_exit_with_score_requires_confirmation_and_freezes_score() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 15);

        // Act
        let decision = controller.request_exit().await.unwrap();
        fx.clock.advance_secs(100);
        fx.scheduler.fire();

        // Assert
        assert_eq!(
            decision,
            ExitDecision::ConfirmationRequired(ExitPrompt {
                score: 3,
                message: "Your current score is 3. Are you sure you want to quit?".into(),
            })
        );
        assert_eq!(controller.state(), SessionState::ExitRequested);
        assert_eq!(controller.score(), 3);
        assert_eq!(fx.scheduler.active_ticks(), 0);
        assert_eq!(controller.exit_prompt().map(|p| p.score), Some(3));
    }

    #[tokio::test]
    async fn test_request_exit_samples_the_latest_score() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.clock.advance_secs(10);

        let decision = controller.request_exit().await.unwrap();

        assert!(matches!(
            decision,
            ExitDecision::ConfirmationRequired(ExitPrompt { score: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_exit_resumes_playing() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 10);
        controller.request_exit().await.unwrap();

        controller.cancel_exit().unwrap();
        fx.play(&controller, 10);

        assert_eq!(controller.state(), SessionState::Playing);
        assert_eq!(controller.score(), 4);
        assert_eq!(fx.scheduler.active_ticks(), 1);
        assert!(fx.sink.submissions().is_empty());
    }

    #[test]
    fn test_cancel_exit_while_playing_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        let result = controller.cancel_exit();

        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_confirm_exit_saves_score_and_terminates() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 10);
        controller.request_exit().await.unwrap();

        // Act
        let outcome = controller.confirm_exit().await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            ConfirmOutcome::Completed(ExitReport {
                game_id: GameId::new("g1"),
                final_score: 2,
                saved: true,
            })
        );
        assert_eq!(fx.sink.submissions(), vec![(GameId::new("g1"), 2)]);
        assert_eq!(controller.state(), SessionState::Terminated);
        assert_eq!(controller.score(), 0);
        assert!(!controller.is_saving());
    }

    #[tokio::test]
    async fn test_concurrent_confirm_exit_submits_once() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 25);
        controller.request_exit().await.unwrap();

        // Act
        let (first, second) = tokio::join!(controller.confirm_exit(), controller.confirm_exit());

        // Assert
        assert!(matches!(first, Ok(ConfirmOutcome::Completed(_))));
        assert_eq!(second, Ok(ConfirmOutcome::AlreadySaving));
        assert_eq!(fx.sink.submissions(), vec![(GameId::new("g1"), 5)]);
    }

    #[tokio::test]
    async fn test_confirm_exit_proceeds_when_save_fails() {
        // Arrange
        let fx = Fixture::new();
        let sink = Arc::new(FailingScoreSink::new());
        let controller = SessionController::new(fx.clock.clone(), fx.scheduler.clone(), sink.clone());
        controller.start(&game()).unwrap();
        fx.play(&controller, 10);
        controller.request_exit().await.unwrap();

        // Act
        let outcome = controller.confirm_exit().await.unwrap();

        // Assert
        assert!(matches!(
            outcome,
            ConfirmOutcome::Completed(ExitReport { saved: false, final_score: 2, .. })
        ));
        assert_eq!(sink.calls(), 1);
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(controller.banner().is_some_and(|b| b.contains("score save failed")));
    }

    #[tokio::test]
    async fn test_confirm_exit_without_request_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        let result = controller.confirm_exit().await;

        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
        assert!(!controller.is_saving());
        assert_eq!(controller.state(), SessionState::Playing);
    }

    #[tokio::test]
    async fn test_restart_after_exit_resets_score_and_session_key() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        let first = controller.start(&game()).unwrap();
        fx.play(&controller, 10);
        controller.request_exit().await.unwrap();
        controller.confirm_exit().await.unwrap();

        // Act
        let second = controller.restart().unwrap();

        // Assert
        assert_ne!(first, second);
        assert_eq!(controller.state(), SessionState::Playing);
        assert_eq!(controller.score(), 0);
        assert_eq!(controller.started_at(), Some(fx.clock.now()));
        fx.scheduler.fire();
        assert_eq!(controller.score(), 0);
    }

    #[test]
    fn test_restart_while_playing_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        let result = controller.restart();

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { operation: "restart", .. })
        ));
    }

    #[test]
    fn test_restart_without_previous_game_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.controller();

        assert!(controller.restart().is_err());
    }

    #[test]
    fn test_unload_prevented_only_with_unsaved_score() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        let mut early = UnloadEvent::new();
        let mut late = UnloadEvent::new();

        // Act
        let prevented_at_zero = controller.on_before_unload(&mut early);
        fx.clock.advance_secs(25);
        let prevented_at_five = controller.on_before_unload(&mut late);

        // Assert
        assert!(!prevented_at_zero);
        assert!(!early.is_default_prevented());
        assert!(prevented_at_five);
        assert_eq!(controller.score(), 5);
        assert_eq!(late.return_value(), UNSAVED_PROGRESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_back_navigation_with_score_opens_exit_prompt() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 10);

        let decision = controller.handle_back_navigation("/play/g1").await.unwrap();

        assert_eq!(
            decision,
            BackNavigation::Intercepted {
                restore_route: "/play/g1".into()
            }
        );
        assert_eq!(controller.state(), SessionState::ExitRequested);
        assert!(controller.exit_prompt().is_some());
    }

    #[tokio::test]
    async fn test_back_navigation_at_zero_score_is_allowed() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        let decision = controller.handle_back_navigation("/play/g1").await.unwrap();

        assert_eq!(decision, BackNavigation::Allow);
        assert_eq!(controller.state(), SessionState::Playing);
    }

    #[tokio::test]
    async fn test_go_live_without_broadcast_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.controller();
        controller.start(&game()).unwrap();

        let result = controller.go_live().await;

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { operation: "go live", .. })
        ));
    }

    #[tokio::test]
    async fn test_go_live_before_start_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();

        let result = controller.go_live().await;

        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
        assert_eq!(fx.relay.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_confirm_exit_tears_down_live_broadcast() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();
        controller.go_live().await.unwrap();
        fx.play(&controller, 10);
        controller.request_exit().await.unwrap();

        // Act
        controller.confirm_exit().await.unwrap();

        // Assert
        assert!(controller.broadcast_status().await.is_none());
        assert_eq!(fx.devices.live_track_count(), 0);
        assert_eq!(fx.relay.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_go_live_reports_status() {
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();

        controller.go_live().await.unwrap();

        assert_eq!(
            controller.broadcast_status().await,
            Some(BroadcastStatus {
                role: ParticipantRole::Streamer,
                connection_state: ConnectionState::Connected,
                local_tracks: 3,
            })
        );
    }

    #[tokio::test]
    async fn test_go_live_denied_sets_banner_and_holds_nothing() {
        // Arrange
        let fx = Fixture::with_media(
            FakeMediaDevices::granting().deny_camera(),
            FakeRoomTransport::new(),
        );
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();

        // Act
        let result = controller.go_live().await;

        // Assert
        assert!(matches!(result, Err(DomainError::MediaPermissionDenied(_))));
        assert!(controller.banner().is_some());
        assert!(controller.broadcast_status().await.is_none());
        assert_eq!(fx.devices.live_track_count(), 0);
        assert_eq!(fx.relay.open_connections(), 0);
        assert_eq!(controller.state(), SessionState::Playing);
    }

    #[tokio::test]
    async fn test_second_room_is_rejected() {
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();
        controller.go_live().await.unwrap();

        let again = controller.go_live().await;
        let watch = controller.watch(&GameId::new("g2")).await;

        assert!(matches!(again, Err(DomainError::InvalidTransition { .. })));
        assert!(matches!(watch, Err(DomainError::InvalidTransition { .. })));
        assert_eq!(fx.relay.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_broadcast_then_go_live_again() {
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();
        controller.go_live().await.unwrap();

        controller.stop_broadcast().await;
        controller.go_live().await.unwrap();

        assert_eq!(fx.relay.connect_count(), 2);
        assert_eq!(fx.relay.open_connections(), 1);
        assert_eq!(fx.devices.live_track_count(), 3);
    }

    #[tokio::test]
    async fn test_relay_disconnect_clears_room_and_sets_banner() {
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.watch(&GameId::new("g1")).await.unwrap();

        fx.relay.push_event(RoomEvent::Disconnected);
        let applied = controller.drain_room_events().await;

        assert_eq!(applied, 1);
        assert!(controller.broadcast_status().await.is_none());
        assert_eq!(controller.banner().as_deref(), Some("room disconnected"));
    }

    #[tokio::test]
    async fn test_unmount_stops_ticks_and_releases_room() {
        // Arrange
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();
        controller.go_live().await.unwrap();

        // Act
        controller.unmount();

        // Assert
        assert_eq!(fx.scheduler.active_ticks(), 0);
        assert_eq!(fx.devices.live_track_count(), 0);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fx.relay.open_connections(), 0);
        assert_eq!(controller.state(), SessionState::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_go_live_leaves_no_room_behind() {
        // Arrange
        let fx = Fixture::with_media(
            FakeMediaDevices::granting().with_prompt_delay(Duration::from_secs(2)),
            FakeRoomTransport::new(),
        );
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();

        // Act
        let (result, ()) = tokio::join!(controller.go_live(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.unmount();
        });

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { operation: "go live", .. })
        ));
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(controller.broadcast_status().await.is_none());
        assert_eq!(fx.devices.issued_tracks().len(), 3);
        assert_eq!(fx.devices.live_track_count(), 0);
        assert_eq!(fx.relay.connect_count(), 1);
        assert_eq!(fx.relay.open_connections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_watch_leaves_no_room_behind() {
        let fx = Fixture::with_media(
            FakeMediaDevices::granting(),
            FakeRoomTransport::new().with_connect_delay(Duration::from_secs(2)),
        );
        let controller = fx.broadcasting_controller();

        let game_id = GameId::new("g1");
        let (result, ()) = tokio::join!(controller.watch(&game_id), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.unmount();
        });

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { operation: "watch", .. })
        ));
        assert!(controller.broadcast_status().await.is_none());
        assert_eq!(fx.relay.connect_count(), 1);
        assert_eq!(fx.relay.open_connections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_exit_during_go_live_releases_the_room() {
        // Arrange
        let fx = Fixture::with_media(
            FakeMediaDevices::granting().with_prompt_delay(Duration::from_secs(2)),
            FakeRoomTransport::new(),
        );
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();
        fx.play(&controller, 10);

        // Act
        let (live, outcome) = tokio::join!(controller.go_live(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.request_exit().await.unwrap();
            controller.confirm_exit().await
        });

        // Assert
        assert!(live.is_err());
        assert!(matches!(
            outcome,
            Ok(ConfirmOutcome::Completed(ExitReport { final_score: 2, saved: true, .. }))
        ));
        assert_eq!(controller.state(), SessionState::Terminated);
        assert!(controller.broadcast_status().await.is_none());
        assert_eq!(fx.devices.live_track_count(), 0);
        assert_eq!(fx.relay.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_go_live_after_unmount_and_restart_is_kept() {
        let fx = Fixture::new();
        let controller = fx.broadcasting_controller();
        controller.start(&game()).unwrap();
        controller.unmount();
        controller.restart().unwrap();

        controller.go_live().await.unwrap();

        assert!(controller.broadcast_status().await.is_some());
        assert_eq!(fx.relay.open_connections(), 1);
    }
}
