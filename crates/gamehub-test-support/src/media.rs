//! Fake capture devices.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gamehub_broadcast::domain::ports::MediaDevices;
use gamehub_broadcast::domain::tracks::{MediaKind, MediaStream, MediaTrack};
use gamehub_core::error::DomainError;

/// An in-memory track that remembers whether it was stopped.
#[derive(Debug)]
pub struct FakeTrack {
    id: String,
    kind: MediaKind,
    live: AtomicBool,
}

impl FakeTrack {
    /// Creates a live track.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            live: AtomicBool::new(true),
        }
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn media_kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Outcome of one capture prompt.
#[derive(Debug, Clone)]
enum Prompt {
    Grant(Vec<MediaKind>),
    Deny,
}

/// Capture devices whose prompts are scripted per test. Every track handed
/// out is kept so tests can check none is left live.
#[derive(Debug)]
pub struct FakeMediaDevices {
    screen: Prompt,
    camera: Prompt,
    prompt_delay: Duration,
    issued: Mutex<Vec<Arc<FakeTrack>>>,
}

impl Default for FakeMediaDevices {
    fn default() -> Self {
        Self::granting()
    }
}

impl FakeMediaDevices {
    /// Grants a screen with one video track and a camera with video and
    /// audio.
    #[must_use]
    pub fn granting() -> Self {
        Self {
            screen: Prompt::Grant(vec![MediaKind::Video]),
            camera: Prompt::Grant(vec![MediaKind::Video, MediaKind::Audio]),
            prompt_delay: Duration::ZERO,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Refuses the screen capture prompt.
    #[must_use]
    pub fn deny_screen(mut self) -> Self {
        self.screen = Prompt::Deny;
        self
    }

    /// Refuses the camera and microphone prompt.
    #[must_use]
    pub fn deny_camera(mut self) -> Self {
        self.camera = Prompt::Deny;
        self
    }

    /// Grants a screen capture containing exactly `kinds`.
    #[must_use]
    pub fn screen_tracks(mut self, kinds: Vec<MediaKind>) -> Self {
        self.screen = Prompt::Grant(kinds);
        self
    }

    /// Answers each prompt only after `delay`, as a player pondering the
    /// permission dialog would.
    #[must_use]
    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.prompt_delay = delay;
        self
    }

    /// Every track handed out so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn issued_tracks(&self) -> Vec<Arc<FakeTrack>> {
        self.issued.lock().unwrap().clone()
    }

    /// Number of handed-out tracks that have not been stopped.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn live_track_count(&self) -> usize {
        self.issued
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.is_live())
            .count()
    }

    async fn wait_for_player(&self) {
        if !self.prompt_delay.is_zero() {
            tokio::time::sleep(self.prompt_delay).await;
        }
    }

    fn answer(&self, prompt: &Prompt, source: &str) -> Result<MediaStream, DomainError> {
        let Prompt::Grant(kinds) = prompt else {
            return Err(DomainError::MediaPermissionDenied(format!(
                "{source} permission denied"
            )));
        };
        let mut issued = self.issued.lock().unwrap();
        let tracks = kinds
            .iter()
            .map(|kind| {
                let track = Arc::new(FakeTrack::new(
                    format!("{source}-{}", issued.len()),
                    *kind,
                ));
                issued.push(Arc::clone(&track));
                track as Arc<dyn MediaTrack>
            })
            .collect();
        Ok(MediaStream::new(tracks))
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn capture_screen(&self) -> Result<MediaStream, DomainError> {
        self.wait_for_player().await;
        self.answer(&self.screen, "screen")
    }

    async fn capture_camera(&self) -> Result<MediaStream, DomainError> {
        self.wait_for_player().await;
        self.answer(&self.camera, "camera")
    }
}
