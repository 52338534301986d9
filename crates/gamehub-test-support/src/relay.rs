//! Fake media relay and display sinks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gamehub_broadcast::domain::ports::{
    ConnectedRoom, MediaSinks, RoomConnection, RoomEvent, RoomTransport,
};
use gamehub_broadcast::domain::sinks::SinkId;
use gamehub_broadcast::domain::tracks::{MediaTrack, RemoteTrack};
use gamehub_core::error::DomainError;
use gamehub_core::token::RoomToken;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Default)]
struct RelayState {
    tokens: Mutex<Vec<String>>,
    publications: Mutex<Vec<String>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    sender: Mutex<Option<mpsc::UnboundedSender<RoomEvent>>>,
}

/// An in-memory relay. Records joins, publications and disconnects, and
/// lets tests push room events to the most recent connection.
#[derive(Debug, Default)]
pub struct FakeRoomTransport {
    refuse_connect: bool,
    fail_publish_of: Option<String>,
    connect_delay: Duration,
    state: Arc<RelayState>,
}

impl FakeRoomTransport {
    /// A relay that accepts every join and publication.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A relay that rejects every join.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    /// Rejects the publication of tracks named `name`.
    #[must_use]
    pub fn failing_publish_of(mut self, name: &str) -> Self {
        self.fail_publish_of = Some(name.to_owned());
        self
    }

    /// Completes each join only after `delay`.
    #[must_use]
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Tokens presented on join, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn tokens(&self) -> Vec<String> {
        self.state.tokens.lock().unwrap().clone()
    }

    /// Publication names, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn publications(&self) -> Vec<String> {
        self.state.publications.lock().unwrap().clone()
    }

    /// Joins that have not been followed by a disconnect.
    pub fn open_connections(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst) - self.state.disconnects.load(Ordering::SeqCst)
    }

    /// Total successful joins.
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Delivers `event` to the most recent connection. Returns `false` if
    /// nobody is listening.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn push_event(&self, event: RoomEvent) -> bool {
        self.state
            .sender
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Drops the event feed of the current connection, as a crashed relay
    /// would.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn close_feed(&self) {
        self.state.sender.lock().unwrap().take();
    }
}

#[async_trait]
impl RoomTransport for FakeRoomTransport {
    async fn connect(
        &self,
        _server_url: &Url,
        token: &RoomToken,
    ) -> Result<ConnectedRoom, DomainError> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.refuse_connect {
            return Err(DomainError::RoomConnectionFailed("relay unreachable".into()));
        }
        self.state
            .tokens
            .lock()
            .unwrap()
            .push(token.expose().to_owned());
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.sender.lock().unwrap() = Some(tx);

        Ok(ConnectedRoom {
            connection: Arc::new(FakeConnection {
                fail_publish_of: self.fail_publish_of.clone(),
                disconnected: Mutex::new(false),
                state: Arc::clone(&self.state),
            }),
            events: rx,
        })
    }
}

#[derive(Debug)]
struct FakeConnection {
    fail_publish_of: Option<String>,
    disconnected: Mutex<bool>,
    state: Arc<RelayState>,
}

#[async_trait]
impl RoomConnection for FakeConnection {
    async fn publish(&self, _track: Arc<dyn MediaTrack>, name: &str) -> Result<(), DomainError> {
        tokio::task::yield_now().await;
        if self.fail_publish_of.as_deref() == Some(name) {
            return Err(DomainError::RoomConnectionFailed(format!(
                "publish of {name} rejected"
            )));
        }
        self.state
            .publications
            .lock()
            .unwrap()
            .push(name.to_owned());
        Ok(())
    }

    async fn disconnect(&self) {
        let mut disconnected = self.disconnected.lock().unwrap();
        if !*disconnected {
            *disconnected = true;
            self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Display sinks that record every attachment as `(sink, track sid)`.
#[derive(Debug, Default)]
pub struct RecordingMediaSinks {
    attached: Mutex<Vec<(String, String)>>,
}

impl RecordingMediaSinks {
    /// Creates the sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every attachment so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attachments(&self) -> Vec<(String, String)> {
        self.attached.lock().unwrap().clone()
    }
}

impl MediaSinks for RecordingMediaSinks {
    fn attach(&self, sink: &SinkId, track: &RemoteTrack) {
        self.attached
            .lock()
            .unwrap()
            .push((sink.as_str().to_owned(), track.sid.clone()));
    }
}
