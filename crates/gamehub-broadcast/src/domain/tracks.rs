//! Local and remote media tracks.

use std::fmt;
use std::sync::Arc;

/// Whether a track carries video or audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A video track.
    Video,
    /// An audio track.
    Audio,
}

/// The role a local track plays in a broadcast. Publication order follows
/// [`TrackKind::PUBLISH_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Screen capture video.
    Screen,
    /// Webcam video.
    Webcam,
    /// Microphone audio captured alongside the webcam.
    Audio,
}

impl TrackKind {
    /// Screen before webcam before audio.
    pub const PUBLISH_ORDER: [TrackKind; 3] = [TrackKind::Screen, TrackKind::Webcam, TrackKind::Audio];

    /// The publication name remote participants see.
    #[must_use]
    pub fn publication_name(self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Webcam => "webcam",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.publication_name())
    }
}

/// A media track backed by a device handle. Stopping releases the device.
pub trait MediaTrack: Send + Sync + fmt::Debug {
    /// Device-assigned track identifier.
    fn id(&self) -> &str;

    /// Video or audio.
    fn media_kind(&self) -> MediaKind;

    /// Stops the track and releases the underlying device. Idempotent.
    fn stop(&self);

    /// Returns `true` until [`MediaTrack::stop`] has been called.
    fn is_live(&self) -> bool;
}

/// The tracks returned by one capture request.
#[derive(Debug, Default, Clone)]
pub struct MediaStream {
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    /// Builds a stream from its tracks.
    #[must_use]
    pub fn new(tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self { tracks }
    }

    /// Iterates the video tracks.
    pub fn video_tracks(&self) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .filter(|t| t.media_kind() == MediaKind::Video)
    }

    /// Iterates the audio tracks.
    pub fn audio_tracks(&self) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .filter(|t| t.media_kind() == MediaKind::Audio)
    }

    /// Consumes the stream, returning every track.
    #[must_use]
    pub fn into_tracks(self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
    }

    /// Stops every track in the stream.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// A local track held by a streamer room, labelled with its broadcast role.
#[derive(Debug, Clone)]
pub struct LocalTrack {
    /// Broadcast role of the track.
    pub kind: TrackKind,
    /// The device-backed track.
    pub track: Arc<dyn MediaTrack>,
}

/// A track published by another participant and subscribed by this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    /// Relay-assigned track identifier, unique within the room.
    pub sid: String,
    /// Name the publisher gave the track (`screen`, `webcam`, ...).
    pub publication_name: String,
    /// Video or audio.
    pub kind: MediaKind,
    /// Identity of the publishing participant.
    pub participant_identity: String,
}
