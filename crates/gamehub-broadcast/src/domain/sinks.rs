//! Routing of subscribed video tracks to named display sinks.

use std::collections::HashMap;
use std::fmt;

/// Sink of the single-stream viewer page.
pub const STREAM_VIDEO_SINK: &str = "stream-video";

/// Sink for the screen share in the dual-stream viewer page.
pub const SCREEN_VIDEO_SINK: &str = "screen-video";

/// Sink for the webcam in the dual-stream viewer page.
pub const WEBCAM_VIDEO_SINK: &str = "webcam-video";

/// Identifier of a video display element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SinkId(String);

impl SinkId {
    /// Wraps a sink identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which viewer page variant is rendering the broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkLayout {
    /// Everything goes to `stream-video`.
    SingleStream,
    /// `screen` goes to `screen-video`, everything else to `webcam-video`.
    #[default]
    DualStream,
}

/// Maps publication names to sinks, with a fallback for unknown names.
#[derive(Debug, Clone)]
pub struct SinkRouter {
    routes: HashMap<String, SinkId>,
    fallback: SinkId,
}

impl SinkRouter {
    /// Builds an empty table that sends everything to `fallback`.
    #[must_use]
    pub fn with_fallback(fallback: SinkId) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    /// Adds or replaces a route.
    #[must_use]
    pub fn route_name(mut self, publication_name: impl Into<String>, sink: SinkId) -> Self {
        self.routes.insert(publication_name.into(), sink);
        self
    }

    /// The routing table for a viewer page variant.
    #[must_use]
    pub fn for_layout(layout: SinkLayout) -> Self {
        match layout {
            SinkLayout::SingleStream => Self::with_fallback(SinkId::new(STREAM_VIDEO_SINK)),
            SinkLayout::DualStream => Self::with_fallback(SinkId::new(WEBCAM_VIDEO_SINK))
                .route_name("screen", SinkId::new(SCREEN_VIDEO_SINK)),
        }
    }

    /// The sink a track published as `publication_name` belongs in.
    #[must_use]
    pub fn route(&self, publication_name: &str) -> &SinkId {
        self.routes.get(publication_name).unwrap_or(&self.fallback)
    }
}
