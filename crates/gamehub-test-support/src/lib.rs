//! Shared test mocks and utilities for GameHub.

mod clock;
mod media;
mod relay;
mod repository;
mod scheduler;
mod token;

pub use clock::{FixedClock, ManualClock};
pub use media::{FakeMediaDevices, FakeTrack};
pub use relay::{FakeRoomTransport, RecordingMediaSinks};
pub use repository::{
    FailingLeaderboardSource, FailingScoreSink, RecordingScoreSink, StaticLeaderboardSource,
};
pub use scheduler::ManualTickScheduler;
pub use token::{FailingTokenIssuer, RecordingTokenIssuer};
