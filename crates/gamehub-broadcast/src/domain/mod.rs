//! Domain model for the Live Broadcast context.

pub mod ports;
pub mod sinks;
pub mod tracks;
