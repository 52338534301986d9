//! Application services for the Live Broadcast context.

pub mod room;
pub mod watch_link;
