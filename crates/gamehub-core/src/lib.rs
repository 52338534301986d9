//! GameHub Core: shared abstractions.
//!
//! This crate defines the traits and types the session, broadcast and client
//! crates depend on: time, frame scheduling, identifiers, the error taxonomy
//! and the ports to the external score, leaderboard and token services. It
//! contains no HTTP or media code.

pub mod clock;
pub mod error;
pub mod ids;
pub mod repository;
pub mod scheduler;
pub mod token;
