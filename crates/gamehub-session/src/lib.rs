//! GameHub: Play Session bounded context.
//!
//! Runs a single player's play session: validates the game, keeps the
//! time-based score, guards navigation while unsaved progress exists, and
//! drives the exit, save and restart flows. Optionally opens a broadcast
//! room for the session.

pub mod application;
pub mod domain;
