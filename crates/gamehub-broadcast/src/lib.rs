//! GameHub: Live Broadcast bounded context.
//!
//! Turns a play session into a one-to-many broadcast on a room-based media
//! relay: the streamer captures and publishes screen, webcam and microphone
//! tracks; viewers subscribe and route remote video into named sinks.

pub mod application;
pub mod domain;
