//! Domain model for the Play Session context.

pub mod game;
pub mod navigation;
pub mod score;
pub mod state;
