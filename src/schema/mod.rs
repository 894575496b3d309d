//! Plain data exchanged between the host and the engine.

pub mod ability;
pub mod game;
pub mod seat;
