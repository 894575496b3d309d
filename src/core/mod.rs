//! Rule behavior: scripts, night order, role processors, the automation engine, voting and win checks.

pub mod engine;
pub mod game_end;
pub mod night_queue;
pub mod phase;
pub mod roles;
pub mod script;
pub mod voting;
