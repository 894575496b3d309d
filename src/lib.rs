//! Grimoire Engine: rule automation for hidden-role social deduction games.
//!
//! Evaluates role abilities against a storyteller's game snapshot, orders
//! night actions, resolves votes and executions, and decides when a game
//! is over. The engine never mutates the host's state in place: it returns
//! intents (suggestions, status changes, deaths, chain reactions) that the
//! host applies.

pub mod core;
pub mod schema;
