/// Win-condition checks. Stateless; safe to re-run after every death.
use serde::{Deserialize, Serialize};

use crate::core::script::{RoleTrait, Script};
use crate::schema::game::{GameOver, Winner};
use crate::schema::seat::{Seat, SeatId, Team};

/// Players a successor needs alive to take over from a dead demon.
pub const SUCCESSOR_MIN_ALIVE: usize = 5;

pub const DEMON_ELIMINATED: &str = "demon eliminated";
pub const INSUFFICIENT_SURVIVORS: &str = "insufficient survivors";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndCheck {
    pub should_end: bool,
    #[serde(default)]
    pub winner: Option<Winner>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl GameEndCheck {
    pub fn continues() -> Self {
        Self {
            should_end: false,
            winner: None,
            reason: None,
        }
    }

    pub fn ends(winner: Winner, reason: impl Into<String>) -> Self {
        Self {
            should_end: true,
            winner: Some(winner),
            reason: Some(reason.into()),
        }
    }

    pub fn game_over(&self) -> Option<GameOver> {
        match (self.should_end, self.winner) {
            (true, Some(winner)) => Some(GameOver {
                winner,
                reason: self.reason.clone().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

fn holds<'a>(seat: &'a Seat, script: &Script, pred: impl Fn(&str) -> bool) -> bool {
    seat.role_id().is_some_and(|r| script.role(r).is_some() && pred(r))
}

/// The generic check, in order:
///
/// 1. No living demon: good wins, unless a living successor exists and at
///    least five players are alive.
/// 2. Two or fewer alive with the demon among them: evil wins.
/// 3. Otherwise the game continues.
pub fn check_game_end(seats: &[Seat], script: &Script) -> GameEndCheck {
    let alive: Vec<&Seat> = seats.iter().filter(|s| s.is_alive_player()).collect();
    let demon_alive = alive
        .iter()
        .any(|s| holds(s, script, |r| script.team_of(r) == Some(Team::Demon)));

    if !demon_alive {
        let successor_alive = alive
            .iter()
            .any(|s| holds(s, script, |r| script.has_trait(r, RoleTrait::Successor)));
        if successor_alive && alive.len() >= SUCCESSOR_MIN_ALIVE {
            return GameEndCheck::continues();
        }
        return GameEndCheck::ends(Winner::Good, DEMON_ELIMINATED);
    }
    if alive.len() <= 2 {
        return GameEndCheck::ends(Winner::Evil, INSUFFICIENT_SURVIVORS);
    }
    GameEndCheck::continues()
}

/// Check after an execution: an untainted execution-defeat role (the
/// saint) loses the game for good before the generic check runs.
pub fn check_after_execution(seats: &[Seat], executed: SeatId, script: &Script) -> GameEndCheck {
    let defeat = seats.iter().find(|s| s.id == executed).and_then(|seat| {
        let role = seat.role_id()?;
        (script.has_trait(role, RoleTrait::ExecutionDefeat) && !seat.is_tainted())
            .then(|| format!("the {} was executed", script.role_name(role)))
    });
    match defeat {
        Some(reason) => GameEndCheck::ends(Winner::Evil, reason),
        None => check_game_end(seats, script),
    }
}

/// End-of-day check for the final-three rule (the mayor): three players
/// alive, a living untainted final-three role, and nobody executed today.
pub fn check_final_three(seats: &[Seat], script: &Script, executed_today: bool) -> GameEndCheck {
    if executed_today {
        return GameEndCheck::continues();
    }
    let alive: Vec<&Seat> = seats.iter().filter(|s| s.is_alive_player()).collect();
    if alive.len() != 3 {
        return GameEndCheck::continues();
    }
    let winner = alive.iter().find(|s| {
        !s.is_tainted() && holds(s, script, |r| script.has_trait(r, RoleTrait::FinalThreeWin))
    });
    match winner.and_then(|s| s.role_id()) {
        Some(role) => GameEndCheck::ends(
            Winner::Good,
            format!("final three with a living {} and no execution", script.role_name(role)),
        ),
        None => GameEndCheck::continues(),
    }
}
