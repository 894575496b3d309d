/// Shared lookups and builders used by the role processors.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::core::script::{RoleTrait, Script};
use crate::schema::ability::{
    AbilityContext, AbilityError, AutomationLevel, AutomationOption, InputKind, Reading,
    Suggestion, SuggestionKind,
};
use crate::schema::game::GameState;
use crate::schema::seat::{Seat, SeatId, Team};

/// Read-only view of the game a processor evaluates against.
#[derive(Clone, Copy)]
pub struct Grimoire<'a> {
    pub state: &'a GameState,
    pub script: &'a Script,
}

impl<'a> Grimoire<'a> {
    pub fn new(state: &'a GameState, script: &'a Script) -> Self {
        Self { state, script }
    }

    pub fn seat(&self, id: SeatId) -> Option<&'a Seat> {
        self.state.seat(id)
    }

    /// The acting seat, or `SeatNotFound`.
    pub fn actor(&self, id: SeatId) -> Result<&'a Seat, AbilityError> {
        self.seat(id).ok_or(AbilityError::SeatNotFound(id))
    }

    /// A chosen target, or `TargetNotFound`.
    pub fn target(&self, id: SeatId) -> Result<&'a Seat, AbilityError> {
        self.seat(id).ok_or(AbilityError::TargetNotFound(id))
    }

    pub fn team_of(&self, seat: &Seat) -> Option<Team> {
        seat.role_id().and_then(|r| self.script.team_of(r))
    }

    /// Seats with no role, or a role outside the script, are not evil.
    pub fn is_evil(&self, seat: &Seat) -> bool {
        self.team_of(seat).is_some_and(|t| t.is_evil())
    }

    pub fn has_trait(&self, seat: &Seat, t: RoleTrait) -> bool {
        seat.role_id().is_some_and(|r| self.script.has_trait(r, t))
    }

    pub fn role_name(&self, role_id: &'a str) -> &'a str {
        self.script.role_name(role_id)
    }

    pub fn alive_players(&self) -> Vec<&'a Seat> {
        self.state.alive_players().collect()
    }

    /// Living players other than `exclude`.
    pub fn alive_others(&self, exclude: SeatId) -> Vec<&'a Seat> {
        self.state
            .alive_players()
            .filter(|s| s.id != exclude)
            .collect()
    }

    /// Living players of `team`, excluding `exclude`.
    pub fn alive_of_team(&self, team: Team, exclude: SeatId) -> Vec<&'a Seat> {
        self.state
            .alive_players()
            .filter(|s| s.id != exclude && self.team_of(s) == Some(team))
            .collect()
    }

    /// The first living demon, if any.
    pub fn find_demon(&self) -> Option<&'a Seat> {
        self.state
            .alive_players()
            .find(|s| self.team_of(s) == Some(Team::Demon))
    }

    /// Living minions in seat order.
    pub fn minions(&self) -> Vec<&'a Seat> {
        self.state
            .alive_players()
            .filter(|s| self.team_of(s) == Some(Team::Minion))
            .collect()
    }

    /// Nearest living occupied seat in each direction around the circle.
    ///
    /// Dead and empty seats are walked past. Either side is `None` only
    /// when no other living player exists.
    pub fn alive_neighbors(&self, id: SeatId) -> (Option<&'a Seat>, Option<&'a Seat>) {
        let seats = &self.state.seats;
        let n = seats.len();
        let Some(pos) = seats.iter().position(|s| s.id == id) else {
            return (None, None);
        };
        let walk = |step: usize| {
            (1..n)
                .map(|i| &seats[(pos + step * i) % n])
                .find(|s| s.is_alive_player())
        };
        // Walking left by i is walking right by n - i.
        (walk(n - 1), walk(1))
    }

    /// Adjacent pairs of living evil players around the circle.
    pub fn evil_pairs(&self) -> usize {
        let seats = &self.state.seats;
        let n = seats.len();
        if n < 2 {
            return 0;
        }
        let pairs = if n == 2 { 1 } else { n };
        (0..pairs)
            .filter(|&i| {
                let (a, b) = (&seats[i], &seats[(i + 1) % n]);
                a.is_alive_player() && b.is_alive_player() && self.is_evil(a) && self.is_evil(b)
            })
            .count()
    }
}

/// Per-invocation random source. Same seed, same seat, same draws.
pub fn rng_for(ctx: &AbilityContext, seat_id: SeatId) -> StdRng {
    StdRng::seed_from_u64(ctx.seed.wrapping_add(u64::from(seat_id.0) * 7919))
}

/// A number in `0..=max` that differs from `real`.
pub fn fake_count(rng: &mut StdRng, max: usize, real: usize) -> usize {
    let choices: Vec<usize> = (0..=max).filter(|&n| n != real).collect();
    choices.choose(rng).copied().unwrap_or(real)
}

/// Two distinct random seats from `pool`.
pub fn random_pair<'a>(rng: &mut StdRng, pool: &[&'a Seat]) -> Option<(&'a Seat, &'a Seat)> {
    let picked: Vec<&&Seat> = pool.choose_multiple(rng, 2).collect();
    match picked.as_slice() {
        [a, b] => Some((**a, **b)),
        _ => None,
    }
}

/// First seat in `pool` holding one of `preferred`.
pub fn prefer_roles<'a>(pool: &[&'a Seat], preferred: &[&str]) -> Option<&'a Seat> {
    pool.iter()
        .find(|s| s.role_id().is_some_and(|r| preferred.contains(&r)))
        .copied()
}

pub fn pair_text(a: &Seat, b: &Seat, role_name: &str) -> String {
    format!("{} or {} is the {}", a.label(), b.label(), role_name)
}

/// GUIDED menu for handing out information: the suggested text or a
/// storyteller-written override.
pub fn tell_or_override(suggested: &str) -> Vec<AutomationOption> {
    vec![
        AutomationOption::new("recommended", "Use the suggested information", suggested)
            .described(suggested)
            .recommended(true),
        AutomationOption::input(
            "custom",
            "Custom information",
            InputKind::Text,
            "What should the player be told?",
        ),
    ]
}

/// A single-player picker.
pub fn pick_player(id: &str, label: &str, prompt: &str) -> AutomationOption {
    AutomationOption::input(id, label, InputKind::Player, prompt)
}

pub fn team_noun(team: Team) -> &'static str {
    match team {
        Team::Townsfolk => "townsfolk",
        Team::Outsider => "outsiders",
        Team::Minion => "minions",
        Team::Demon => "demons",
    }
}

/// Starts a suggestion for `role_id` at `seat_id`.
///
/// Confirmation defaults to "everything but full-auto", the common case.
pub fn suggest(ctx: &AbilityContext, role_id: &str, seat_id: SeatId, slug: &str) -> SuggestionBuilder {
    SuggestionBuilder {
        id: format!(
            "n{}d{}-{}-{}-{}",
            ctx.night_count, ctx.day_count, role_id, seat_id, slug
        ),
        role_id: role_id.to_string(),
        seat_id,
        title: String::new(),
        description: String::new(),
        priority: 0,
        requires_confirmation: ctx.automation_level != AutomationLevel::FullAuto,
        target_seat_ids: Vec::new(),
    }
}

pub struct SuggestionBuilder {
    id: String,
    role_id: String,
    seat_id: SeatId,
    title: String,
    description: String,
    priority: i32,
    requires_confirmation: bool,
    target_seat_ids: Vec<SeatId>,
}

impl SuggestionBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn confirm(mut self, requires_confirmation: bool) -> Self {
        self.requires_confirmation = requires_confirmation;
        self
    }

    pub fn targets(mut self, targets: &[SeatId]) -> Self {
        self.target_seat_ids = targets.to_vec();
        self
    }

    fn finish(self, kind: SuggestionKind) -> Suggestion {
        Suggestion {
            id: self.id,
            role_id: self.role_id,
            seat_id: self.seat_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            requires_confirmation: self.requires_confirmation,
            target_seat_ids: self.target_seat_ids,
            kind,
        }
    }

    pub fn info(self, reading: Reading) -> Suggestion {
        self.info_with(reading, Vec::new())
    }

    pub fn info_with(self, reading: Reading, options: Vec<AutomationOption>) -> Suggestion {
        self.finish(SuggestionKind::Info { reading, options })
    }

    pub fn action(self, options: Vec<AutomationOption>) -> Suggestion {
        self.finish(SuggestionKind::Action { options })
    }

    pub fn effect(self, reading: Reading) -> Suggestion {
        self.finish(SuggestionKind::Effect { reading })
    }

    pub fn warning(self, reading: Reading, options: Vec<AutomationOption>) -> Suggestion {
        self.finish(SuggestionKind::Warning { reading, options })
    }
}
