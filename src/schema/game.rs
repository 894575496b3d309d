/// Game snapshot, round counters and voting records.
use serde::{Deserialize, Serialize};

use super::seat::{Seat, SeatId};

/// The coarse game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Setup,
    Night,
    Day,
    Voting,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    Good,
    Evil,
}

/// Round bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundInfo {
    pub day_count: u32,
    pub night_count: u32,
    pub nomination_count: u32,
    pub total_rounds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub winner: Winner,
    pub reason: String,
}

/// The nomination currently being voted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingState {
    pub nominator_seat_id: Option<SeatId>,
    pub nominee_seat_id: SeatId,
    pub clock_hand_seat_id: Option<SeatId>,
    /// Seats with a raised hand, in the order they raised it.
    pub votes: Vec<SeatId>,
    /// Dead seats that spent their ghost vote during this nomination.
    #[serde(default)]
    pub ghost_votes_spent: Vec<SeatId>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteResult {
    Executed,
    Survived,
    Cancelled,
    OnTheBlock,
    Tied,
}

/// An entry in vote history. Seat ids of `-1` mean "no seat".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub round: u32,
    pub nominator_seat_id: i32,
    pub nominee_seat_id: i32,
    pub votes: Vec<SeatId>,
    pub vote_count: u32,
    pub result: VoteResult,
}

impl VoteRecord {
    pub fn nominee(&self) -> Option<SeatId> {
        u32::try_from(self.nominee_seat_id).ok().map(SeatId)
    }

    pub fn nominator(&self) -> Option<SeatId> {
        u32::try_from(self.nominator_seat_id).ok().map(SeatId)
    }
}

/// One nomination made today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nomination {
    pub round: u32,
    pub nominator_seat_id: i32,
    pub nominee_seat_id: i32,
}

/// The host-owned game snapshot handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub current_script_id: String,
    #[serde(default)]
    pub phase: Phase,
    pub seats: Vec<Seat>,
    #[serde(default)]
    pub round: RoundInfo,
    #[serde(default)]
    pub night_queue: Vec<String>,
    #[serde(default = "default_night_index")]
    pub night_current_index: i32,
    #[serde(default)]
    pub vote_history: Vec<VoteRecord>,
    #[serde(default)]
    pub daily_nominations: Vec<Nomination>,
    #[serde(default)]
    pub voting: Option<VotingState>,
    #[serde(default)]
    pub daily_execution_completed: bool,
    #[serde(default)]
    pub game_over: Option<GameOver>,
}

fn default_night_index() -> i32 {
    -1
}

impl GameState {
    pub fn new(script_id: &str, seats: Vec<Seat>) -> Self {
        Self {
            current_script_id: script_id.to_string(),
            phase: Phase::Setup,
            seats,
            round: RoundInfo::default(),
            night_queue: Vec::new(),
            night_current_index: -1,
            vote_history: Vec::new(),
            daily_nominations: Vec::new(),
            voting: None,
            daily_execution_completed: false,
            game_over: None,
        }
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    pub fn seat_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id == id)
    }

    /// Occupied, living seats.
    pub fn alive_players(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.is_alive_player())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_players().count()
    }

    pub fn is_over(&self) -> bool {
        self.game_over.is_some()
    }
}
