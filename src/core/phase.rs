/// Game phase state machine.
///
/// States run `Setup -> Night -> Day -> Voting -> GameOver`. Night has an
/// automatic exit: after every event the machine checks whether the night
/// queue is exhausted and, if so, moves straight to day.
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::night_queue::calculate_night_queue;
use crate::core::script::Script;
use crate::schema::game::{GameOver, GameState, Phase, RoundInfo, Winner};
use crate::schema::seat::{Seat, SeatId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhaseEvent {
    StartGame(Vec<Seat>),
    NextNightAction,
    PrevNightAction,
    EndNight,
    StartVoting(SeatId),
    StartNight,
    CloseVote,
    EndGame { winner: Winner, reason: String },
}

impl PhaseEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PhaseEvent::StartGame(_) => "START_GAME",
            PhaseEvent::NextNightAction => "NEXT_NIGHT_ACTION",
            PhaseEvent::PrevNightAction => "PREV_NIGHT_ACTION",
            PhaseEvent::EndNight => "END_NIGHT",
            PhaseEvent::StartVoting(_) => "START_VOTING",
            PhaseEvent::StartNight => "START_NIGHT",
            PhaseEvent::CloseVote => "CLOSE_VOTE",
            PhaseEvent::EndGame { .. } => "END_GAME",
        }
    }
}

/// What an event did to the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// The phase changed.
    Taken,
    /// Accepted, but the phase stayed the same (or the event does not apply
    /// in this phase).
    Stayed,
    /// A guard refused the event.
    Rejected(String),
}

pub struct PhaseMachine {
    script: Script,
    state: GameState,
}

impl PhaseMachine {
    pub fn new(script: Script) -> Self {
        let state = GameState::new(&script.id, Vec::new());
        Self { script, state }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct access for the voting resolver and for applying engine intents.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn round(&self) -> RoundInfo {
        self.state.round
    }

    pub fn night_queue(&self) -> &[String] {
        &self.state.night_queue
    }

    /// The role whose turn it is, once the first action has been advanced to.
    pub fn current_night_role(&self) -> Option<&str> {
        let index = usize::try_from(self.state.night_current_index).ok()?;
        self.state.night_queue.get(index).map(|r| r.as_str())
    }

    /// Replace the seats, e.g. after the host applied deaths, so the next
    /// night queue only lists living holders.
    pub fn update_seats(&mut self, seats: Vec<Seat>) {
        self.state.seats = seats;
    }

    pub fn send(&mut self, event: PhaseEvent) -> Transition {
        let name = event.name();
        let before = self.state.phase;
        let transition = match (before, event) {
            (Phase::GameOver, _) => Transition::Rejected("the game is over".to_string()),
            (Phase::Setup, PhaseEvent::StartGame(seats)) => {
                self.start_game(seats);
                Transition::Taken
            }
            (Phase::Night, PhaseEvent::NextNightAction) => {
                self.state.night_current_index += 1;
                Transition::Stayed
            }
            (Phase::Night, PhaseEvent::PrevNightAction) => {
                if self.state.night_current_index > 0 {
                    self.state.night_current_index -= 1;
                }
                Transition::Stayed
            }
            (Phase::Night, PhaseEvent::EndNight) => {
                self.start_day_phase();
                Transition::Taken
            }
            (Phase::Day, PhaseEvent::StartVoting(nominee)) => {
                if self.state.is_over() {
                    Transition::Rejected("the game is over".to_string())
                } else {
                    debug!(nominee = %nominee, "voting started");
                    self.state.phase = Phase::Voting;
                    Transition::Taken
                }
            }
            (Phase::Day, PhaseEvent::StartNight) => {
                self.start_night_phase();
                Transition::Taken
            }
            (Phase::Voting, PhaseEvent::CloseVote) => {
                self.state.phase = Phase::Day;
                self.state.voting = None;
                Transition::Taken
            }
            (Phase::Day | Phase::Voting, PhaseEvent::EndGame { winner, reason }) => {
                info!(?winner, reason = %reason, "game over");
                self.state.game_over = Some(GameOver { winner, reason });
                self.state.phase = Phase::GameOver;
                Transition::Taken
            }
            _ => Transition::Stayed,
        };

        let transition = match (transition, self.advance_if_night_done()) {
            (Transition::Stayed, true) => Transition::Taken,
            (t, _) => t,
        };
        match &transition {
            Transition::Rejected(reason) => debug!(event = name, reason = %reason, "event rejected"),
            _ => debug!(event = name, from = ?before, to = ?self.state.phase, "event handled"),
        }
        transition
    }

    fn start_game(&mut self, seats: Vec<Seat>) {
        self.state.round = RoundInfo {
            day_count: 0,
            night_count: 1,
            nomination_count: 0,
            total_rounds: 1,
        };
        self.state.night_queue = calculate_night_queue(&seats, true, &self.script);
        self.state.seats = seats;
        self.state.night_current_index = -1;
        self.state.game_over = None;
        self.state.phase = Phase::Night;
        info!(queue = self.state.night_queue.len(), "game started");
    }

    fn start_night_phase(&mut self) {
        self.state.round.night_count += 1;
        self.state.round.total_rounds += 1;
        // Only START_GAME builds a first-night queue.
        let is_first_night = self.state.round.night_count == 0;
        self.state.night_queue =
            calculate_night_queue(&self.state.seats, is_first_night, &self.script);
        self.state.night_current_index = -1;
        self.state.voting = None;
        self.state.phase = Phase::Night;
        debug!(night = self.state.round.night_count, queue = self.state.night_queue.len(), "night started");
    }

    fn start_day_phase(&mut self) {
        self.state.round.day_count += 1;
        self.state.round.total_rounds += 1;
        self.state.night_current_index = -1;
        self.state.daily_nominations.clear();
        self.state.daily_execution_completed = false;
        self.state.phase = Phase::Day;
        debug!(day = self.state.round.day_count, "day started");
    }

    /// The night's always-transition. Returns whether it fired.
    fn advance_if_night_done(&mut self) -> bool {
        if self.state.phase != Phase::Night {
            return false;
        }
        let next = i64::from(self.state.night_current_index) + 1;
        if next >= self.state.night_queue.len() as i64 {
            self.start_day_phase();
            return true;
        }
        false
    }
}
