/// Nominations, hand raising and execution.
///
/// The resolver mutates the host's `GameState` directly: voting is driven
/// by the storyteller in real time, and the vote record it writes is the
/// authoritative history.
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::script::{RoleTrait, Script};
use crate::schema::ability::AutomationLevel;
use crate::schema::game::{GameState, Nomination, Phase, VoteRecord, VoteResult, VotingState};
use crate::schema::seat::{Seat, SeatId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("the game is over")]
    GameOver,
    #[error("nominations only happen during the day")]
    NotDay,
    #[error("a vote is already open")]
    AlreadyOpen,
    #[error("no vote is open")]
    NoOpenVote,
    #[error("nominee seat {0} does not exist")]
    NomineeNotFound(SeatId),
    #[error("nominee seat {0} is empty")]
    NomineeEmpty(SeatId),
    #[error("nominee seat {0} is dead")]
    NomineeDead(SeatId),
    #[error("nominator seat {0} does not exist")]
    NominatorNotFound(SeatId),
    #[error("nominator seat {0} cannot nominate")]
    NominatorIneligible(SeatId),
    #[error("today's execution already happened")]
    ExecutionCompleted,
    #[error("seat {0} was already nominated today")]
    AlreadyNominated(SeatId),
    #[error("seat {0} already nominated today")]
    NominationSpent(SeatId),
    #[error("seat {0} does not exist")]
    SeatNotFound(SeatId),
    #[error("seat {0} cannot vote")]
    CannotVote(SeatId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// The day's highest qualifying vote goes on the block; the execution
    /// happens at `resolve_daily_execution`.
    #[default]
    OnTheBlock,
    /// A vote meeting the threshold executes at once.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingRules {
    pub execution_mode: ExecutionMode,
}

/// `ceil(alive / 2)`, or zero while a ghost-vote bypass role lives.
pub fn required_votes(alive: usize, bypass_alive: bool) -> u32 {
    if bypass_alive {
        0
    } else {
        alive.div_ceil(2) as u32
    }
}

/// Zero votes never execute.
pub fn meets_threshold(votes: u32, required: u32) -> bool {
    votes > 0 && votes >= required
}

pub struct VotingResolver<'a> {
    script: &'a Script,
    rules: VotingRules,
}

impl<'a> VotingResolver<'a> {
    pub fn new(script: &'a Script, rules: VotingRules) -> Self {
        Self { script, rules }
    }

    fn has_bypass(&self, seat: &Seat) -> bool {
        seat.role_id()
            .is_some_and(|r| self.script.has_trait(r, RoleTrait::GhostVoteBypass))
    }

    /// Whether a living seat holds a ghost-vote bypass role.
    pub fn bypass_alive(&self, state: &GameState) -> bool {
        state.alive_players().any(|s| self.has_bypass(s))
    }

    /// Open a vote on `nominee`.
    ///
    /// Missing seats and an already open vote are always errors. Other rule
    /// violations depend on `level`: FULL_AUTO rejects the first one,
    /// GUIDED lets the vote start and returns them as warnings, MANUAL
    /// ignores them.
    pub fn start_vote(
        &self,
        state: &mut GameState,
        nominator: Option<SeatId>,
        nominee: SeatId,
        level: AutomationLevel,
    ) -> Result<Vec<VoteError>, VoteError> {
        if state.is_over() {
            return Err(VoteError::GameOver);
        }
        if state.voting.as_ref().is_some_and(|v| v.is_open) {
            return Err(VoteError::AlreadyOpen);
        }
        let nominee_seat = state.seat(nominee).ok_or(VoteError::NomineeNotFound(nominee))?;
        let nominator_seat = match nominator {
            Some(id) => Some(state.seat(id).ok_or(VoteError::NominatorNotFound(id))?),
            None => None,
        };

        let day = state.round.day_count;
        let mut violations = Vec::new();
        // A host may move the phase machine to Voting before opening the vote.
        if !matches!(state.phase, Phase::Day | Phase::Voting) {
            violations.push(VoteError::NotDay);
        }
        if !nominee_seat.is_occupied() {
            violations.push(VoteError::NomineeEmpty(nominee));
        } else if nominee_seat.is_dead {
            violations.push(VoteError::NomineeDead(nominee));
        }
        if let Some(seat) = nominator_seat {
            if !seat.is_alive_player() {
                violations.push(VoteError::NominatorIneligible(seat.id));
            }
        }
        if state.daily_execution_completed {
            violations.push(VoteError::ExecutionCompleted);
        }
        let today = |n: &&Nomination| n.round == day;
        if state
            .daily_nominations
            .iter()
            .filter(today)
            .any(|n| n.nominee_seat_id == nominee.0 as i32)
        {
            violations.push(VoteError::AlreadyNominated(nominee));
        }
        if let Some(id) = nominator {
            if state
                .daily_nominations
                .iter()
                .filter(today)
                .any(|n| n.nominator_seat_id == id.0 as i32)
            {
                violations.push(VoteError::NominationSpent(id));
            }
        }

        let tolerated = match level {
            AutomationLevel::FullAuto => {
                if let Some(first) = violations.into_iter().next() {
                    debug!(nominee = %nominee, error = %first, "nomination rejected");
                    return Err(first);
                }
                Vec::new()
            }
            AutomationLevel::Guided => {
                for v in &violations {
                    warn!(nominee = %nominee, violation = %v, "nomination breaks a rule");
                }
                violations
            }
            AutomationLevel::Manual => Vec::new(),
        };

        state.voting = Some(VotingState {
            nominator_seat_id: nominator,
            nominee_seat_id: nominee,
            clock_hand_seat_id: Some(nominee),
            votes: Vec::new(),
            ghost_votes_spent: Vec::new(),
            is_open: true,
        });
        state.phase = Phase::Voting;
        let nominee_value = nominee.0 as i32;
        if !state
            .daily_nominations
            .iter()
            .any(|n| n.round == day && n.nominee_seat_id == nominee_value)
        {
            state.daily_nominations.push(Nomination {
                round: day,
                nominator_seat_id: SeatId::record_value(nominator),
                nominee_seat_id: nominee_value,
            });
        }
        state.round.nomination_count += 1;
        info!(nominee = %nominee, nominator = SeatId::record_value(nominator), "vote opened");
        Ok(tolerated)
    }

    /// Raise or lower `seat_id`'s hand. Returns whether the hand is now up.
    ///
    /// While a bypass role lives, only dead seats and the bypass holder may
    /// vote, and ghost votes are not spent. Otherwise a dead seat needs an
    /// unspent ghost vote, which raising spends and lowering gives back.
    pub fn toggle_hand(&self, state: &mut GameState, seat_id: SeatId) -> Result<bool, VoteError> {
        let bypass = self.bypass_alive(state);
        let seat = state.seat(seat_id).ok_or(VoteError::SeatNotFound(seat_id))?;
        let (occupied, dead, has_ghost_vote, holds_bypass) = (
            seat.is_occupied(),
            seat.is_dead,
            seat.has_ghost_vote,
            self.has_bypass(seat),
        );
        let voting = match state.voting.as_mut() {
            Some(v) if v.is_open => v,
            _ => return Err(VoteError::NoOpenVote),
        };

        if let Some(pos) = voting.votes.iter().position(|&v| v == seat_id) {
            voting.votes.remove(pos);
            let refund = voting.ghost_votes_spent.contains(&seat_id);
            voting.ghost_votes_spent.retain(|&v| v != seat_id);
            if refund {
                if let Some(seat) = state.seat_mut(seat_id) {
                    seat.has_ghost_vote = true;
                }
            }
            debug!(seat = %seat_id, refund, "hand lowered");
            return Ok(false);
        }

        if !occupied {
            return Err(VoteError::CannotVote(seat_id));
        }
        if bypass && !dead && !holds_bypass {
            return Err(VoteError::CannotVote(seat_id));
        }
        if !bypass && dead && !has_ghost_vote {
            return Err(VoteError::CannotVote(seat_id));
        }
        voting.votes.push(seat_id);
        let spends = dead && !bypass;
        if spends {
            voting.ghost_votes_spent.push(seat_id);
            if let Some(seat) = state.seat_mut(seat_id) {
                seat.has_ghost_vote = false;
            }
        }
        debug!(seat = %seat_id, ghost_vote = spends, "hand raised");
        Ok(true)
    }

    /// Move the clock hand one seat clockwise.
    pub fn next_clock_hand(&self, state: &mut GameState) -> Option<SeatId> {
        let count = state.seats.len();
        let voting = state.voting.as_mut()?;
        let current = voting.clock_hand_seat_id?;
        let pos = state.seats.iter().position(|s| s.id == current)?;
        let next = state.seats.get((pos + 1) % count)?.id;
        voting.clock_hand_seat_id = Some(next);
        Some(next)
    }

    /// Close the open vote, record it and return to the day.
    pub fn close_vote(&self, state: &mut GameState) -> Result<VoteRecord, VoteError> {
        let voting = match state.voting.take() {
            Some(v) if v.is_open => v,
            other => {
                state.voting = other;
                return Err(VoteError::NoOpenVote);
            }
        };
        let bypass = self.bypass_alive(state);
        let votes: Vec<SeatId> = if bypass {
            voting
                .votes
                .iter()
                .copied()
                .filter(|&id| {
                    state
                        .seat(id)
                        .is_some_and(|s| s.is_dead || self.has_bypass(s))
                })
                .collect()
        } else {
            voting.votes.clone()
        };
        let count = votes.len() as u32;
        let required = required_votes(state.alive_count(), bypass);
        let nominee = voting.nominee_seat_id;
        let nominee_dead = state.seat(nominee).map_or(true, |s| s.is_dead);
        let day = state.round.day_count;

        let result = if nominee_dead {
            VoteResult::Cancelled
        } else if !meets_threshold(count, required) {
            VoteResult::Survived
        } else {
            match self.rules.execution_mode {
                ExecutionMode::Immediate => {
                    if let Some(seat) = state.seat_mut(nominee) {
                        seat.is_dead = true;
                    }
                    state.daily_execution_completed = true;
                    VoteResult::Executed
                }
                ExecutionMode::OnTheBlock => {
                    self.place_on_block(state, count, required, bypass, day)
                }
            }
        };

        let record = VoteRecord {
            round: day,
            nominator_seat_id: SeatId::record_value(voting.nominator_seat_id),
            nominee_seat_id: SeatId::record_value(Some(nominee)),
            votes,
            vote_count: count,
            result,
        };
        state.vote_history.push(record.clone());
        state.phase = Phase::Day;
        info!(nominee = %nominee, votes = count, required, result = ?result, "vote closed");
        Ok(record)
    }

    fn place_on_block(
        &self,
        state: &mut GameState,
        count: u32,
        required: u32,
        bypass: bool,
        day: u32,
    ) -> VoteResult {
        let leading = state
            .vote_history
            .iter()
            .filter(|r| r.round == day && r.result != VoteResult::Cancelled)
            .filter(|r| bypass || r.vote_count >= required)
            .map(|r| r.vote_count)
            .max()
            .unwrap_or(0);
        let contenders = |r: &&mut VoteRecord| {
            r.round == day && matches!(r.result, VoteResult::OnTheBlock | VoteResult::Tied)
        };

        if count > leading {
            for record in state.vote_history.iter_mut().filter(contenders) {
                record.result = VoteResult::Survived;
            }
            VoteResult::OnTheBlock
        } else if count == leading {
            for record in state
                .vote_history
                .iter_mut()
                .filter(contenders)
                .filter(|r| r.vote_count == leading)
            {
                record.result = VoteResult::Tied;
            }
            VoteResult::Tied
        } else {
            VoteResult::Survived
        }
    }

    /// End-of-day execution: the single player on the block dies. A tie or
    /// an empty block executes nobody.
    pub fn resolve_daily_execution(&self, state: &mut GameState) -> Option<SeatId> {
        let day = state.round.day_count;
        let mut on_block = state
            .vote_history
            .iter_mut()
            .filter(|r| r.round == day && r.result == VoteResult::OnTheBlock);
        let record = on_block.next()?;
        if on_block.next().is_some() {
            return None;
        }
        record.result = VoteResult::Executed;
        let executed = record.nominee()?;
        if let Some(seat) = state.seat_mut(executed) {
            seat.is_dead = true;
        }
        state.daily_execution_completed = true;
        info!(seat = %executed, "daily execution");
        Some(executed)
    }
}
