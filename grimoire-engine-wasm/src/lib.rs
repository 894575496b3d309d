//! WASM bindings for grimoire-engine, powering the browser storyteller tools.

use wasm_bindgen::prelude::*;

use grimoire_engine::core::engine::RoleAutomationEngine;
use grimoire_engine::core::phase::{PhaseEvent, PhaseMachine};
use grimoire_engine::core::voting::{ExecutionMode, VotingResolver, VotingRules};
use grimoire_engine::schema::ability::{AdditionalData, AutomationLevel};
use grimoire_engine::schema::seat::{Seat, SeatId};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct AbilityInput {
    #[serde(default)]
    targets: Vec<u32>,
    #[serde(default)]
    additional: AdditionalData,
}

#[derive(serde::Serialize)]
struct TransitionInfo {
    transition: String,
    phase: String,
}

#[derive(serde::Serialize)]
struct AppliedInfo {
    died: Vec<u32>,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn parse_level(s: &str) -> Result<AutomationLevel, JsError> {
    match s.to_uppercase().as_str() {
        "FULL_AUTO" => Ok(AutomationLevel::FullAuto),
        "GUIDED" => Ok(AutomationLevel::Guided),
        "MANUAL" => Ok(AutomationLevel::Manual),
        other => Err(JsError::new(&format!("Unknown automation level: {other}"))),
    }
}

fn parse_execution_mode(s: &str) -> ExecutionMode {
    match s {
        "immediate" => ExecutionMode::Immediate,
        _ => ExecutionMode::OnTheBlock,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// GrimoireSession: one game room
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct GrimoireSession {
    engine: RoleAutomationEngine,
    machine: PhaseMachine,
    rules: VotingRules,
}

#[wasm_bindgen]
impl GrimoireSession {
    /// Create a session for a built-in script.
    #[wasm_bindgen(constructor)]
    pub fn new(script_id: &str, level: &str, seed: u64) -> Result<GrimoireSession, JsError> {
        let engine = RoleAutomationEngine::builder()
            .level(parse_level(level)?)
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        let script = engine
            .catalog()
            .get(script_id)
            .map_err(|e| JsError::new(&e.to_string()))?
            .clone();
        Ok(GrimoireSession {
            engine,
            machine: PhaseMachine::new(script),
            rules: VotingRules::default(),
        })
    }

    /// Return JSON array of available script ids.
    pub fn available_scripts(&self) -> Result<String, JsError> {
        to_json(&self.engine.catalog().ids())
    }

    pub fn set_automation_level(&mut self, level: &str) -> Result<(), JsError> {
        self.engine.set_automation_level(parse_level(level)?);
        Ok(())
    }

    /// `"on_the_block"` (default) or `"immediate"`.
    pub fn set_execution_mode(&mut self, mode: &str) {
        self.rules.execution_mode = parse_execution_mode(mode);
    }

    /// Start the game with a JSON array of seats.
    pub fn start_game(&mut self, seats_json: &str) -> Result<String, JsError> {
        let seats: Vec<Seat> = serde_json::from_str(seats_json)
            .map_err(|e| JsError::new(&format!("Invalid seats JSON: {e}")))?;
        self.send(PhaseEvent::StartGame(seats))
    }

    /// Send a phase event, e.g. `"NextNightAction"` or
    /// `{"EndGame": {"winner": "GOOD", "reason": "..."}}`.
    pub fn send_event(&mut self, event_json: &str) -> Result<String, JsError> {
        let event: PhaseEvent = serde_json::from_str(event_json)
            .map_err(|e| JsError::new(&format!("Invalid event JSON: {e}")))?;
        self.send(event)
    }

    /// The full game snapshot as JSON.
    pub fn state(&self) -> Result<String, JsError> {
        to_json(self.machine.state())
    }

    /// Run every role in the current night queue. Returns the batch as JSON.
    pub fn run_night(&mut self) -> Result<String, JsError> {
        let batch = self
            .engine
            .generate_all_night_suggestions(self.machine.state());
        to_json(&batch)
    }

    /// Run the current night action only.
    pub fn run_current_action(&mut self) -> Result<String, JsError> {
        let state = self.machine.state();
        let index = usize::try_from(state.night_current_index).unwrap_or(0);
        let batch = self
            .engine
            .process_night_phase(state, &state.night_queue, index);
        to_json(&batch)
    }

    /// Run one ability with player input, queueing its intents.
    ///
    /// Expected JSON shape: `{"targets": [3], "additional": {...}}`.
    pub fn process_ability(
        &mut self,
        seat_id: u32,
        role_id: &str,
        input_json: &str,
    ) -> Result<String, JsError> {
        let input: AbilityInput = serde_json::from_str(input_json)
            .map_err(|e| JsError::new(&format!("Invalid ability JSON: {e}")))?;
        let state = self.machine.state();
        let ctx = self
            .engine
            .context_for(state, role_id)
            .with_targets(&input.targets)
            .with_additional(input.additional);
        let outcome = self
            .engine
            .process_role_ability(state, SeatId(seat_id), role_id, &ctx)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let json = to_json(&outcome)?;
        self.engine.queue_outcome(outcome);
        Ok(json)
    }

    pub fn pending_suggestions(&self) -> Result<String, JsError> {
        to_json(&self.engine.get_pending_suggestions())
    }

    /// Remove a suggestion; returns it as JSON, or `null` if unknown.
    pub fn confirm_suggestion(&mut self, id: &str) -> Result<String, JsError> {
        to_json(&self.engine.confirm_suggestion(id))
    }

    pub fn dismiss_suggestion(&mut self, id: &str) -> bool {
        self.engine.dismiss_suggestion(id)
    }

    pub fn clear_pending(&mut self) {
        self.engine.clear_pending();
    }

    /// Apply every pending status change, death and role transfer to the
    /// game. Returns the seats that died.
    pub fn apply_pending(&mut self) -> Result<String, JsError> {
        let seats = self
            .engine
            .apply_status_changes(&self.machine.state().seats);
        let applied = self.engine.apply_deaths(&seats);
        let seats = self.engine.apply_chain_reactions(&applied.seats);
        self.machine.update_seats(seats);
        to_json(&AppliedInfo {
            died: applied.died.iter().map(|id| id.0).collect(),
        })
    }

    /// Remove night-only statuses at dawn.
    pub fn clear_night_statuses(&mut self) {
        let seats = RoleAutomationEngine::clear_night_statuses(&self.machine.state().seats);
        self.machine.update_seats(seats);
    }

    /// Open a vote. Returns tolerated rule violations as a JSON array.
    pub fn start_vote(&mut self, nominator: Option<u32>, nominee: u32) -> Result<String, JsError> {
        let level = self.engine.automation_level();
        let script = self
            .engine
            .catalog()
            .get(&self.machine.state().current_script_id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let resolver = VotingResolver::new(script, self.rules);
        let warnings = resolver
            .start_vote(
                self.machine.state_mut(),
                nominator.map(SeatId),
                SeatId(nominee),
                level,
            )
            .map_err(|e| JsError::new(&e.to_string()))?;
        let messages: Vec<String> = warnings.iter().map(|w| w.to_string()).collect();
        to_json(&messages)
    }

    /// Toggle a hand; returns whether it is now raised.
    pub fn toggle_hand(&mut self, seat_id: u32) -> Result<bool, JsError> {
        let script = self
            .engine
            .catalog()
            .get(&self.machine.state().current_script_id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        VotingResolver::new(script, self.rules)
            .toggle_hand(self.machine.state_mut(), SeatId(seat_id))
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn next_clock_hand(&mut self) -> Option<u32> {
        let script = self
            .engine
            .catalog()
            .get(&self.machine.state().current_script_id)
            .ok()?;
        VotingResolver::new(script, self.rules)
            .next_clock_hand(self.machine.state_mut())
            .map(|id| id.0)
    }

    /// Close the open vote. Returns the vote record as JSON.
    pub fn close_vote(&mut self) -> Result<String, JsError> {
        let script = self
            .engine
            .catalog()
            .get(&self.machine.state().current_script_id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let record = VotingResolver::new(script, self.rules)
            .close_vote(self.machine.state_mut())
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&record)
    }

    /// Execute whoever is on the block at the end of the day.
    pub fn resolve_daily_execution(&mut self) -> Option<u32> {
        let script = self
            .engine
            .catalog()
            .get(&self.machine.state().current_script_id)
            .ok()?;
        VotingResolver::new(script, self.rules)
            .resolve_daily_execution(self.machine.state_mut())
            .map(|id| id.0)
    }

    pub fn check_game_end(&self) -> Result<String, JsError> {
        let check = self
            .engine
            .check_game_end_conditions(self.machine.state())
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&check)
    }

    /// Game-end check for the end of the day, including the final three.
    pub fn check_day_end(&self) -> Result<String, JsError> {
        let check = self
            .engine
            .check_day_end(self.machine.state())
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&check)
    }
}

// Private helpers
impl GrimoireSession {
    fn send(&mut self, event: PhaseEvent) -> Result<String, JsError> {
        let transition = self.machine.send(event);
        to_json(&TransitionInfo {
            transition: format!("{transition:?}"),
            phase: format!("{:?}", self.machine.phase()),
        })
    }
}
