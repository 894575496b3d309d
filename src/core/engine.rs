/// The role automation engine: runs processors over a night, folds their
/// intents into pending queues, and applies them to caller-owned seats.
///
/// Built via `RoleAutomationEngine::builder()`. Each engine is owned by one
/// game room; nothing is shared between instances.
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::game_end::{check_final_three, check_game_end, GameEndCheck};
use crate::core::roles::{Grimoire, ProcessorRegistry};
use crate::core::script::{ScriptCatalog, ScriptError};
use crate::schema::ability::{
    AbilityContext, AbilityError, AbilityOutcome, AbilityResult, AutomationLevel, ChainReaction,
    ChainReactionKind, DeathEvent, GameEnd, StatusAction, StatusChange, Suggestion,
};
use crate::schema::game::GameState;
use crate::schema::seat::{Seat, SeatId, Status};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Per-role adjustments to the engine-wide config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleOverride {
    pub level: Option<AutomationLevel>,
    pub disabled: bool,
}

/// Engine configuration. Every field has a default, so a RON file only
/// needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleAutomationConfig {
    pub level: AutomationLevel,
    pub enable_rule_checks: bool,
    /// How many times a host asks before letting the storyteller break a rule.
    pub rule_violation_confirmations: u32,
    pub auto_apply_status_changes: bool,
    pub auto_process_deaths: bool,
    pub role_overrides: FxHashMap<String, RoleOverride>,
}

impl Default for RoleAutomationConfig {
    fn default() -> Self {
        Self {
            level: AutomationLevel::Guided,
            enable_rule_checks: true,
            rule_violation_confirmations: 2,
            auto_apply_status_changes: true,
            auto_process_deaths: false,
            role_overrides: FxHashMap::default(),
        }
    }
}

impl RoleAutomationConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, EngineError> {
        Ok(ron::from_str(input)?)
    }

    /// The level processors for `role_id` run at.
    pub fn level_for(&self, role_id: &str) -> AutomationLevel {
        self.role_overrides
            .get(role_id)
            .and_then(|o| o.level)
            .unwrap_or(self.level)
    }

    pub fn is_disabled(&self, role_id: &str) -> bool {
        self.role_overrides.get(role_id).is_some_and(|o| o.disabled)
    }

    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(level) = update.level {
            self.level = level;
        }
        if let Some(v) = update.enable_rule_checks {
            self.enable_rule_checks = v;
        }
        if let Some(v) = update.rule_violation_confirmations {
            self.rule_violation_confirmations = v;
        }
        if let Some(v) = update.auto_apply_status_changes {
            self.auto_apply_status_changes = v;
        }
        if let Some(v) = update.auto_process_deaths {
            self.auto_process_deaths = v;
        }
        for (role_id, role_override) in update.role_overrides {
            self.role_overrides.insert(role_id, role_override);
        }
    }
}

/// A partial config change; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub level: Option<AutomationLevel>,
    pub enable_rule_checks: Option<bool>,
    pub rule_violation_confirmations: Option<u32>,
    pub auto_apply_status_changes: Option<bool>,
    pub auto_process_deaths: Option<bool>,
    pub role_overrides: FxHashMap<String, RoleOverride>,
}

/// A processor failure recorded inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatFailure {
    pub seat_id: SeatId,
    pub role_id: String,
    pub message: String,
}

/// Everything one batch of processor calls produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightBatch {
    pub suggestions: Vec<Suggestion>,
    pub status_changes: Vec<StatusChange>,
    pub deaths: Vec<DeathEvent>,
    pub chain_reactions: Vec<ChainReaction>,
    pub game_end: Option<GameEnd>,
    pub failures: Vec<SeatFailure>,
}

impl NightBatch {
    pub fn absorb(&mut self, outcome: AbilityOutcome) {
        self.suggestions.extend(outcome.suggestions);
        self.status_changes.extend(outcome.status_changes);
        self.deaths.extend(outcome.deaths);
        self.chain_reactions.extend(outcome.chain_reactions);
        if outcome.game_end.is_some() {
            self.game_end = outcome.game_end;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
            && self.status_changes.is_empty()
            && self.deaths.is_empty()
            && self.chain_reactions.is_empty()
            && self.game_end.is_none()
    }

    /// Stable sort, highest priority first.
    fn sort_by_priority(&mut self) {
        self.suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));
    }
}

/// Seats after deaths were applied, plus who actually died.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDeaths {
    pub seats: Vec<Seat>,
    pub died: Vec<SeatId>,
}

#[derive(Debug, Default)]
struct PendingQueues {
    suggestions: Vec<Suggestion>,
    status_changes: Vec<StatusChange>,
    deaths: Vec<DeathEvent>,
    chain_reactions: Vec<ChainReaction>,
    game_end: Option<GameEnd>,
}

impl PendingQueues {
    fn fold(&mut self, batch: &NightBatch) {
        for suggestion in &batch.suggestions {
            match self.suggestions.iter_mut().find(|s| s.id == suggestion.id) {
                Some(existing) => *existing = suggestion.clone(),
                None => self.suggestions.push(suggestion.clone()),
            }
        }
        self.status_changes.extend(batch.status_changes.iter().cloned());
        self.deaths.extend(batch.deaths.iter().cloned());
        self.chain_reactions
            .extend(batch.chain_reactions.iter().cloned());
        if batch.game_end.is_some() {
            self.game_end = batch.game_end.clone();
        }
    }
}

pub struct RoleAutomationEngine {
    config: RoleAutomationConfig,
    catalog: ScriptCatalog,
    registry: ProcessorRegistry,
    seed: u64,
    generation_count: u64,
    pending: PendingQueues,
}

/// Builder for constructing a `RoleAutomationEngine`.
pub struct RoleAutomationEngineBuilder {
    level: Option<AutomationLevel>,
    seed: u64,
    config: Option<RoleAutomationConfig>,
    config_path: Option<String>,
    scripts_dir: Option<String>,
    /// Directly provided scripts (for testing without files).
    catalog: Option<ScriptCatalog>,
    /// Directly provided processor tables.
    registry: Option<ProcessorRegistry>,
}

impl RoleAutomationEngine {
    pub fn builder() -> RoleAutomationEngineBuilder {
        RoleAutomationEngineBuilder {
            level: None,
            seed: 0,
            config: None,
            config_path: None,
            scripts_dir: None,
            catalog: None,
            registry: None,
        }
    }

    pub fn set_automation_level(&mut self, level: AutomationLevel) {
        info!(?level, "automation level changed");
        self.config.level = level;
    }

    pub fn automation_level(&self) -> AutomationLevel {
        self.config.level
    }

    pub fn config(&self) -> &RoleAutomationConfig {
        &self.config
    }

    pub fn update_config(&mut self, update: ConfigUpdate) {
        self.config.apply(update);
        debug!(level = ?self.config.level, "config updated");
    }

    pub fn catalog(&self) -> &ScriptCatalog {
        &self.catalog
    }

    /// The invocation context a night batch would use for `role_id`.
    pub fn context_for(&self, state: &GameState, role_id: &str) -> AbilityContext {
        AbilityContext::new(
            self.config.level_for(role_id),
            state.round.night_count,
            state.round.day_count,
        )
        .with_seed(self.seed.wrapping_add(self.generation_count))
    }

    /// Run one role's processor for one seat. Nothing is queued; see
    /// `queue_outcome` for hosts that want the result tracked.
    pub fn process_role_ability(
        &self,
        state: &GameState,
        seat_id: SeatId,
        role_id: &str,
        ctx: &AbilityContext,
    ) -> AbilityResult {
        let script_id = &state.current_script_id;
        let script = self
            .catalog
            .get(script_id)
            .map_err(|_| AbilityError::UnsupportedScript(script_id.clone()))?;
        let grimoire = Grimoire::new(state, script);
        self.registry.process(&grimoire, seat_id, role_id, ctx)
    }

    /// Add a single processor outcome to the pending queues.
    pub fn queue_outcome(&mut self, outcome: AbilityOutcome) {
        let mut batch = NightBatch::default();
        batch.absorb(outcome);
        self.pending.fold(&batch);
    }

    /// Process the role at `queue[index]` for every living holder.
    /// An index past the end yields an empty batch.
    pub fn process_night_phase(
        &mut self,
        state: &GameState,
        queue: &[String],
        index: usize,
    ) -> NightBatch {
        let Some(role_id) = queue.get(index) else {
            debug!(index, len = queue.len(), "night index past the queue");
            return NightBatch::default();
        };
        let mut batch = self.run_role(state, role_id);
        batch.sort_by_priority();
        self.pending.fold(&batch);
        self.generation_count += 1;
        batch
    }

    /// Process the whole night queue in one pass.
    pub fn generate_all_night_suggestions(&mut self, state: &GameState) -> NightBatch {
        let mut batch = NightBatch::default();
        for role_id in &state.night_queue {
            let role_batch = self.run_role(state, role_id);
            batch.suggestions.extend(role_batch.suggestions);
            batch.status_changes.extend(role_batch.status_changes);
            batch.deaths.extend(role_batch.deaths);
            batch.chain_reactions.extend(role_batch.chain_reactions);
            batch.failures.extend(role_batch.failures);
            if role_batch.game_end.is_some() {
                batch.game_end = role_batch.game_end;
            }
        }
        batch.sort_by_priority();
        self.pending.fold(&batch);
        self.generation_count += 1;
        info!(
            roles = state.night_queue.len(),
            suggestions = batch.suggestions.len(),
            failures = batch.failures.len(),
            "night resolved"
        );
        batch
    }

    fn run_role(&self, state: &GameState, role_id: &str) -> NightBatch {
        let mut batch = NightBatch::default();
        if self.config.is_disabled(role_id) {
            debug!(role = role_id, "role disabled, skipping");
            return batch;
        }
        let ctx = self.context_for(state, role_id);
        if ctx.automation_level == AutomationLevel::Manual {
            debug!(role = role_id, "manual role, skipping");
            return batch;
        }
        for seat in state.alive_players().filter(|s| s.holds_role(role_id)) {
            match self.process_role_ability(state, seat.id, role_id, &ctx) {
                Ok(outcome) => batch.absorb(outcome),
                Err(e) => {
                    warn!(seat = %seat.id, role = role_id, error = %e, "ability failed");
                    batch.failures.push(SeatFailure {
                        seat_id: seat.id,
                        role_id: role_id.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        debug!(
            role = role_id,
            suggestions = batch.suggestions.len(),
            deaths = batch.deaths.len(),
            "role processed"
        );
        batch
    }

    /// Pending suggestions, highest priority first; ties keep insertion order.
    pub fn get_pending_suggestions(&self) -> Vec<Suggestion> {
        let mut suggestions = self.pending.suggestions.clone();
        suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));
        suggestions
    }

    pub fn get_suggestions_for_seat(&self, seat_id: SeatId) -> Vec<&Suggestion> {
        self.pending
            .suggestions
            .iter()
            .filter(|s| s.seat_id == seat_id)
            .collect()
    }

    /// Remove a suggestion and hand it back to the caller.
    pub fn confirm_suggestion(&mut self, id: &str) -> Option<Suggestion> {
        let pos = self.pending.suggestions.iter().position(|s| s.id == id)?;
        Some(self.pending.suggestions.remove(pos))
    }

    pub fn dismiss_suggestion(&mut self, id: &str) -> bool {
        let before = self.pending.suggestions.len();
        self.pending.suggestions.retain(|s| s.id != id);
        self.pending.suggestions.len() != before
    }

    pub fn clear_pending(&mut self) {
        self.pending = PendingQueues::default();
    }

    pub fn get_pending_deaths(&self) -> &[DeathEvent] {
        &self.pending.deaths
    }

    pub fn get_pending_status_changes(&self) -> &[StatusChange] {
        &self.pending.status_changes
    }

    pub fn get_pending_chain_reactions(&self) -> &[ChainReaction] {
        &self.pending.chain_reactions
    }

    pub fn pending_game_end(&self) -> Option<&GameEnd> {
        self.pending.game_end.as_ref()
    }

    /// Drain pending status changes onto a copy of `seats`.
    pub fn apply_status_changes(&mut self, seats: &[Seat]) -> Vec<Seat> {
        let mut seats = seats.to_vec();
        for change in self.pending.status_changes.drain(..) {
            let Some(seat) = seats.iter_mut().find(|s| s.id == change.seat_id) else {
                warn!(seat = %change.seat_id, "status change for a missing seat");
                continue;
            };
            match change.action {
                StatusAction::Add => {
                    seat.statuses.insert(change.status);
                }
                StatusAction::Remove => {
                    seat.statuses.remove(&change.status);
                }
            }
            debug!(seat = %seat.id, status = change.status.label(), source = %change.source, "status applied");
        }
        seats
    }

    /// Drain pending deaths onto a copy of `seats`. Prevented deaths are
    /// dropped without effect.
    pub fn apply_deaths(&mut self, seats: &[Seat]) -> AppliedDeaths {
        let mut seats = seats.to_vec();
        let mut died = Vec::new();
        for death in self.pending.deaths.drain(..) {
            if death.was_prevented {
                debug!(seat = %death.seat_id, prevented_by = ?death.prevented_by, "death prevented");
                continue;
            }
            if let Some(seat) = seats.iter_mut().find(|s| s.id == death.seat_id) {
                if !seat.is_dead {
                    seat.is_dead = true;
                    died.push(seat.id);
                    info!(seat = %seat.id, cause = ?death.cause, "seat died");
                }
            }
        }
        AppliedDeaths { seats, died }
    }

    /// Drain pending chain reactions. Role transfers rewrite both the real
    /// and the seen role of the target.
    pub fn apply_chain_reactions(&mut self, seats: &[Seat]) -> Vec<Seat> {
        let mut seats = seats.to_vec();
        for reaction in self.pending.chain_reactions.drain(..) {
            let transfers = matches!(
                reaction.kind,
                ChainReactionKind::RoleTransfer | ChainReactionKind::SuccessorTransform
            );
            let (Some(target), Some(new_role)) = (reaction.target_seat_id, &reaction.new_role_id)
            else {
                continue;
            };
            if !transfers {
                continue;
            }
            if let Some(seat) = seats.iter_mut().find(|s| s.id == target) {
                seat.real_role_id = Some(new_role.clone());
                seat.seen_role_id = Some(new_role.clone());
                info!(seat = %target, role = %new_role, "role transferred");
            }
        }
        seats
    }

    /// Dawn cleanup: protection only lasts the night.
    pub fn clear_night_statuses(seats: &[Seat]) -> Vec<Seat> {
        let mut seats = seats.to_vec();
        for seat in &mut seats {
            seat.statuses.remove(&Status::Protected);
        }
        seats
    }

    /// Apply whatever the config marks as automatic.
    pub fn apply_automatic(&mut self, seats: &[Seat]) -> AppliedDeaths {
        let seats = if self.config.auto_apply_status_changes {
            self.apply_status_changes(seats)
        } else {
            seats.to_vec()
        };
        if self.config.auto_process_deaths {
            self.apply_deaths(&seats)
        } else {
            AppliedDeaths {
                seats,
                died: Vec::new(),
            }
        }
    }

    pub fn check_game_end_conditions(&self, state: &GameState) -> Result<GameEndCheck, ScriptError> {
        let script = self.catalog.get(&state.current_script_id)?;
        Ok(check_game_end(&state.seats, script))
    }

    /// End-of-day check: the regular win conditions, then a mayor-style
    /// win when three players are left and nobody was executed.
    pub fn check_day_end(&self, state: &GameState) -> Result<GameEndCheck, ScriptError> {
        let script = self.catalog.get(&state.current_script_id)?;
        let check = check_game_end(&state.seats, script);
        if check.should_end {
            return Ok(check);
        }
        Ok(check_final_three(&state.seats, script, state.daily_execution_completed))
    }
}

impl RoleAutomationEngineBuilder {
    pub fn level(mut self, level: AutomationLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(mut self, config: RoleAutomationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn scripts_dir(mut self, path: &str) -> Self {
        self.scripts_dir = Some(path.to_string());
        self
    }

    /// Provide scripts directly (for testing without files).
    pub fn with_catalog(mut self, catalog: ScriptCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_processors(mut self, registry: ProcessorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<RoleAutomationEngine, EngineError> {
        let mut config = self.config.unwrap_or_default();
        if let Some(ref path) = self.config_path {
            if Path::new(path).exists() {
                config = RoleAutomationConfig::load_from_ron(Path::new(path))?;
            }
        }
        if let Some(level) = self.level {
            config.level = level;
        }

        // Built-ins first; provided and loaded scripts override by id.
        let mut catalog = ScriptCatalog::builtin()?;
        if let Some(provided) = self.catalog {
            catalog.merge(provided);
        }
        if let Some(ref dir) = self.scripts_dir {
            if Path::new(dir).exists() {
                catalog.merge(ScriptCatalog::load_dir(Path::new(dir))?);
            }
        }

        info!(scripts = catalog.len(), level = ?config.level, "engine built");
        Ok(RoleAutomationEngine {
            config,
            catalog,
            registry: self.registry.unwrap_or_default(),
            seed: self.seed,
            generation_count: 0,
            pending: PendingQueues::default(),
        })
    }
}
