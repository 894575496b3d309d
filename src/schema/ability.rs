/// Ability invocation inputs and outputs.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::game::Winner;
use super::seat::{SeatId, Status};

/// How much the engine decides on the storyteller's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationLevel {
    /// The engine decides and pre-computes every choice.
    FullAuto,
    /// The engine suggests, the storyteller confirms.
    #[default]
    Guided,
    /// The engine stays silent during night batches.
    Manual,
}

/// Per-role extras supplied by the host alongside an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default)]
    pub nominator_seat_id: Option<SeatId>,
    #[serde(default)]
    pub executed_seat_id: Option<SeatId>,
    #[serde(default)]
    pub new_demon_seat_id: Option<SeatId>,
    #[serde(default)]
    pub red_herring_seat_id: Option<SeatId>,
    #[serde(default)]
    pub demon_died: bool,
    #[serde(default)]
    pub is_being_executed: bool,
}

/// Per-invocation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityContext {
    pub automation_level: AutomationLevel,
    pub is_first_night: bool,
    pub night_count: u32,
    pub day_count: u32,
    /// Player-chosen targets; empty when nothing has been chosen yet.
    #[serde(default)]
    pub target_seat_ids: Vec<SeatId>,
    #[serde(default)]
    pub additional: AdditionalData,
    /// Seed for any randomized choice the processor makes.
    #[serde(default)]
    pub seed: u64,
}

impl AbilityContext {
    pub fn new(automation_level: AutomationLevel, night_count: u32, day_count: u32) -> Self {
        Self {
            automation_level,
            is_first_night: night_count == 1,
            night_count,
            day_count,
            target_seat_ids: Vec::new(),
            additional: AdditionalData::default(),
            seed: 0,
        }
    }

    pub fn with_targets(mut self, targets: &[u32]) -> Self {
        self.target_seat_ids = targets.iter().copied().map(SeatId).collect();
        self
    }

    pub fn with_additional(mut self, additional: AdditionalData) -> Self {
        self.additional = additional;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn is_full_auto(&self) -> bool {
        self.automation_level == AutomationLevel::FullAuto
    }

    pub fn is_guided(&self) -> bool {
        self.automation_level == AutomationLevel::Guided
    }
}

/// What a player-facing result says versus what is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Player-facing text; may be false when the actor is tainted.
    pub suggested: String,
    /// Storyteller-only ground truth.
    #[serde(default)]
    pub real: Option<String>,
    #[serde(default)]
    pub tainted: bool,
}

impl Reading {
    pub fn truthful(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            suggested: text.clone(),
            real: Some(text),
            tainted: false,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            suggested: text.into(),
            real: None,
            tainted: false,
        }
    }

    pub fn tainted(suggested: impl Into<String>, real: impl Into<String>) -> Self {
        Self {
            suggested: suggested.into(),
            real: Some(real.into()),
            tainted: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Player,
    Players,
    Role,
    Text,
    Number,
}

/// Extra input an option needs before it can be chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRequest {
    pub kind: InputKind,
    pub prompt: String,
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}

/// One entry of a choice menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_recommended: bool,
    pub result: String,
    #[serde(default)]
    pub requires_input: Option<InputRequest>,
}

impl AutomationOption {
    pub fn new(id: &str, label: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            label: label.into(),
            description: None,
            is_recommended: false,
            result: result.into(),
            requires_input: None,
        }
    }

    /// An option that asks the storyteller for a player, players, role or text.
    pub fn input(id: &str, label: impl Into<String>, kind: InputKind, prompt: &str) -> Self {
        Self {
            requires_input: Some(InputRequest {
                kind,
                prompt: prompt.to_string(),
                min: None,
                max: None,
            }),
            ..Self::new(id, label, "")
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn recommended(mut self, recommended: bool) -> Self {
        self.is_recommended = recommended;
        self
    }

    pub fn bounded(mut self, min: u32, max: u32) -> Self {
        if let Some(ref mut input) = self.requires_input {
            input.min = Some(min);
            input.max = Some(max);
        }
        self
    }
}

/// Variant-specific payload of a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Information to hand to a player.
    Info {
        reading: Reading,
        #[serde(default)]
        options: Vec<AutomationOption>,
    },
    /// A choice that must be made before the ability resolves.
    Action { options: Vec<AutomationOption> },
    /// A resolved rule effect.
    Effect { reading: Reading },
    /// Something the storyteller must not miss.
    Warning {
        reading: Reading,
        #[serde(default)]
        options: Vec<AutomationOption>,
    },
}

/// A recommendation shown on the storyteller's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub role_id: String,
    pub seat_id: SeatId,
    pub title: String,
    pub description: String,
    /// Higher sorts first.
    pub priority: i32,
    pub requires_confirmation: bool,
    #[serde(default)]
    pub target_seat_ids: Vec<SeatId>,
    #[serde(flatten)]
    pub kind: SuggestionKind,
}

impl Suggestion {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SuggestionKind::Info { .. } => "info",
            SuggestionKind::Action { .. } => "action",
            SuggestionKind::Effect { .. } => "effect",
            SuggestionKind::Warning { .. } => "warning",
        }
    }

    pub fn reading(&self) -> Option<&Reading> {
        match &self.kind {
            SuggestionKind::Info { reading, .. }
            | SuggestionKind::Effect { reading }
            | SuggestionKind::Warning { reading, .. } => Some(reading),
            SuggestionKind::Action { .. } => None,
        }
    }

    pub fn suggested_result(&self) -> Option<&str> {
        self.reading().map(|r| r.suggested.as_str())
    }

    pub fn real_result(&self) -> Option<&str> {
        self.reading().and_then(|r| r.real.as_deref())
    }

    pub fn is_tainted(&self) -> bool {
        self.reading().is_some_and(|r| r.tainted)
    }

    pub fn options(&self) -> &[AutomationOption] {
        match &self.kind {
            SuggestionKind::Info { options, .. }
            | SuggestionKind::Action { options }
            | SuggestionKind::Warning { options, .. } => options,
            SuggestionKind::Effect { .. } => &[],
        }
    }

    pub fn recommended_option(&self) -> Option<&AutomationOption> {
        self.options().iter().find(|o| o.is_recommended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDuration {
    Night,
    Day,
    Permanent,
}

/// An idempotent status intent, applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub seat_id: SeatId,
    pub status: Status,
    pub action: StatusAction,
    pub source: String,
    #[serde(default)]
    pub duration: Option<StatusDuration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    DemonKill,
    Execution,
    Slayer,
    Ability,
    Other,
}

/// A kill attempt. Prevented attempts are still reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub seat_id: SeatId,
    pub cause: DeathCause,
    #[serde(default)]
    pub killer_role_id: Option<String>,
    pub is_preventable: bool,
    #[serde(default)]
    pub was_prevented: bool,
    #[serde(default)]
    pub prevented_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainReactionKind {
    /// The demon passed its role to another evil player.
    RoleTransfer,
    /// A successor minion became the demon after the demon died.
    SuccessorTransform,
    MayorWin,
    SaintLoss,
    Other,
}

/// A second-order rule consequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReaction {
    #[serde(rename = "type")]
    pub kind: ChainReactionKind,
    pub description: String,
    #[serde(default)]
    pub target_seat_id: Option<SeatId>,
    #[serde(default)]
    pub new_role_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub winner: Winner,
    pub reason: String,
}

/// The intents produced by a successful ability evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityOutcome {
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub status_changes: Vec<StatusChange>,
    #[serde(default)]
    pub deaths: Vec<DeathEvent>,
    #[serde(default)]
    pub chain_reactions: Vec<ChainReaction>,
    #[serde(default)]
    pub game_end: Option<GameEnd>,
}

impl AbilityOutcome {
    /// Resolved with nothing to report.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn suggest(suggestion: Suggestion) -> Self {
        Self {
            suggestions: vec![suggestion],
            ..Self::default()
        }
    }
}

/// Why an ability could not be evaluated. Nothing from a failed
/// evaluation may be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    #[error("seat {0} does not exist")]
    SeatNotFound(SeatId),
    #[error("target seat {0} does not exist")]
    TargetNotFound(SeatId),
    #[error("nominator seat {0} does not exist")]
    NominatorNotFound(SeatId),
    #[error("executed seat {0} does not exist")]
    ExecutedSeatNotFound(SeatId),
    #[error("new-demon seat {0} does not exist")]
    NewDemonNotFound(SeatId),
    #[error("no target specified")]
    TargetUnspecified,
    #[error("ability already used")]
    AbilityAlreadyUsed,
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unsupported script: {0}")]
    UnsupportedScript(String),
}

pub type AbilityResult = Result<AbilityOutcome, AbilityError>;
