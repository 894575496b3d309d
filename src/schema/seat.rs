use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable seat index; also the seat's position in the circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub u32);

impl SeatId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The value recorded in vote history, where `-1` stands for "no seat".
    pub fn record_value(seat: Option<SeatId>) -> i32 {
        seat.map(|s| s.0 as i32).unwrap_or(-1)
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient effect tags carried by a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Poisoned,
    Drunk,
    Protected,
    Madness,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Poisoned => "poisoned",
            Self::Drunk => "drunk",
            Self::Protected => "protected",
            Self::Madness => "mad",
        }
    }
}

/// Character type of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
}

impl Team {
    pub fn is_evil(&self) -> bool {
        matches!(self, Self::Minion | Self::Demon)
    }
}

/// A storyteller annotation. Not rule-relevant to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub text: String,
    #[serde(default)]
    pub source_role: Option<String>,
}

/// One slot in the seating circle.
///
/// `real_role_id` is the ground truth every rule reads. `seen_role_id` is
/// what the player believes they are (a drunk sees a townsfolk) and is only
/// ever used for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default = "default_ghost_vote")]
    pub has_ghost_vote: bool,
    #[serde(default)]
    pub real_role_id: Option<String>,
    #[serde(default)]
    pub seen_role_id: Option<String>,
    #[serde(default)]
    pub statuses: FxHashSet<Status>,
    #[serde(default)]
    pub has_used_ability: bool,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

fn default_ghost_vote() -> bool {
    true
}

impl Seat {
    /// An unoccupied seat.
    pub fn empty(id: u32) -> Self {
        Self {
            id: SeatId(id),
            user_id: None,
            user_name: String::new(),
            is_dead: false,
            has_ghost_vote: true,
            real_role_id: None,
            seen_role_id: None,
            statuses: FxHashSet::default(),
            has_used_ability: false,
            reminders: Vec::new(),
        }
    }

    /// An occupied, living seat holding `role_id`.
    pub fn occupied(id: u32, name: &str, role_id: &str) -> Self {
        Self {
            user_id: Some(format!("user-{id}")),
            user_name: name.to_string(),
            real_role_id: Some(role_id.to_string()),
            seen_role_id: Some(role_id.to_string()),
            ..Self::empty(id)
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.user_id.is_some()
    }

    /// Occupied and not dead.
    pub fn is_alive_player(&self) -> bool {
        self.is_occupied() && !self.is_dead
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.statuses.contains(&status)
    }

    /// Poisoned or drunk: the seat's ability output is unreliable.
    pub fn is_tainted(&self) -> bool {
        self.has_status(Status::Poisoned) || self.has_status(Status::Drunk)
    }

    pub fn is_protected(&self) -> bool {
        self.has_status(Status::Protected)
    }

    /// The rule-relevant role.
    pub fn role_id(&self) -> Option<&str> {
        self.real_role_id.as_deref()
    }

    /// The role shown to the player, falling back to the real one.
    pub fn seen_role(&self) -> Option<&str> {
        self.seen_role_id.as_deref().or(self.real_role_id.as_deref())
    }

    pub fn holds_role(&self, role_id: &str) -> bool {
        self.role_id() == Some(role_id)
    }

    /// Display name used in suggestion text, e.g. `#3 Alice`.
    pub fn label(&self) -> String {
        if self.user_name.is_empty() {
            format!("#{}", self.id.0 + 1)
        } else {
            format!("#{} {}", self.id.0 + 1, self.user_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tainted_covers_poison_and_drunk() {
        let mut seat = Seat::occupied(0, "Ada", "empath");
        assert!(!seat.is_tainted());
        seat.statuses.insert(Status::Drunk);
        assert!(seat.is_tainted());
        seat.statuses.clear();
        seat.statuses.insert(Status::Poisoned);
        assert!(seat.is_tainted());
        seat.statuses.insert(Status::Madness);
        assert!(!seat.is_protected());
    }

    #[test]
    fn seen_role_falls_back_to_real_role() {
        let mut seat = Seat::occupied(1, "Bo", "drunk");
        seat.seen_role_id = Some("chef".to_string());
        assert_eq!(seat.role_id(), Some("drunk"));
        assert_eq!(seat.seen_role(), Some("chef"));

        seat.seen_role_id = None;
        assert_eq!(seat.seen_role(), Some("drunk"));
    }

    #[test]
    fn empty_seat_is_not_a_player() {
        let seat = Seat::empty(4);
        assert!(!seat.is_occupied());
        assert!(!seat.is_alive_player());
        assert_eq!(seat.label(), "#5");
    }

    #[test]
    fn record_value_uses_minus_one_for_absent() {
        assert_eq!(SeatId::record_value(None), -1);
        assert_eq!(SeatId::record_value(Some(SeatId(3))), 3);
    }

    #[test]
    fn evil_teams() {
        assert!(Team::Minion.is_evil());
        assert!(Team::Demon.is_evil());
        assert!(!Team::Outsider.is_evil());
    }
}
