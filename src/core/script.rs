/// Script catalogs: which roles a script contains, their teams and rule
/// traits, and the canonical night orders.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::seat::Team;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unsupported script: {0}")]
    UnknownScript(String),
    #[error("duplicate role '{role}' in script '{script}'")]
    DuplicateRole { script: String, role: String },
}

/// Rule hooks a role can carry. The engine's generic checks read these
/// instead of hard-coding role ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTrait {
    /// Becomes the demon when the demon dies with enough players alive.
    Successor,
    /// Cannot be killed by the demon unless tainted.
    DemonImmune,
    /// While alive, only this role and dead players may vote.
    GhostVoteBypass,
    /// Evil wins if this role is executed.
    ExecutionDefeat,
    /// Good wins with three alive and no execution.
    FinalThreeWin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDef {
    pub id: String,
    pub name: String,
    pub team: Team,
    #[serde(default)]
    pub traits: Vec<RoleTrait>,
}

impl RoleDef {
    pub fn has_trait(&self, t: RoleTrait) -> bool {
        self.traits.contains(&t)
    }
}

/// One playable script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub name: String,
    /// Roles in catalog order.
    pub roles: Vec<RoleDef>,
    pub first_night: Vec<String>,
    pub other_nights: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Role")]
struct RonRole {
    id: String,
    name: String,
    team: Team,
    #[serde(default)]
    traits: Vec<RoleTrait>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Script")]
struct RonScript {
    id: String,
    name: String,
    roles: Vec<RonRole>,
    #[serde(default)]
    first_night: Vec<String>,
    #[serde(default)]
    other_nights: Vec<String>,
}

impl Script {
    /// Load a script from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Script, ScriptError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a script from a RON string.
    pub fn parse_ron(input: &str) -> Result<Script, ScriptError> {
        let raw: RonScript = ron::from_str(input)?;
        let mut roles: Vec<RoleDef> = Vec::with_capacity(raw.roles.len());
        for role in raw.roles {
            if roles.iter().any(|r| r.id == role.id) {
                return Err(ScriptError::DuplicateRole {
                    script: raw.id,
                    role: role.id,
                });
            }
            roles.push(RoleDef {
                id: role.id,
                name: role.name,
                team: role.team,
                traits: role.traits,
            });
        }
        Ok(Script {
            id: raw.id,
            name: raw.name,
            roles,
            first_night: raw.first_night,
            other_nights: raw.other_nights,
        })
    }

    pub fn role(&self, role_id: &str) -> Option<&RoleDef> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn team_of(&self, role_id: &str) -> Option<Team> {
        self.role(role_id).map(|r| r.team)
    }

    /// Display name, falling back to the id for roles outside the script.
    pub fn role_name<'a>(&'a self, role_id: &'a str) -> &'a str {
        self.role(role_id).map(|r| r.name.as_str()).unwrap_or(role_id)
    }

    pub fn has_trait(&self, role_id: &str, t: RoleTrait) -> bool {
        self.role(role_id).is_some_and(|r| r.has_trait(t))
    }

    pub fn roles_of_team(&self, team: Team) -> impl Iterator<Item = &RoleDef> {
        self.roles.iter().filter(move |r| r.team == team)
    }

    pub fn roles_with_trait(&self, t: RoleTrait) -> impl Iterator<Item = &RoleDef> {
        self.roles.iter().filter(move |r| r.has_trait(t))
    }

    /// The canonical night order for the given night.
    pub fn night_order(&self, is_first_night: bool) -> &[String] {
        if is_first_night {
            &self.first_night
        } else {
            &self.other_nights
        }
    }

    /// Night-order entries that name no role in this script.
    pub fn unknown_night_roles(&self) -> Vec<&str> {
        self.first_night
            .iter()
            .chain(self.other_nights.iter())
            .filter(|id| self.role(id).is_none())
            .map(|id| id.as_str())
            .collect()
    }
}

const TROUBLE_BREWING: &str = include_str!("../../script_data/trouble_brewing.ron");
const BAD_MOON_RISING: &str = include_str!("../../script_data/bad_moon_rising.ron");
const SECTS_AND_VIOLETS: &str = include_str!("../../script_data/sects_and_violets.ron");

/// All scripts known to an engine, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    scripts: FxHashMap<String, Script>,
}

impl ScriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three base scripts shipped with the crate.
    pub fn builtin() -> Result<ScriptCatalog, ScriptError> {
        let mut catalog = ScriptCatalog::new();
        for source in [TROUBLE_BREWING, BAD_MOON_RISING, SECTS_AND_VIOLETS] {
            catalog.insert(Script::parse_ron(source)?);
        }
        Ok(catalog)
    }

    /// Load every `.ron` script in a directory.
    pub fn load_dir(dir: &Path) -> Result<ScriptCatalog, ScriptError> {
        let mut catalog = ScriptCatalog::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                catalog.insert(Script::load_from_ron(&path)?);
            }
        }
        Ok(catalog)
    }

    /// Add a script, replacing any script with the same id.
    pub fn insert(&mut self, script: Script) {
        self.scripts.insert(script.id.clone(), script);
    }

    /// Merge another catalog into this one. Scripts from `other`
    /// override scripts in `self` with the same id.
    pub fn merge(&mut self, other: ScriptCatalog) {
        for (id, script) in other.scripts {
            self.scripts.insert(id, script);
        }
    }

    pub fn get(&self, script_id: &str) -> Result<&Script, ScriptError> {
        self.scripts
            .get(script_id)
            .ok_or_else(|| ScriptError::UnknownScript(script_id.to_string()))
    }

    pub fn contains(&self, script_id: &str) -> bool {
        self.scripts.contains_key(script_id)
    }

    /// Script ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scripts.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_base_scripts() {
        let catalog = ScriptCatalog::builtin().unwrap();
        assert_eq!(catalog.ids(), vec!["bmr", "sv", "tb"]);
    }

    #[test]
    fn builtin_night_orders_name_known_roles() {
        let catalog = ScriptCatalog::builtin().unwrap();
        for id in catalog.ids() {
            let script = catalog.get(id).unwrap();
            assert!(
                script.unknown_night_roles().is_empty(),
                "{id}: {:?}",
                script.unknown_night_roles()
            );
        }
    }

    #[test]
    fn trouble_brewing_teams_and_traits() {
        let catalog = ScriptCatalog::builtin().unwrap();
        let tb = catalog.get("tb").unwrap();
        assert_eq!(tb.roles_of_team(Team::Townsfolk).count(), 13);
        assert_eq!(tb.roles_of_team(Team::Outsider).count(), 4);
        assert_eq!(tb.roles_of_team(Team::Minion).count(), 4);
        assert_eq!(tb.team_of("imp"), Some(Team::Demon));
        assert!(tb.has_trait("scarlet_woman", RoleTrait::Successor));
        assert!(tb.has_trait("soldier", RoleTrait::DemonImmune));
        assert!(tb.has_trait("saint", RoleTrait::ExecutionDefeat));
        assert!(tb.has_trait("mayor", RoleTrait::FinalThreeWin));
        assert_eq!(tb.role_name("fortune_teller"), "Fortune Teller");
        assert_eq!(tb.role_name("not_a_role"), "not_a_role");
    }

    #[test]
    fn unknown_script_fails_closed() {
        let catalog = ScriptCatalog::builtin().unwrap();
        let err = catalog.get("homebrew").unwrap_err();
        assert_eq!(err.to_string(), "unsupported script: homebrew");
    }

    #[test]
    fn duplicate_roles_are_rejected() {
        let input = r#"Script(
            id: "dup",
            name: "Dup",
            roles: [
                Role(id: "imp", name: "Imp", team: DEMON),
                Role(id: "imp", name: "Imp", team: DEMON),
            ],
        )"#;
        assert!(matches!(
            Script::parse_ron(input),
            Err(ScriptError::DuplicateRole { .. })
        ));
    }

    #[test]
    fn merge_overrides_by_id() {
        let mut base = ScriptCatalog::builtin().unwrap();
        let mut other = ScriptCatalog::new();
        other.insert(Script {
            id: "tb".to_string(),
            name: "Trouble Brewing (teensy)".to_string(),
            roles: Vec::new(),
            first_night: Vec::new(),
            other_nights: Vec::new(),
        });
        base.merge(other);
        assert_eq!(base.len(), 3);
        assert_eq!(base.get("tb").unwrap().name, "Trouble Brewing (teensy)");
    }
}
