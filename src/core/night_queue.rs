/// Night action ordering.
use rustc_hash::FxHashMap;

use crate::core::script::{Script, ScriptCatalog, ScriptError};
use crate::schema::seat::Seat;

/// Alive and dead holder counts for one role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCensus {
    pub alive: usize,
    pub dead: usize,
}

/// Count holders of each real role across occupied seats.
pub fn role_census(seats: &[Seat]) -> FxHashMap<&str, RoleCensus> {
    let mut census: FxHashMap<&str, RoleCensus> = FxHashMap::default();
    for seat in seats.iter().filter(|s| s.is_occupied()) {
        let Some(role_id) = seat.role_id() else {
            continue;
        };
        let entry = census.entry(role_id).or_default();
        if seat.is_dead {
            entry.dead += 1;
        } else {
            entry.alive += 1;
        }
    }
    census
}

/// The roles to wake tonight, in the script's canonical order.
///
/// A role is kept only if at least one living, occupied seat holds it.
/// The canonical order is filtered, never reordered.
pub fn calculate_night_queue(seats: &[Seat], is_first_night: bool, script: &Script) -> Vec<String> {
    let census = role_census(seats);
    script
        .night_order(is_first_night)
        .iter()
        .filter(|role_id| {
            census
                .get(role_id.as_str())
                .is_some_and(|c| c.alive > 0)
        })
        .cloned()
        .collect()
}

impl ScriptCatalog {
    /// Night queue for a script by id. Unknown scripts are an error.
    pub fn night_queue(
        &self,
        seats: &[Seat],
        is_first_night: bool,
        script_id: &str,
    ) -> Result<Vec<String>, ScriptError> {
        let script = self.get(script_id)?;
        Ok(calculate_night_queue(seats, is_first_night, script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tb() -> Script {
        ScriptCatalog::builtin().unwrap().get("tb").unwrap().clone()
    }

    #[test]
    fn first_night_keeps_living_holders_only() {
        let seats = vec![
            Seat::occupied(0, "Ann", "washerwoman"),
            Seat::occupied(1, "Ben", "imp"),
        ];
        let queue = calculate_night_queue(&seats, true, &tb());
        assert_eq!(queue, vec!["washerwoman"]);
    }

    #[test]
    fn dead_holder_is_excluded() {
        let mut seats = vec![
            Seat::occupied(0, "Ann", "monk"),
            Seat::occupied(1, "Ben", "imp"),
            Seat::occupied(2, "Cat", "empath"),
        ];
        seats[2].is_dead = true;
        let queue = calculate_night_queue(&seats, false, &tb());
        assert_eq!(queue, vec!["monk", "imp"]);
    }

    #[test]
    fn order_follows_script_not_seats() {
        let seats = vec![
            Seat::occupied(0, "Ann", "spy"),
            Seat::occupied(1, "Ben", "empath"),
            Seat::occupied(2, "Cat", "poisoner"),
        ];
        let queue = calculate_night_queue(&seats, true, &tb());
        assert_eq!(queue, vec!["poisoner", "empath", "spy"]);
    }

    #[test]
    fn empty_seats_never_count() {
        let mut ghost = Seat::empty(1);
        ghost.real_role_id = Some("poisoner".to_string());
        let seats = vec![Seat::occupied(0, "Ann", "chef"), ghost];
        let queue = calculate_night_queue(&seats, true, &tb());
        assert_eq!(queue, vec!["chef"]);
    }

    #[test]
    fn census_counts_alive_and_dead() {
        let mut seats = vec![
            Seat::occupied(0, "Ann", "imp"),
            Seat::occupied(1, "Ben", "imp"),
        ];
        seats[1].is_dead = true;
        let census = role_census(&seats);
        assert_eq!(census["imp"], RoleCensus { alive: 1, dead: 1 });
    }

    #[test]
    fn unknown_script_is_an_error() {
        let catalog = ScriptCatalog::builtin().unwrap();
        assert!(catalog.night_queue(&[], true, "nope").is_err());
    }
}
