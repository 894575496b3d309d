/// Night flow integration tests: engine batches, kills, protection and
/// win checks against a RON grimoire.
use std::path::Path;

use grimoire_engine::core::engine::{RoleAutomationConfig, RoleAutomationEngine};
use grimoire_engine::core::game_end::{check_after_execution, check_game_end};
use grimoire_engine::core::phase::{PhaseEvent, PhaseMachine, Transition};
use grimoire_engine::core::roles::{trouble_brewing_table, ProcessorRegistry};
use grimoire_engine::schema::ability::{
    AbilityError, AdditionalData, AutomationLevel, ChainReactionKind, SuggestionKind,
};
use grimoire_engine::schema::game::{GameState, Phase, Winner};
use grimoire_engine::schema::seat::{SeatId, Status};

fn load_grimoire() -> GameState {
    let contents = std::fs::read_to_string("tests/fixtures/grimoire_night2.ron").unwrap();
    ron::from_str(&contents).unwrap()
}

fn engine() -> RoleAutomationEngine {
    RoleAutomationEngine::builder()
        .seed(1234)
        .config_path("tests/fixtures/config.ron")
        .build()
        .unwrap()
}

#[test]
fn config_file_is_applied_by_the_builder() {
    let engine = engine();
    assert_eq!(engine.automation_level(), AutomationLevel::FullAuto);
    assert!(engine.config().auto_process_deaths);
    assert_eq!(engine.config().level_for("fortune_teller"), AutomationLevel::Guided);
    assert!(engine.config().is_disabled("spy"));

    let direct = RoleAutomationConfig::load_from_ron(Path::new("tests/fixtures/config.ron")).unwrap();
    assert_eq!(engine.config(), &direct);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let engine = RoleAutomationEngine::builder()
        .config_path("tests/fixtures/does_not_exist.ron")
        .build()
        .unwrap();
    assert_eq!(engine.automation_level(), AutomationLevel::Guided);
}

#[test]
fn whole_night_produces_a_sorted_checklist() {
    let mut engine = engine();
    let state = load_grimoire();
    let batch = engine.generate_all_night_suggestions(&state);

    assert!(batch.failures.is_empty());
    assert!(!batch.suggestions.is_empty());
    assert!(batch
        .suggestions
        .windows(2)
        .all(|w| w[0].priority >= w[1].priority));
    // The spy is disabled in the config.
    assert!(batch.suggestions.iter().all(|s| s.role_id != "spy"));

    let empath = batch
        .suggestions
        .iter()
        .find(|s| s.role_id == "empath")
        .unwrap();
    assert!(empath.is_tainted());

    let pending = engine.get_pending_suggestions();
    assert_eq!(pending, batch.suggestions);
}

#[test]
fn stepping_the_queue_matches_one_role_at_a_time() {
    let mut engine = engine();
    let state = load_grimoire();
    let queue = state.night_queue.clone();

    let imp = engine.process_night_phase(&state, &queue, 3);
    assert_eq!(imp.suggestions.len(), 1);
    assert_eq!(imp.suggestions[0].seat_id, SeatId(1));
    assert!(matches!(imp.suggestions[0].kind, SuggestionKind::Action { .. }));
    assert!(imp.suggestions[0].recommended_option().is_some());
}

#[test]
fn protected_target_survives_the_demon() {
    let mut engine = engine();
    let state = load_grimoire();

    let ctx = engine.context_for(&state, "monk").with_targets(&[5]);
    let monk = engine
        .process_role_ability(&state, SeatId(0), "monk", &ctx)
        .unwrap();
    engine.queue_outcome(monk);
    let seats = engine.apply_status_changes(&state.seats);
    assert!(seats[5].has_status(Status::Protected));

    let mut protected_state = state.clone();
    protected_state.seats = seats;
    let ctx = engine.context_for(&protected_state, "imp").with_targets(&[5]);
    let kill = engine
        .process_role_ability(&protected_state, SeatId(1), "imp", &ctx)
        .unwrap();
    assert_eq!(kill.deaths.len(), 1);
    assert!(kill.deaths[0].was_prevented);
    assert_eq!(kill.deaths[0].prevented_by.as_deref(), Some("monk"));

    engine.queue_outcome(kill);
    let applied = engine.apply_deaths(&protected_state.seats);
    assert!(applied.died.is_empty());
    assert!(!applied.seats[5].is_dead);
    assert!(engine.get_pending_deaths().is_empty());
}

#[test]
fn poisoned_demon_hitting_a_protected_seat_is_still_prevented() {
    let mut engine = engine();
    let mut state = load_grimoire();
    state.seats[1].statuses.insert(Status::Poisoned);
    state.seats[5].statuses.insert(Status::Protected);

    let ctx = engine.context_for(&state, "imp").with_targets(&[5]);
    let kill = engine
        .process_role_ability(&state, SeatId(1), "imp", &ctx)
        .unwrap();
    assert_eq!(kill.deaths.len(), 1);
    assert!(kill.deaths[0].was_prevented);

    engine.queue_outcome(kill);
    let applied = engine.apply_deaths(&state.seats);
    assert!(applied.died.is_empty());
    assert!(!applied.seats[5].is_dead);
}

#[test]
fn soldier_ignores_the_demon_unless_poisoned() {
    let engine = engine();
    let mut state = load_grimoire();
    let ctx = engine.context_for(&state, "imp").with_targets(&[3]);

    let kill = engine
        .process_role_ability(&state, SeatId(1), "imp", &ctx)
        .unwrap();
    assert!(kill.deaths[0].was_prevented);
    assert_eq!(kill.deaths[0].prevented_by.as_deref(), Some("soldier"));

    state.seats[3].statuses.insert(Status::Poisoned);
    let kill = engine
        .process_role_ability(&state, SeatId(1), "imp", &ctx)
        .unwrap();
    assert!(!kill.deaths[0].was_prevented);
}

#[test]
fn demon_kill_applies_once() {
    let mut engine = engine();
    let state = load_grimoire();
    let ctx = engine.context_for(&state, "imp").with_targets(&[2]);
    let kill = engine
        .process_role_ability(&state, SeatId(1), "imp", &ctx)
        .unwrap();
    engine.queue_outcome(kill);

    let applied = engine.apply_automatic(&state.seats);
    assert_eq!(applied.died, vec![SeatId(2)]);
    assert!(applied.seats[2].is_dead);
    assert!(engine.get_pending_deaths().is_empty());
}

#[test]
fn self_kill_passes_the_demon_to_the_chosen_minion() {
    let mut engine = engine();
    let state = load_grimoire();
    let ctx = engine
        .context_for(&state, "imp")
        .with_targets(&[1])
        .with_additional(AdditionalData {
            new_demon_seat_id: Some(SeatId(6)),
            ..AdditionalData::default()
        });
    let outcome = engine
        .process_role_ability(&state, SeatId(1), "imp", &ctx)
        .unwrap();
    assert_eq!(outcome.deaths.len(), 1);
    assert_eq!(outcome.deaths[0].seat_id, SeatId(1));
    assert_eq!(outcome.chain_reactions.len(), 1);
    assert_eq!(outcome.chain_reactions[0].kind, ChainReactionKind::RoleTransfer);
    assert_eq!(outcome.chain_reactions[0].target_seat_id, Some(SeatId(6)));

    engine.queue_outcome(outcome);
    let applied = engine.apply_deaths(&state.seats);
    let seats = engine.apply_chain_reactions(&applied.seats);
    assert_eq!(seats[6].role_id(), Some("imp"));

    let mut after = state.clone();
    after.seats = seats;
    let check = engine.check_game_end_conditions(&after).unwrap();
    assert!(!check.should_end);
}

#[test]
fn missing_target_seat_is_a_distinct_error() {
    let engine = engine();
    let state = load_grimoire();
    let ctx = engine.context_for(&state, "imp").with_targets(&[42]);
    let err = engine
        .process_role_ability(&state, SeatId(1), "imp", &ctx)
        .unwrap_err();
    assert_eq!(err, AbilityError::TargetNotFound(SeatId(42)));
    assert_eq!(err.to_string(), "target seat 42 does not exist");

    let err = engine
        .process_role_ability(&state, SeatId(99), "imp", &ctx)
        .unwrap_err();
    assert_eq!(err.to_string(), "seat 99 does not exist");
}

#[test]
fn dead_demon_with_successor_continues_only_with_five_alive() {
    let state = load_grimoire();
    let catalog = engine();
    let script = catalog.catalog().get("tb").unwrap();

    let mut seats = state.seats.clone();
    seats[1].is_dead = true;
    assert!(!check_game_end(&seats, script).should_end);

    for id in [0, 2, 3] {
        seats[id].is_dead = true;
    }
    let check = check_game_end(&seats, script);
    assert_eq!(check.winner, Some(Winner::Good));
}

#[test]
fn executing_the_demon_ends_the_game_without_a_successor() {
    let mut state = load_grimoire();
    let engine = engine();
    let script = engine.catalog().get("tb").unwrap();
    state.seats[4].is_dead = true;
    state.seats[1].is_dead = true;
    let check = check_after_execution(&state.seats, SeatId(1), script);
    assert!(check.should_end);
    assert_eq!(check.game_over().unwrap().reason, "demon eliminated");
}

#[test]
fn custom_script_runs_with_a_registered_table() {
    let mut registry = ProcessorRegistry::default();
    registry.register("vt", trouble_brewing_table());
    let mut engine = RoleAutomationEngine::builder()
        .scripts_dir("tests/fixtures/scripts")
        .with_processors(registry)
        .level(AutomationLevel::Guided)
        .build()
        .unwrap();
    assert!(engine.catalog().contains("vt"));

    let mut state = load_grimoire();
    state.current_script_id = "vt".to_string();
    state.night_queue = vec!["empath".to_string()];
    let batch = engine.generate_all_night_suggestions(&state);
    assert!(batch.failures.is_empty());
    assert_eq!(batch.suggestions.len(), 1);
}

#[test]
fn script_without_processors_fails_every_seat_softly() {
    let mut engine = RoleAutomationEngine::builder()
        .scripts_dir("tests/fixtures/scripts")
        .build()
        .unwrap();
    let mut state = load_grimoire();
    state.current_script_id = "vt".to_string();
    state.night_queue = vec!["empath".to_string(), "monk".to_string()];
    let batch = engine.generate_all_night_suggestions(&state);
    assert_eq!(batch.failures.len(), 2);
    assert!(batch
        .failures
        .iter()
        .all(|f| f.message == "unsupported script: vt"));
    assert!(engine.get_pending_suggestions().is_empty());
}

#[test]
fn phase_machine_drives_a_full_round() {
    let state = load_grimoire();
    let engine = engine();
    let script = engine.catalog().get("tb").unwrap().clone();
    let mut machine = PhaseMachine::new(script);

    assert_eq!(
        machine.send(PhaseEvent::StartGame(state.seats.clone())),
        Transition::Taken
    );
    let first_night = machine.night_queue().to_vec();
    assert_eq!(first_night, ["poisoner", "empath", "fortune_teller", "spy"]);

    for _ in 0..first_night.len() {
        machine.send(PhaseEvent::NextNightAction);
    }
    assert_eq!(machine.phase(), Phase::Day);

    let mut seats = machine.state().seats.clone();
    seats[0].is_dead = true;
    machine.update_seats(seats);
    machine.send(PhaseEvent::StartNight);
    assert_eq!(
        machine.night_queue(),
        ["poisoner", "scarlet_woman", "imp", "empath", "fortune_teller", "spy"]
    );
}
