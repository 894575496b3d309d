/// Night Preview: runs a whole night over a saved grimoire and prints the
/// storyteller checklist.
///
/// Usage: night_preview --grimoire <path> [--config <path>] [--scripts <dir>]
///                      [--level FULL_AUTO|GUIDED|MANUAL] [--seed <n>]
///
/// Set RUST_LOG (e.g. `grimoire_engine=debug`) to see engine tracing.

use grimoire_engine::core::engine::{NightBatch, RoleAutomationEngine};
use grimoire_engine::schema::ability::{AutomationLevel, StatusAction};
use grimoire_engine::schema::game::GameState;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grimoire_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut grimoire_path = None;
    let mut config_path = None;
    let mut scripts_dir = None;
    let mut level = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--grimoire" if i + 1 < args.len() => {
                i += 1;
                grimoire_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--scripts" if i + 1 < args.len() => {
                i += 1;
                scripts_dir = Some(args[i].clone());
            }
            "--level" if i + 1 < args.len() => {
                i += 1;
                level = Some(parse_level(&args[i]));
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(grimoire_path) = grimoire_path else {
        eprintln!("ERROR: --grimoire is required");
        process::exit(1);
    };
    let state = match load_grimoire(Path::new(&grimoire_path)) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("ERROR: Failed to load grimoire: {}", e);
            process::exit(1);
        }
    };

    let mut builder = RoleAutomationEngine::builder().seed(seed);
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    if let Some(ref dir) = scripts_dir {
        builder = builder.scripts_dir(dir);
    }
    if let Some(level) = level {
        builder = builder.level(level);
    }
    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: Failed to build engine: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Night {} of script '{}' ({:?}, seed {})",
        state.round.night_count,
        state.current_script_id,
        engine.automation_level(),
        seed
    );
    println!("Queue: {}\n", state.night_queue.join(" -> "));

    let batch = engine.generate_all_night_suggestions(&state);
    print_batch(&state, &batch);

    let applied = engine.apply_automatic(&state.seats);
    if !applied.died.is_empty() {
        let names: Vec<String> = applied.died.iter().map(|id| id.to_string()).collect();
        println!("\nDied tonight: seats {}", names.join(", "));
    }

    let mut after = state.clone();
    after.seats = applied.seats;
    match engine.check_game_end_conditions(&after) {
        Ok(check) if check.should_end => println!(
            "\nGame over: {:?} wins ({})",
            check.winner,
            check.reason.unwrap_or_default()
        ),
        Ok(_) => println!("\nThe game continues."),
        Err(e) => eprintln!("ERROR: {}", e),
    }
}

fn load_grimoire(path: &Path) -> Result<GameState, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(ron::from_str(&contents)?)
}

fn parse_level(input: &str) -> AutomationLevel {
    match input.to_ascii_uppercase().as_str() {
        "FULL_AUTO" => AutomationLevel::FullAuto,
        "MANUAL" => AutomationLevel::Manual,
        "GUIDED" => AutomationLevel::Guided,
        other => {
            eprintln!("Unknown level '{}', using GUIDED", other);
            AutomationLevel::Guided
        }
    }
}

fn print_batch(state: &GameState, batch: &NightBatch) {
    println!("=== Checklist ===");
    for (n, s) in batch.suggestions.iter().enumerate() {
        let who = state
            .seat(s.seat_id)
            .map(|seat| seat.label())
            .unwrap_or_else(|| format!("#{}", s.seat_id));
        println!("{:>2}. [{:>3}] {} ({}) {}: {}", n + 1, s.priority, who, s.role_id, s.kind_name(), s.title);
        if !s.description.is_empty() {
            println!("        {}", s.description);
        }
        if let Some(reading) = s.reading() {
            println!("        tell: {}", reading.suggested);
            if let Some(real) = reading.real.as_deref().filter(|_| reading.tainted) {
                println!("        real: {} (tainted)", real);
            }
        }
        for option in s.options() {
            let mark = if option.is_recommended { "*" } else { "-" };
            println!("        {} {} => {}", mark, option.label, option.result);
        }
    }

    if !batch.status_changes.is_empty() {
        println!("\n=== Status changes ===");
        for change in &batch.status_changes {
            let verb = match change.action {
                StatusAction::Add => "add",
                StatusAction::Remove => "remove",
            };
            println!("  {} {} on seat {} ({})", verb, change.status.label(), change.seat_id, change.source);
        }
    }
    if !batch.deaths.is_empty() {
        println!("\n=== Deaths ===");
        for death in &batch.deaths {
            match &death.prevented_by {
                Some(by) if death.was_prevented => {
                    println!("  seat {} ({:?}) prevented by {}", death.seat_id, death.cause, by)
                }
                _ => println!("  seat {} ({:?})", death.seat_id, death.cause),
            }
        }
    }
    if !batch.chain_reactions.is_empty() {
        println!("\n=== Chain reactions ===");
        for reaction in &batch.chain_reactions {
            println!("  {:?}: {}", reaction.kind, reaction.description);
        }
    }
    for failure in &batch.failures {
        println!("FAILED: seat {} ({}): {}", failure.seat_id, failure.role_id, failure.message);
    }
}

fn print_usage() {
    println!("Night Preview: run a night over a saved grimoire");
    println!();
    println!("Usage: night_preview --grimoire <path> [--config <path>] [--scripts <dir>]");
    println!("                     [--level FULL_AUTO|GUIDED|MANUAL] [--seed <n>]");
}
