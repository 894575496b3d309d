/// Townsfolk processors.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::helpers::{
    fake_count, pair_text, pick_player, prefer_roles, random_pair, rng_for, suggest, team_noun,
    tell_or_override, Grimoire,
};
use crate::schema::ability::{
    AbilityContext, AbilityError, AbilityOutcome, AbilityResult, AutomationOption, DeathCause,
    DeathEvent, InputKind, Reading, StatusAction, StatusChange, StatusDuration, Suggestion,
};
use crate::schema::seat::{Seat, SeatId, Status, Team};

/// The "one of these two players is a X" information roles.
struct PairRole {
    role_id: &'static str,
    title: &'static str,
    team: Team,
    priority: i32,
    /// Chance that tainted information claims the team is absent.
    says_none_when_tainted: f64,
}

const WASHERWOMAN: PairRole = PairRole {
    role_id: "washerwoman",
    title: "Washerwoman information",
    team: Team::Townsfolk,
    priority: 70,
    says_none_when_tainted: 0.0,
};

const LIBRARIAN: PairRole = PairRole {
    role_id: "librarian",
    title: "Librarian information",
    team: Team::Outsider,
    priority: 70,
    says_none_when_tainted: 0.3,
};

const INVESTIGATOR: PairRole = PairRole {
    role_id: "investigator",
    title: "Investigator information",
    team: Team::Minion,
    priority: 75,
    says_none_when_tainted: 0.0,
};

pub fn washerwoman(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    pair_info(g, seat_id, ctx, &WASHERWOMAN)
}

pub fn librarian(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    pair_info(g, seat_id, ctx, &LIBRARIAN)
}

pub fn investigator(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    pair_info(g, seat_id, ctx, &INVESTIGATOR)
}

fn pair_info(
    g: &Grimoire<'_>,
    seat_id: SeatId,
    ctx: &AbilityContext,
    role: &PairRole,
) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let mut rng = rng_for(ctx, seat_id);
    let none_text = format!("There are no {} in play", team_noun(role.team));

    let candidates = g.alive_of_team(role.team, seat_id);
    let others = g.alive_others(seat_id);

    let (real_text, targets) = match candidates.choose(&mut rng).copied() {
        Some(real) => {
            let decoys: Vec<&Seat> = others.iter().copied().filter(|s| s.id != real.id).collect();
            let decoy = decoys.choose(&mut rng).copied().unwrap_or(real);
            let (a, b) = if rng.gen_bool(0.5) {
                (real, decoy)
            } else {
                (decoy, real)
            };
            let name = real.role_id().map(|r| g.role_name(r)).unwrap_or("unknown");
            (pair_text(a, b, name), vec![a.id, b.id])
        }
        None if !tainted => {
            let suggestion = suggest(ctx, role.role_id, seat_id, "none")
                .title(role.title)
                .description(none_text.clone())
                .priority(role.priority)
                .info(Reading::truthful(none_text));
            return Ok(AbilityOutcome::suggest(suggestion));
        }
        None => (none_text.clone(), Vec::new()),
    };

    let reading = if tainted {
        let suggested = if rng.gen_bool(role.says_none_when_tainted) {
            none_text
        } else {
            let fake_roles: Vec<&str> = g
                .script
                .roles_of_team(role.team)
                .map(|r| r.name.as_str())
                .collect();
            match (fake_roles.choose(&mut rng), random_pair(&mut rng, &others)) {
                (Some(fake), Some((a, b))) => pair_text(a, b, fake),
                _ => real_text.clone(),
            }
        };
        Reading::tainted(suggested, real_text)
    } else {
        Reading::truthful(real_text)
    };

    let options = if ctx.is_guided() {
        tell_or_override(&reading.suggested)
    } else {
        Vec::new()
    };
    let suggestion = suggest(ctx, role.role_id, seat_id, "info")
        .title(role.title)
        .description(tainted_note(tainted))
        .priority(role.priority)
        .targets(&targets)
        .info_with(reading, options);
    Ok(AbilityOutcome::suggest(suggestion))
}

fn tainted_note(tainted: bool) -> &'static str {
    if tainted {
        "Player is poisoned or drunk: give false information"
    } else {
        "Give true information"
    }
}

fn pairs_text(n: usize) -> String {
    match n {
        0 => "No evil players sit next to each other".to_string(),
        1 => "1 pair of evil players sit next to each other".to_string(),
        n => format!("{n} pairs of evil players sit next to each other"),
    }
}

pub fn chef(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let real = g.evil_pairs();
    let reading = if tainted {
        let mut rng = rng_for(ctx, seat_id);
        Reading::tainted(pairs_text(fake_count(&mut rng, 3, real)), pairs_text(real))
    } else {
        Reading::truthful(pairs_text(real))
    };
    let suggestion = suggest(ctx, "chef", seat_id, "info")
        .title("Chef information")
        .description(tainted_note(tainted))
        .priority(70)
        .info(reading);
    Ok(AbilityOutcome::suggest(suggestion))
}

fn neighbors_text(n: usize) -> String {
    match n {
        0 => "Neither of your living neighbours is evil".to_string(),
        n => format!("{n} of your living neighbours are evil"),
    }
}

pub fn empath(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let (left, right) = g.alive_neighbors(seat_id);
    let mut real = 0;
    // A lone survivor is their own neighbour both ways; count once.
    let right = right.filter(|r| left.map(|l| l.id) != Some(r.id));
    for neighbor in [left, right].into_iter().flatten() {
        if g.is_evil(neighbor) {
            real += 1;
        }
    }
    let reading = if tainted {
        let mut rng = rng_for(ctx, seat_id);
        Reading::tainted(
            neighbors_text(fake_count(&mut rng, 2, real)),
            neighbors_text(real),
        )
    } else {
        Reading::truthful(neighbors_text(real))
    };
    let targets: Vec<SeatId> = [left, right].into_iter().flatten().map(|s| s.id).collect();
    let suggestion = suggest(ctx, "empath", seat_id, "info")
        .title("Empath information")
        .description(tainted_note(tainted))
        .priority(65)
        .targets(&targets)
        .info(reading);
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn fortune_teller(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let mut rng = rng_for(ctx, seat_id);

    let (first, second) = match ctx.target_seat_ids.as_slice() {
        [] => {
            let mut options = vec![AutomationOption::input(
                "select_targets",
                "Choose two players",
                InputKind::Players,
                "Choose two players to read",
            )
            .bounded(2, 2)];
            let pool = g.alive_players();
            let random = random_pair(&mut rng, &pool)
                .map(|(a, b)| format!("{},{}", a.id, b.id))
                .unwrap_or_default();
            options.push(
                AutomationOption::new("random", "Pick two at random", random)
                    .recommended(ctx.is_full_auto()),
            );
            let suggestion = suggest(ctx, "fortune_teller", seat_id, "choose")
                .title("Fortune Teller reading")
                .description("Choose two players to read")
                .priority(85)
                .confirm(true)
                .action(options);
            return Ok(AbilityOutcome::suggest(suggestion));
        }
        [_] => return Err(AbilityError::TargetUnspecified),
        [a, b, ..] => (*a, *b),
    };
    let a = g.target(first)?;
    let b = g.target(second)?;

    let demon = g.find_demon().map(|d| d.id);
    let herring = ctx.additional.red_herring_seat_id;
    let hit = |id: SeatId| Some(id) == demon || Some(id) == herring;
    let real = if hit(a.id) || hit(b.id) { "Yes" } else { "No" };

    let reading = if tainted {
        let fake = if rng.gen_bool(0.5) { "Yes" } else { "No" };
        Reading::tainted(fake, real)
    } else {
        Reading::truthful(real)
    };
    let suggestion = suggest(ctx, "fortune_teller", seat_id, "result")
        .title("Fortune Teller result")
        .description(format!(
            "Reading {} and {}{}",
            a.label(),
            b.label(),
            if tainted { " (poisoned or drunk)" } else { "" }
        ))
        .priority(80)
        .targets(&[a.id, b.id])
        .info(reading);
    Ok(AbilityOutcome::suggest(suggestion))
}

/// A random role name from the whole script, for tainted role reveals.
fn any_role_name<'a>(g: &Grimoire<'a>, rng: &mut StdRng) -> Option<&'a str> {
    g.script.roles.choose(rng).map(|r| r.name.as_str())
}

pub fn undertaker(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if ctx.is_first_night {
        return Ok(AbilityOutcome::silent());
    }
    let Some(executed_id) = ctx.additional.executed_seat_id else {
        let suggestion = suggest(ctx, "undertaker", seat_id, "none")
            .title("Undertaker information")
            .description("Nobody was executed today")
            .priority(60)
            .confirm(false)
            .info(Reading::truthful("Nobody was executed today"));
        return Ok(AbilityOutcome::suggest(suggestion));
    };
    let executed = g
        .seat(executed_id)
        .ok_or(AbilityError::ExecutedSeatNotFound(executed_id))?;

    let tainted = seat.is_tainted();
    let real = match executed.role_id() {
        Some(role) => format!("The executed player was the {}", g.role_name(role)),
        None => "The executed player's role is unknown".to_string(),
    };
    let reading = if tainted {
        let mut rng = rng_for(ctx, seat_id);
        match any_role_name(g, &mut rng) {
            Some(fake) => Reading::tainted(format!("The executed player was the {fake}"), real),
            None => Reading::tainted(real.clone(), real),
        }
    } else {
        Reading::truthful(real)
    };
    let suggestion = suggest(ctx, "undertaker", seat_id, "info")
        .title("Undertaker information")
        .description(format!(
            "Role of {}{}",
            executed.label(),
            if tainted { " (poisoned or drunk)" } else { "" }
        ))
        .priority(65)
        .targets(&[executed_id])
        .info(reading);
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn monk(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if ctx.is_first_night {
        return Ok(AbilityOutcome::silent());
    }
    let Some(&target_id) = ctx.target_seat_ids.first() else {
        let mut options = vec![pick_player(
            "select_target",
            "Choose who to protect",
            "Choose a player to protect",
        )];
        if ctx.is_full_auto() {
            let pool = g.alive_others(seat_id);
            let pick = prefer_roles(&pool, &["fortune_teller", "empath", "slayer", "mayor"])
                .or_else(|| pool.first().copied());
            if let Some(pick) = pick {
                options.push(
                    AutomationOption::new(
                        "recommended",
                        format!("Recommended: protect {}", pick.label()),
                        pick.id.to_string(),
                    )
                    .recommended(true),
                );
            }
        }
        let suggestion = suggest(ctx, "monk", seat_id, "choose")
            .title("Monk protection")
            .description("Choose a player to protect (not yourself)")
            .priority(90)
            .confirm(true)
            .action(options);
        return Ok(AbilityOutcome::suggest(suggestion));
    };
    let target = g.target(target_id)?;

    let tainted = seat.is_tainted();
    let (description, reading) = if tainted {
        (
            format!("Protect {} (no effect: the monk is poisoned or drunk)", target.label()),
            Reading::tainted("Protection applied", "Protection has no effect"),
        )
    } else {
        (
            format!("Protect {}", target.label()),
            Reading::truthful("Protection applied"),
        )
    };
    let suggestion = suggest(ctx, "monk", seat_id, "protect")
        .title("Monk protection")
        .description(description)
        .priority(90)
        .confirm(false)
        .targets(&[target_id])
        .effect(reading);
    let status_changes = if tainted {
        Vec::new()
    } else {
        vec![StatusChange {
            seat_id: target_id,
            status: Status::Protected,
            action: StatusAction::Add,
            source: "monk".to_string(),
            duration: Some(StatusDuration::Night),
        }]
    };
    Ok(AbilityOutcome {
        suggestions: vec![suggestion],
        status_changes,
        ..AbilityOutcome::default()
    })
}

/// Prompt shown when a ravenkeeper dies at night.
pub(crate) fn ravenkeeper_prompt(ctx: &AbilityContext, seat_id: SeatId) -> Suggestion {
    suggest(ctx, "ravenkeeper", seat_id, "choose")
        .title("Ravenkeeper ability")
        .description("The ravenkeeper died tonight: choose a player to learn their role")
        .priority(95)
        .confirm(true)
        .action(vec![pick_player(
            "select_target",
            "Choose who to learn",
            "Choose a player whose role to learn",
        )])
}

pub fn ravenkeeper(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if !seat.is_dead {
        return Ok(AbilityOutcome::silent());
    }
    let Some(&target_id) = ctx.target_seat_ids.first() else {
        return Ok(AbilityOutcome::suggest(ravenkeeper_prompt(ctx, seat_id)));
    };
    let target = g.target(target_id)?;

    let tainted = seat.is_tainted();
    let real = target
        .role_id()
        .map(|r| g.role_name(r))
        .unwrap_or("unknown")
        .to_string();
    let reading = if tainted {
        let mut rng = rng_for(ctx, seat_id);
        let fake = any_role_name(g, &mut rng).unwrap_or(real.as_str()).to_string();
        Reading::tainted(fake, real)
    } else {
        Reading::truthful(real)
    };
    let suggestion = suggest(ctx, "ravenkeeper", seat_id, "info")
        .title("Ravenkeeper information")
        .description(format!(
            "Role of {}{}",
            target.label(),
            if tainted { " (poisoned or drunk)" } else { "" }
        ))
        .priority(95)
        .targets(&[target_id])
        .info(reading);
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn virgin(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if seat.has_used_ability {
        return Ok(AbilityOutcome::silent());
    }
    let Some(nominator_id) = ctx.additional.nominator_seat_id else {
        return Ok(AbilityOutcome::silent());
    };
    let nominator = g
        .seat(nominator_id)
        .ok_or(AbilityError::NominatorNotFound(nominator_id))?;
    let townsfolk = g.team_of(nominator) == Some(Team::Townsfolk);

    if seat.is_tainted() {
        let real = if townsfolk {
            format!("{} would have died", nominator.label())
        } else {
            "No effect".to_string()
        };
        let suggestion = suggest(ctx, "virgin", seat_id, "nominated")
            .title("Virgin ability")
            .description("The virgin is poisoned or drunk: the ability fails")
            .priority(100)
            .confirm(false)
            .info(Reading::tainted("No effect", real));
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    if !townsfolk {
        let suggestion = suggest(ctx, "virgin", seat_id, "nominated")
            .title("Virgin ability")
            .description(format!(
                "{} is not a townsfolk: nothing happens",
                nominator.label()
            ))
            .priority(80)
            .confirm(false)
            .info(Reading::truthful("No effect"));
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    let suggestion = suggest(ctx, "virgin", seat_id, "triggered")
        .title("Virgin ability triggered")
        .description(format!(
            "{} is a townsfolk and is executed immediately",
            nominator.label()
        ))
        .priority(100)
        .targets(&[nominator_id])
        .effect(Reading::truthful(format!("{} dies", nominator.label())));
    Ok(AbilityOutcome {
        suggestions: vec![suggestion],
        deaths: vec![DeathEvent {
            seat_id: nominator_id,
            cause: DeathCause::Ability,
            killer_role_id: Some("virgin".to_string()),
            is_preventable: false,
            was_prevented: false,
            prevented_by: None,
        }],
        ..AbilityOutcome::default()
    })
}

pub fn slayer(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if seat.has_used_ability {
        return Err(AbilityError::AbilityAlreadyUsed);
    }
    let Some(&target_id) = ctx.target_seat_ids.first() else {
        let suggestion = suggest(ctx, "slayer", seat_id, "choose")
            .title("Slayer ability")
            .description("Choose a player to shoot (once per game)")
            .priority(95)
            .confirm(true)
            .action(vec![pick_player(
                "select_target",
                "Choose a target",
                "Choose a player to shoot",
            )]);
        return Ok(AbilityOutcome::suggest(suggestion));
    };
    let target = g.target(target_id)?;
    let is_demon = g.team_of(target) == Some(Team::Demon);

    if seat.is_tainted() {
        let real = if is_demon { "Hit" } else { "Miss" };
        let suggestion = suggest(ctx, "slayer", seat_id, "shot")
            .title("Slayer ability")
            .description(format!(
                "Shoots {} (no effect: the slayer is poisoned or drunk)",
                target.label()
            ))
            .priority(95)
            .confirm(false)
            .targets(&[target_id])
            .effect(Reading::tainted("Miss", real));
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    if !is_demon {
        let suggestion = suggest(ctx, "slayer", seat_id, "shot")
            .title("Slayer ability")
            .description(format!("Shoots {}", target.label()))
            .priority(80)
            .confirm(false)
            .targets(&[target_id])
            .effect(Reading::truthful("Miss: the target is not the demon"));
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    if target.is_protected() {
        let suggestion = suggest(ctx, "slayer", seat_id, "shot")
            .title("Slayer shot blocked")
            .description(format!("{} is protected tonight", target.label()))
            .priority(95)
            .targets(&[target_id])
            .effect(Reading::truthful("The demon survives: protected"));
        return Ok(AbilityOutcome {
            suggestions: vec![suggestion],
            deaths: vec![DeathEvent {
                seat_id: target_id,
                cause: DeathCause::Slayer,
                killer_role_id: Some("slayer".to_string()),
                is_preventable: true,
                was_prevented: true,
                prevented_by: Some("monk".to_string()),
            }],
            ..AbilityOutcome::default()
        });
    }

    let suggestion = suggest(ctx, "slayer", seat_id, "hit")
        .title("Slayer hits!")
        .description(format!("{} is the demon and dies", target.label()))
        .priority(100)
        .targets(&[target_id])
        .effect(Reading::truthful(format!("{} dies", target.label())));
    Ok(AbilityOutcome {
        suggestions: vec![suggestion],
        deaths: vec![DeathEvent {
            seat_id: target_id,
            cause: DeathCause::Slayer,
            killer_role_id: Some("slayer".to_string()),
            is_preventable: false,
            was_prevented: false,
            prevented_by: None,
        }],
        ..AbilityOutcome::default()
    })
}

pub fn soldier(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let (description, reading) = if tainted {
        (
            "The soldier is poisoned or drunk",
            Reading::tainted("Immune to the demon", "Can be killed by the demon"),
        )
    } else {
        (
            "The soldier is safe from the demon",
            Reading::plain("Immune to the demon"),
        )
    };
    let suggestion = suggest(ctx, "soldier", seat_id, "status")
        .title("Soldier status")
        .description(description)
        .priority(50)
        .confirm(false)
        .info(reading);
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn mayor(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if g.state.alive_count() != 3 || seat.is_tainted() {
        return Ok(AbilityOutcome::silent());
    }
    let suggestion = suggest(ctx, "mayor", seat_id, "final-three")
        .title("Mayor win condition")
        .description("Three players remain: if nobody is executed today, good wins")
        .priority(100)
        .confirm(true)
        .warning(
            Reading::plain("No execution today means good wins"),
            Vec::new(),
        );
    Ok(AbilityOutcome::suggest(suggestion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roles::helpers::fixtures::*;
    use crate::schema::ability::{AdditionalData, AutomationLevel, SuggestionKind};

    #[test]
    fn washerwoman_names_a_real_townsfolk() {
        let state = table(&["washerwoman", "chef", "imp", "poisoner", "saint"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = washerwoman(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
        let s = &out.suggestions[0];
        assert!(!s.is_tainted());
        assert!(s.real_result().unwrap().ends_with("is the Chef"));
        assert!(s.target_seat_ids.contains(&SeatId(1)));
        assert_eq!(s.options().len(), 2);
    }

    #[test]
    fn poisoned_washerwoman_is_marked_tainted() {
        let mut state = table(&["washerwoman", "chef", "imp", "poisoner", "saint"]);
        poison(&mut state, 0);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = washerwoman(&g, SeatId(0), &night(1, AutomationLevel::FullAuto)).unwrap();
        let s = &out.suggestions[0];
        assert!(s.is_tainted());
        assert!(s.options().is_empty());
        assert!(!s.requires_confirmation);
    }

    #[test]
    fn librarian_without_outsiders() {
        let state = table(&["librarian", "chef", "imp", "poisoner", "empath"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = librarian(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
        assert_eq!(
            out.suggestions[0].suggested_result(),
            Some("There are no outsiders in play")
        );
    }

    #[test]
    fn investigator_finds_the_minion() {
        let state = table(&["investigator", "chef", "imp", "baron", "empath"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = investigator(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
        let s = &out.suggestions[0];
        assert!(s.real_result().unwrap().ends_with("is the Baron"));
        assert_eq!(s.priority, 75);
    }

    #[test]
    fn chef_counts_adjacent_evil() {
        let state = table(&["chef", "imp", "poisoner", "empath", "monk"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = chef(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
        assert_eq!(
            out.suggestions[0].real_result(),
            Some("1 pair of evil players sit next to each other")
        );
    }

    #[test]
    fn poisoned_chef_lies() {
        let mut state = table(&["chef", "imp", "poisoner", "empath", "monk"]);
        poison(&mut state, 0);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        for seed in 0..10 {
            let ctx = night(1, AutomationLevel::Guided).with_seed(seed);
            let s = &chef(&g, SeatId(0), &ctx).unwrap().suggestions[0];
            assert!(s.is_tainted());
            assert_ne!(s.suggested_result(), s.real_result());
        }
    }

    #[test]
    fn empath_walks_past_the_dead() {
        let mut state = table(&["empath", "chef", "imp", "monk", "poisoner"]);
        kill(&mut state, 1);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = empath(&g, SeatId(0), &night(2, AutomationLevel::Guided)).unwrap();
        let s = &out.suggestions[0];
        assert_eq!(s.real_result(), Some("2 of your living neighbours are evil"));
        assert_eq!(s.target_seat_ids, vec![SeatId(4), SeatId(2)]);
    }

    #[test]
    fn fortune_teller_prompts_then_reads() {
        let state = table(&["fortune_teller", "chef", "imp", "monk", "poisoner"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let ctx = night(1, AutomationLevel::FullAuto);
        let prompt = fortune_teller(&g, SeatId(0), &ctx).unwrap();
        assert_eq!(prompt.suggestions[0].kind_name(), "action");
        assert_eq!(prompt.suggestions[0].recommended_option().unwrap().id, "random");

        let hit = fortune_teller(&g, SeatId(0), &ctx.clone().with_targets(&[1, 2])).unwrap();
        assert_eq!(hit.suggestions[0].real_result(), Some("Yes"));
        let miss = fortune_teller(&g, SeatId(0), &ctx.with_targets(&[1, 3])).unwrap();
        assert_eq!(miss.suggestions[0].real_result(), Some("No"));
    }

    #[test]
    fn fortune_teller_red_herring_reads_yes() {
        let state = table(&["fortune_teller", "chef", "imp", "monk", "poisoner"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let ctx = night(1, AutomationLevel::Guided)
            .with_targets(&[1, 3])
            .with_additional(AdditionalData {
                red_herring_seat_id: Some(SeatId(3)),
                ..AdditionalData::default()
            });
        let out = fortune_teller(&g, SeatId(0), &ctx).unwrap();
        assert_eq!(out.suggestions[0].real_result(), Some("Yes"));
    }

    #[test]
    fn fortune_teller_needs_both_targets() {
        let state = table(&["fortune_teller", "chef", "imp"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let one = night(1, AutomationLevel::Guided).with_targets(&[1]);
        assert_eq!(
            fortune_teller(&g, SeatId(0), &one),
            Err(AbilityError::TargetUnspecified)
        );
        let missing = night(1, AutomationLevel::Guided).with_targets(&[1, 9]);
        assert_eq!(
            fortune_teller(&g, SeatId(0), &missing),
            Err(AbilityError::TargetNotFound(SeatId(9)))
        );
    }

    #[test]
    fn undertaker_reports_the_execution() {
        let mut state = table(&["undertaker", "chef", "imp", "saint"]);
        kill(&mut state, 3);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        assert!(undertaker(&g, SeatId(0), &night(1, AutomationLevel::Guided))
            .unwrap()
            .suggestions
            .is_empty());

        let quiet = undertaker(&g, SeatId(0), &night(2, AutomationLevel::Guided)).unwrap();
        assert_eq!(quiet.suggestions[0].priority, 60);

        let ctx = night(2, AutomationLevel::Guided).with_additional(AdditionalData {
            executed_seat_id: Some(SeatId(3)),
            ..AdditionalData::default()
        });
        let out = undertaker(&g, SeatId(0), &ctx).unwrap();
        assert_eq!(
            out.suggestions[0].real_result(),
            Some("The executed player was the Saint")
        );

        let bad = night(2, AutomationLevel::Guided).with_additional(AdditionalData {
            executed_seat_id: Some(SeatId(12)),
            ..AdditionalData::default()
        });
        assert_eq!(
            undertaker(&g, SeatId(0), &bad),
            Err(AbilityError::ExecutedSeatNotFound(SeatId(12)))
        );
    }

    #[test]
    fn monk_protects_unless_poisoned() {
        let mut state = table(&["monk", "chef", "imp", "empath"]);
        let script = tb();
        let ctx = night(2, AutomationLevel::Guided).with_targets(&[3]);
        {
            let g = Grimoire::new(&state, &script);
            let out = monk(&g, SeatId(0), &ctx).unwrap();
            assert_eq!(out.status_changes.len(), 1);
            assert_eq!(out.status_changes[0].status, Status::Protected);
            assert_eq!(out.status_changes[0].duration, Some(StatusDuration::Night));
        }
        poison(&mut state, 0);
        let g = Grimoire::new(&state, &script);
        let out = monk(&g, SeatId(0), &ctx).unwrap();
        assert_eq!(out.suggestions.len(), 1);
        assert!(out.suggestions[0].is_tainted());
        assert!(out.status_changes.is_empty());
    }

    #[test]
    fn full_auto_monk_recommends_an_information_role() {
        let state = table(&["monk", "chef", "imp", "empath"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = monk(&g, SeatId(0), &night(2, AutomationLevel::FullAuto)).unwrap();
        let rec = out.suggestions[0].recommended_option().unwrap();
        assert_eq!(rec.result, "3");
    }

    #[test]
    fn ravenkeeper_only_acts_when_dead() {
        let mut state = table(&["ravenkeeper", "chef", "imp"]);
        let script = tb();
        let ctx = night(2, AutomationLevel::Guided).with_targets(&[2]);
        {
            let g = Grimoire::new(&state, &script);
            assert!(ravenkeeper(&g, SeatId(0), &ctx).unwrap().suggestions.is_empty());
        }
        kill(&mut state, 0);
        let g = Grimoire::new(&state, &script);
        let out = ravenkeeper(&g, SeatId(0), &ctx).unwrap();
        assert_eq!(out.suggestions[0].real_result(), Some("Imp"));
    }

    #[test]
    fn virgin_executes_townsfolk_nominator() {
        let state = table(&["virgin", "chef", "imp"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let nominated_by = |seat| {
            night(1, AutomationLevel::Guided).with_additional(AdditionalData {
                nominator_seat_id: Some(SeatId(seat)),
                ..AdditionalData::default()
            })
        };
        let out = virgin(&g, SeatId(0), &nominated_by(1)).unwrap();
        assert_eq!(out.deaths.len(), 1);
        assert_eq!(out.deaths[0].seat_id, SeatId(1));
        assert_eq!(out.deaths[0].cause, DeathCause::Ability);

        let out = virgin(&g, SeatId(0), &nominated_by(2)).unwrap();
        assert!(out.deaths.is_empty());

        assert_eq!(
            virgin(&g, SeatId(0), &nominated_by(7)),
            Err(AbilityError::NominatorNotFound(SeatId(7)))
        );
    }

    #[test]
    fn poisoned_virgin_has_no_effect() {
        let mut state = table(&["virgin", "chef", "imp"]);
        poison(&mut state, 0);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let ctx = night(1, AutomationLevel::Guided).with_additional(AdditionalData {
            nominator_seat_id: Some(SeatId(1)),
            ..AdditionalData::default()
        });
        let out = virgin(&g, SeatId(0), &ctx).unwrap();
        assert!(out.deaths.is_empty());
        assert!(out.suggestions[0].is_tainted());
    }

    #[test]
    fn slayer_kills_only_the_demon() {
        let mut state = table(&["slayer", "chef", "imp"]);
        let script = tb();
        {
            let g = Grimoire::new(&state, &script);
            let hit = slayer(&g, SeatId(0), &night(1, AutomationLevel::Guided).with_targets(&[2]))
                .unwrap();
            assert_eq!(hit.deaths[0].cause, DeathCause::Slayer);
            let miss = slayer(&g, SeatId(0), &night(1, AutomationLevel::Guided).with_targets(&[1]))
                .unwrap();
            assert!(miss.deaths.is_empty());
        }
        state.seats[0].has_used_ability = true;
        let g = Grimoire::new(&state, &script);
        assert_eq!(
            slayer(&g, SeatId(0), &night(1, AutomationLevel::Guided)),
            Err(AbilityError::AbilityAlreadyUsed)
        );
    }

    #[test]
    fn poisoned_slayer_misses() {
        let mut state = table(&["slayer", "chef", "imp"]);
        poison(&mut state, 0);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = slayer(&g, SeatId(0), &night(1, AutomationLevel::Guided).with_targets(&[2]))
            .unwrap();
        assert!(out.deaths.is_empty());
        assert_eq!(out.suggestions[0].suggested_result(), Some("Miss"));
        assert_eq!(out.suggestions[0].real_result(), Some("Hit"));
    }

    #[test]
    fn mayor_warns_at_final_three() {
        let mut state = table(&["mayor", "chef", "imp", "monk"]);
        let script = tb();
        {
            let g = Grimoire::new(&state, &script);
            assert!(mayor(&g, SeatId(0), &night(3, AutomationLevel::Guided))
                .unwrap()
                .suggestions
                .is_empty());
        }
        kill(&mut state, 3);
        let g = Grimoire::new(&state, &script);
        let out = mayor(&g, SeatId(0), &night(3, AutomationLevel::Guided)).unwrap();
        assert!(matches!(out.suggestions[0].kind, SuggestionKind::Warning { .. }));
    }

    #[test]
    fn missing_actor_is_an_error() {
        let state = table(&["chef"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        assert_eq!(
            soldier(&g, SeatId(5), &night(1, AutomationLevel::Guided)),
            Err(AbilityError::SeatNotFound(SeatId(5)))
        );
    }

    #[test]
    fn tainted_status_readings_carry_the_truth() {
        let mut state = table(&["soldier", "spy", "recluse", "imp", "poisoner"]);
        for seat in 0..3 {
            poison(&mut state, seat);
        }
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let ctx = night(2, AutomationLevel::Guided);
        let outs = [
            soldier(&g, SeatId(0), &ctx).unwrap(),
            crate::core::roles::minions::spy(&g, SeatId(1), &ctx).unwrap(),
            crate::core::roles::outsiders::recluse(&g, SeatId(2), &ctx).unwrap(),
        ];
        for out in &outs {
            let s = &out.suggestions[0];
            assert!(s.is_tainted());
            assert!(s.real_result().is_some());
        }
        assert_eq!(outs[0].suggestions[0].real_result(), Some("Can be killed by the demon"));

        let healthy = table(&["soldier", "imp"]);
        let g = Grimoire::new(&healthy, &script);
        let out = soldier(&g, SeatId(0), &ctx).unwrap();
        assert!(!out.suggestions[0].is_tainted());
    }
}
