/// Demon processors.
use rand::seq::SliceRandom;
use tracing::debug;

use super::helpers::{pick_player, prefer_roles, rng_for, suggest, Grimoire};
use super::townsfolk::ravenkeeper_prompt;
use crate::core::script::RoleTrait;
use crate::schema::ability::{
    AbilityContext, AbilityError, AbilityOutcome, AbilityResult, AutomationOption, ChainReaction,
    ChainReactionKind, DeathCause, DeathEvent, Reading, Suggestion,
};
use crate::schema::seat::{Seat, SeatId};

pub fn imp(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if ctx.is_first_night {
        return Ok(AbilityOutcome::silent());
    }
    let Some(&target_id) = ctx.target_seat_ids.first() else {
        return Ok(AbilityOutcome::suggest(kill_prompt(g, seat, ctx)));
    };
    let target = g.target(target_id)?;
    if target_id == seat_id {
        return self_kill(g, seat, ctx);
    }

    let prevented_by = if target.is_protected() {
        Some("monk")
    } else if g.has_trait(target, RoleTrait::DemonImmune) && !target.is_tainted() {
        target.role_id()
    } else {
        None
    };

    if prevented_by.is_none() && seat.is_tainted() {
        let suggestion = suggest(ctx, "imp", seat_id, "kill")
            .title("Imp kill")
            .description(format!(
                "Attacks {} (no effect: the imp is poisoned or drunk)",
                target.label()
            ))
            .priority(100)
            .targets(&[target_id])
            .effect(Reading::tainted(
                format!("{} dies", target.label()),
                "Nobody dies",
            ));
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    match prevented_by {
        Some(blocker) => Ok(blocked_kill(g, seat, target, blocker, ctx)),
        None => {
            let mut suggestions = vec![suggest(ctx, "imp", seat_id, "kill")
                .title("Imp kill")
                .description(format!("Kills {}", target.label()))
                .priority(100)
                .targets(&[target_id])
                .effect(Reading::truthful(format!("{} dies", target.label())))];
            if target.holds_role("ravenkeeper") && !target.is_tainted() {
                suggestions.push(ravenkeeper_prompt(ctx, target_id));
            }
            Ok(AbilityOutcome {
                suggestions,
                deaths: vec![DeathEvent {
                    seat_id: target_id,
                    cause: DeathCause::DemonKill,
                    killer_role_id: Some("imp".to_string()),
                    is_preventable: false,
                    was_prevented: false,
                    prevented_by: None,
                }],
                ..AbilityOutcome::default()
            })
        }
    }
}

/// Other living evil players a demon can pass the role to.
fn successors<'a>(g: &Grimoire<'a>, demon: &Seat) -> Vec<&'a Seat> {
    g.alive_others(demon.id)
        .into_iter()
        .filter(|s| g.is_evil(s))
        .collect()
}

fn kill_prompt(g: &Grimoire<'_>, seat: &Seat, ctx: &AbilityContext) -> Suggestion {
    let mut options = Vec::new();
    if ctx.is_full_auto() {
        let pool: Vec<&Seat> = g
            .alive_others(seat.id)
            .into_iter()
            .filter(|s| !s.is_protected())
            .collect();
        let mut rng = rng_for(ctx, seat.id);
        let pick = prefer_roles(&pool, &["slayer", "fortune_teller", "empath", "mayor"])
            .or_else(|| pool.choose(&mut rng).copied());
        if let Some(pick) = pick {
            options.push(
                AutomationOption::new(
                    "recommended",
                    format!("Recommended: kill {}", pick.label()),
                    pick.id.to_string(),
                )
                .recommended(true),
            );
        }
    }
    options.push(pick_player(
        "select_target",
        "Choose a victim",
        "Choose a player to kill",
    ));
    let heirs = successors(g, seat);
    if !heirs.is_empty() {
        let names: Vec<String> = heirs.iter().map(|s| s.label()).collect();
        options.push(
            AutomationOption::new("self_kill", "Kill yourself and pass the demon on", "self_kill")
                .described(format!("One of {} becomes the new demon", names.join(", "))),
        );
    }
    suggest(ctx, "imp", seat.id, "choose")
        .title("Imp kill")
        .description("Choose a player to kill")
        .priority(100)
        .confirm(true)
        .action(options)
}

fn blocked_kill(
    g: &Grimoire<'_>,
    seat: &Seat,
    target: &Seat,
    blocker: &str,
    ctx: &AbilityContext,
) -> AbilityOutcome {
    let blocker_name = match blocker {
        "monk" => "the monk's protection".to_string(),
        role => format!("the {}", g.script.role_name(role)),
    };
    debug!(seat = %target.id, blocker, "demon kill prevented");
    let mut suggestions = vec![suggest(ctx, "imp", seat.id, "blocked")
        .title("Imp kill prevented")
        .description(format!(
            "Attacked {}, but {} stopped it",
            target.label(),
            blocker_name
        ))
        .priority(95)
        .targets(&[target.id])
        .effect(Reading::truthful(format!("Kill failed: {blocker_name}")))];
    if ctx.is_guided() {
        suggestions.push(
            suggest(ctx, "imp", seat.id, "override")
                .title("Override the rules?")
                .description(format!("Kill {} anyway, ignoring {}?", target.label(), blocker_name))
                .priority(90)
                .confirm(true)
                .warning(
                    Reading::plain("The kill was prevented"),
                    vec![
                        AutomationOption::new("respect_rule", "Follow the rules", "blocked")
                            .described("The kill is prevented")
                            .recommended(true),
                        AutomationOption::new("override_rule", "Force the kill", "override")
                            .described("Ignore the protection"),
                    ],
                ),
        );
    }
    AbilityOutcome {
        suggestions,
        deaths: vec![DeathEvent {
            seat_id: target.id,
            cause: DeathCause::DemonKill,
            killer_role_id: Some("imp".to_string()),
            is_preventable: true,
            was_prevented: true,
            prevented_by: Some(blocker.to_string()),
        }],
        ..AbilityOutcome::default()
    }
}

fn heir_options(g: &Grimoire<'_>, heirs: &[&Seat]) -> Vec<AutomationOption> {
    heirs
        .iter()
        .map(|heir| {
            let role = heir.role_id().map(|r| g.role_name(r)).unwrap_or("unknown");
            AutomationOption::new(
                &format!("minion_{}", heir.id),
                format!("Pass to {}", heir.label()),
                heir.id.to_string(),
            )
            .described(role)
            .recommended(heirs.len() == 1)
        })
        .collect()
}

fn self_kill(g: &Grimoire<'_>, seat: &Seat, ctx: &AbilityContext) -> AbilityResult {
    let heirs = successors(g, seat);
    if heirs.is_empty() {
        let suggestion = suggest(ctx, "imp", seat.id, "self-kill")
            .title("Demon transfer failed")
            .description("No living evil player can become the new demon")
            .priority(100)
            .confirm(true)
            .warning(Reading::plain("The imp cannot kill themselves"), Vec::new());
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    let chosen = ctx
        .additional
        .new_demon_seat_id
        .or_else(|| ctx.is_full_auto().then(|| heirs[0].id));
    let Some(heir_id) = chosen else {
        let options = heir_options(g, &heirs);
        let suggestion = suggest(ctx, "imp", seat.id, "self-kill")
            .title("Imp passes the demon on")
            .description("Choose who becomes the new demon")
            .priority(100)
            .confirm(true)
            .action(options);
        return Ok(AbilityOutcome::suggest(suggestion));
    };
    let heir = g
        .seat(heir_id)
        .ok_or(AbilityError::NewDemonNotFound(heir_id))?;
    if !heirs.iter().any(|h| h.id == heir_id) {
        debug!(seat = %heir_id, "ineligible demon successor");
        let options = heir_options(g, &heirs);
        let suggestion = suggest(ctx, "imp", seat.id, "self-kill")
            .title("Demon transfer refused")
            .description(format!(
                "{} is not a living evil player and cannot become the demon",
                heir.label()
            ))
            .priority(100)
            .confirm(true)
            .warning(Reading::plain("Choose a living minion instead"), options);
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    let role_id = seat.role_id().unwrap_or("imp").to_string();
    let role_name = g.script.role_name(&role_id).to_string();
    let suggestion = suggest(ctx, "imp", seat.id, "self-kill")
        .title("Imp passes the demon on")
        .description(format!(
            "The imp kills themselves and {} becomes the new demon",
            heir.label()
        ))
        .priority(100)
        .targets(&[seat.id, heir_id])
        .effect(Reading::truthful(format!(
            "{} becomes the {}",
            heir.label(),
            role_name
        )));
    Ok(AbilityOutcome {
        suggestions: vec![suggestion],
        deaths: vec![DeathEvent {
            seat_id: seat.id,
            cause: DeathCause::Ability,
            killer_role_id: Some(role_id.clone()),
            is_preventable: false,
            was_prevented: false,
            prevented_by: None,
        }],
        chain_reactions: vec![ChainReaction {
            kind: ChainReactionKind::RoleTransfer,
            description: format!("{} passes to {}", role_name, heir.label()),
            target_seat_id: Some(heir_id),
            new_role_id: Some(role_id),
        }],
        ..AbilityOutcome::default()
    })
}
