/// Minion processors.
use rand::seq::SliceRandom;

use super::helpers::{pick_player, prefer_roles, rng_for, suggest, Grimoire};
use crate::core::game_end::SUCCESSOR_MIN_ALIVE;
use crate::schema::ability::{
    AbilityContext, AbilityOutcome, AbilityResult, AutomationOption, ChainReaction,
    ChainReactionKind, InputKind, Reading, StatusAction, StatusChange, StatusDuration,
};
use crate::schema::seat::{SeatId, Status, Team};

pub fn poisoner(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let Some(&target_id) = ctx.target_seat_ids.first() else {
        let mut options = vec![pick_player(
            "select_target",
            "Choose a target",
            "Choose a player to poison",
        )];
        if ctx.is_full_auto() {
            let pool = g.alive_others(seat_id);
            let mut rng = rng_for(ctx, seat_id);
            let pick = prefer_roles(&pool, &["empath", "fortune_teller", "slayer", "monk"])
                .or_else(|| pool.choose(&mut rng).copied());
            if let Some(pick) = pick {
                options.push(
                    AutomationOption::new(
                        "recommended",
                        format!("Recommended: poison {}", pick.label()),
                        pick.id.to_string(),
                    )
                    .described("Suggested target")
                    .recommended(true),
                );
            }
        }
        let suggestion = suggest(ctx, "poisoner", seat_id, "choose")
            .title("Poisoner chooses a target")
            .description("Choose a player to poison")
            .priority(95)
            .confirm(true)
            .action(options);
        return Ok(AbilityOutcome::suggest(suggestion));
    };
    let target = g.target(target_id)?;

    if seat.is_tainted() {
        let suggestion = suggest(ctx, "poisoner", seat_id, "poison")
            .title("Poisoner poisons")
            .description(format!(
                "Poisons {} (no effect: the poisoner is drunk)",
                target.label()
            ))
            .priority(95)
            .confirm(false)
            .targets(&[target_id])
            .effect(Reading::tainted(
                format!("{} is poisoned", target.label()),
                "Nobody is poisoned",
            ));
        return Ok(AbilityOutcome::suggest(suggestion));
    }

    let suggestion = suggest(ctx, "poisoner", seat_id, "poison")
        .title("Poisoner poisons")
        .description(format!("Poisons {}", target.label()))
        .priority(95)
        .confirm(false)
        .targets(&[target_id])
        .effect(Reading::truthful(format!("{} is poisoned", target.label())));
    Ok(AbilityOutcome {
        suggestions: vec![suggestion],
        status_changes: vec![StatusChange {
            seat_id: target_id,
            status: Status::Poisoned,
            action: StatusAction::Add,
            source: "poisoner".to_string(),
            duration: Some(StatusDuration::Day),
        }],
        ..AbilityOutcome::default()
    })
}

pub fn spy(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let (description, reading) = if tainted {
        (
            "The spy is poisoned or drunk",
            Reading::tainted("Grimoire access: full", "Grimoire access: none"),
        )
    } else {
        ("The spy sees the grimoire", Reading::plain("Grimoire access: full"))
    };
    let mut suggestions = vec![suggest(ctx, "spy", seat_id, "grimoire")
        .title("Spy ability")
        .description(description)
        .priority(50)
        .confirm(false)
        .info(reading)];
    if ctx.is_guided() {
        suggestions.push(
            suggest(ctx, "spy", seat_id, "registration")
                .title("Spy registration")
                .description("How the spy registers when detected by information roles")
                .priority(40)
                .confirm(false)
                .info_with(
                    Reading::plain("Choose how the spy registers"),
                    vec![
                        AutomationOption::new("show_evil", "Register as evil", "evil")
                            .described("Register normally as a minion"),
                        AutomationOption::new("show_good", "Register as good", "good")
                            .described("Register as a townsfolk or outsider"),
                        AutomationOption::input(
                            "show_specific",
                            "Register as a specific role",
                            InputKind::Role,
                            "Choose the good role the spy registers as",
                        ),
                    ],
                ),
        );
    }
    Ok(AbilityOutcome {
        suggestions,
        ..AbilityOutcome::default()
    })
}

pub fn scarlet_woman(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let alive = g.state.alive_count();
    let enough = alive >= SUCCESSOR_MIN_ALIVE;

    if ctx.additional.demon_died && enough {
        let new_role = g
            .script
            .roles_of_team(Team::Demon)
            .next()
            .map(|r| r.id.clone())
            .unwrap_or_else(|| "imp".to_string());
        let new_name = g.script.role_name(&new_role).to_string();
        let suggestion = suggest(ctx, "scarlet_woman", seat_id, "transform")
            .title("Scarlet Woman becomes the demon!")
            .description(format!(
                "The demon died with {alive} players alive: the scarlet woman takes over"
            ))
            .priority(100)
            .targets(&[seat_id])
            .effect(Reading::truthful(format!(
                "{} becomes the {}",
                seat.label(),
                new_name
            )));
        return Ok(AbilityOutcome {
            suggestions: vec![suggestion],
            chain_reactions: vec![ChainReaction {
                kind: ChainReactionKind::SuccessorTransform,
                description: format!("Scarlet Woman becomes the {new_name}"),
                target_seat_id: Some(seat_id),
                new_role_id: Some(new_role),
            }],
            ..AbilityOutcome::default()
        });
    }

    let (description, text) = if enough {
        (
            "If the demon dies, the scarlet woman becomes the demon".to_string(),
            "Waiting",
        )
    } else {
        (
            format!("Only {alive} players alive: the scarlet woman cannot take over"),
            "Inactive",
        )
    };
    let suggestion = suggest(ctx, "scarlet_woman", seat_id, "status")
        .title("Scarlet Woman status")
        .description(description)
        .priority(60)
        .confirm(false)
        .info(Reading::plain(text));
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn baron(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    g.actor(seat_id)?;
    let suggestion = suggest(ctx, "baron", seat_id, "setup")
        .title("Baron in play")
        .description("The baron adds two outsiders to the setup")
        .priority(80)
        .confirm(false)
        .info(Reading::plain("Add two outsiders when assigning roles"));
    Ok(AbilityOutcome::suggest(suggestion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roles::helpers::fixtures::*;
    use crate::schema::ability::{AdditionalData, AutomationLevel};

    #[test]
    fn poisoner_adds_a_day_long_poison() {
        let state = table(&["poisoner", "chef", "imp"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = poisoner(&g, SeatId(0), &night(1, AutomationLevel::Guided).with_targets(&[1]))
            .unwrap();
        let change = &out.status_changes[0];
        assert_eq!(change.seat_id, SeatId(1));
        assert_eq!(change.status, Status::Poisoned);
        assert_eq!(change.duration, Some(StatusDuration::Day));
    }

    #[test]
    fn full_auto_poisoner_targets_information() {
        let state = table(&["poisoner", "chef", "imp", "fortune_teller"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = poisoner(&g, SeatId(0), &night(1, AutomationLevel::FullAuto)).unwrap();
        assert_eq!(out.suggestions[0].recommended_option().unwrap().result, "3");
    }

    #[test]
    fn spy_registration_menu_only_when_guided() {
        let state = table(&["spy", "chef", "imp"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        assert_eq!(
            spy(&g, SeatId(0), &night(1, AutomationLevel::Guided))
                .unwrap()
                .suggestions
                .len(),
            2
        );
        assert_eq!(
            spy(&g, SeatId(0), &night(1, AutomationLevel::FullAuto))
                .unwrap()
                .suggestions
                .len(),
            1
        );
    }

    #[test]
    fn scarlet_woman_needs_five_alive() {
        let mut state = table(&["scarlet_woman", "chef", "imp", "monk", "empath"]);
        kill(&mut state, 2);
        let script = tb();
        let ctx = night(2, AutomationLevel::Guided).with_additional(AdditionalData {
            demon_died: true,
            ..AdditionalData::default()
        });
        {
            let g = Grimoire::new(&state, &script);
            let out = scarlet_woman(&g, SeatId(0), &ctx).unwrap();
            assert!(out.chain_reactions.is_empty());
        }
        state.seats.push(crate::schema::seat::Seat::occupied(5, "Flo", "saint"));
        let g = Grimoire::new(&state, &script);
        let out = scarlet_woman(&g, SeatId(0), &ctx).unwrap();
        let reaction = &out.chain_reactions[0];
        assert_eq!(reaction.kind, ChainReactionKind::SuccessorTransform);
        assert_eq!(reaction.new_role_id.as_deref(), Some("imp"));
    }
}
