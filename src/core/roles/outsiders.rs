/// Outsider processors.
use rand::seq::SliceRandom;

use super::helpers::{pick_player, rng_for, suggest, Grimoire};
use crate::schema::ability::{
    AbilityContext, AbilityOutcome, AbilityResult, AutomationOption, GameEnd, Reading,
};
use crate::schema::game::Winner;
use crate::schema::seat::SeatId;

pub fn butler(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    g.actor(seat_id)?;
    let Some(&master_id) = ctx.target_seat_ids.first() else {
        let mut options = vec![pick_player(
            "select_master",
            "Choose a master",
            "Choose your master for tomorrow",
        )];
        if ctx.is_full_auto() {
            let pool = g.alive_others(seat_id);
            let mut rng = rng_for(ctx, seat_id);
            if let Some(pick) = pool.choose(&mut rng) {
                options.push(
                    AutomationOption::new("random", "Pick at random", pick.id.to_string())
                        .recommended(true),
                );
            }
        }
        let suggestion = suggest(ctx, "butler", seat_id, "choose")
            .title("Butler chooses a master")
            .description("Choose a player to be the butler's master tomorrow")
            .priority(60)
            .confirm(true)
            .action(options);
        return Ok(AbilityOutcome::suggest(suggestion));
    };
    let master = g.target(master_id)?;
    let suggestion = suggest(ctx, "butler", seat_id, "master")
        .title("Butler chooses a master")
        .description(format!("{} is the butler's master", master.label()))
        .priority(60)
        .confirm(false)
        .targets(&[master_id])
        .effect(Reading::plain(format!("Master: {}", master.label())));
    Ok(AbilityOutcome::suggest(suggestion))
}

/// Reminds the storyteller that this player's ability does nothing.
pub fn drunk(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if !seat.holds_role("drunk") {
        return Ok(AbilityOutcome::silent());
    }
    let description = match seat.seen_role_id.as_deref() {
        Some(seen) if seen != "drunk" => format!(
            "The player believes they are the {} but is the Drunk",
            g.role_name(seen)
        ),
        _ => "The drunk has no believed role set".to_string(),
    };
    let suggestion = suggest(ctx, "drunk", seat_id, "status")
        .title("Drunk status")
        .description(description)
        .priority(90)
        .confirm(false)
        .info(Reading::plain("Their ability has no effect: give false information"));
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn recluse(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    let tainted = seat.is_tainted();
    let options = if ctx.is_guided() {
        vec![
            AutomationOption::new("show_good", "Register as good", "good"),
            AutomationOption::new("show_evil", "Register as evil", "evil"),
            AutomationOption::new("show_minion", "Register as a minion", "minion"),
            AutomationOption::new("show_demon", "Register as the demon", "demon"),
        ]
    } else {
        Vec::new()
    };
    let description = if tainted {
        "The recluse is poisoned or drunk and registers as good"
    } else {
        "The recluse may register as evil, as a minion or as the demon"
    };
    let prompt = "Choose how the recluse registers when information is generated";
    let reading = if tainted {
        Reading::tainted(prompt, "Registers as good")
    } else {
        Reading::plain(prompt)
    };
    let suggestion = suggest(ctx, "recluse", seat_id, "status")
        .title("Recluse status")
        .description(description)
        .priority(40)
        .confirm(false)
        .info_with(reading, options);
    Ok(AbilityOutcome::suggest(suggestion))
}

pub fn saint(g: &Grimoire<'_>, seat_id: SeatId, ctx: &AbilityContext) -> AbilityResult {
    let seat = g.actor(seat_id)?;
    if !ctx.additional.is_being_executed {
        let suggestion = suggest(ctx, "saint", seat_id, "warning")
            .title("Saint warning")
            .description("If the saint is executed, evil wins immediately")
            .priority(95)
            .confirm(false)
            .warning(Reading::plain("Be careful executing the saint"), Vec::new());
        return Ok(AbilityOutcome::suggest(suggestion));
    }
    if seat.is_tainted() {
        let suggestion = suggest(ctx, "saint", seat_id, "executed")
            .title("Saint executed")
            .description("The saint is poisoned or drunk: the game continues")
            .priority(100)
            .effect(Reading::tainted("The game continues", "The game continues"));
        return Ok(AbilityOutcome::suggest(suggestion));
    }
    let suggestion = suggest(ctx, "saint", seat_id, "executed")
        .title("Saint executed!")
        .description("The saint was executed: evil wins")
        .priority(100)
        .effect(Reading::truthful("Game over: evil wins"));
    Ok(AbilityOutcome {
        suggestions: vec![suggestion],
        game_end: Some(GameEnd {
            winner: Winner::Evil,
            reason: "The saint was executed".to_string(),
        }),
        ..AbilityOutcome::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roles::helpers::fixtures::*;
    use crate::schema::ability::{AbilityError, AdditionalData, AutomationLevel};

    #[test]
    fn butler_prompts_and_records_master() {
        let state = table(&["butler", "chef", "imp"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let prompt = butler(&g, SeatId(0), &night(1, AutomationLevel::FullAuto)).unwrap();
        let rec = prompt.suggestions[0].recommended_option().unwrap();
        assert_ne!(rec.result, "0");

        let chosen = butler(
            &g,
            SeatId(0),
            &night(1, AutomationLevel::Guided).with_targets(&[1]),
        )
        .unwrap();
        assert_eq!(chosen.suggestions[0].target_seat_ids, vec![SeatId(1)]);
        assert_eq!(
            butler(&g, SeatId(0), &night(1, AutomationLevel::Guided).with_targets(&[8])),
            Err(AbilityError::TargetNotFound(SeatId(8)))
        );
    }

    #[test]
    fn drunk_reports_believed_role() {
        let mut state = table(&["drunk", "chef", "imp"]);
        state.seats[0].seen_role_id = Some("empath".to_string());
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let out = drunk(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
        assert!(out.suggestions[0].description.contains("Empath"));

        let other = drunk(&g, SeatId(1), &night(1, AutomationLevel::Guided)).unwrap();
        assert!(other.suggestions.is_empty());
    }

    #[test]
    fn recluse_offers_registration_in_guided_mode() {
        let state = table(&["recluse", "chef", "imp"]);
        let script = tb();
        let g = Grimoire::new(&state, &script);
        let guided = recluse(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
        assert_eq!(guided.suggestions[0].options().len(), 4);
        let auto = recluse(&g, SeatId(0), &night(1, AutomationLevel::FullAuto)).unwrap();
        assert!(auto.suggestions[0].options().is_empty());
    }

    #[test]
    fn executed_saint_ends_the_game() {
        let mut state = table(&["saint", "chef", "imp"]);
        let script = tb();
        let ctx = night(1, AutomationLevel::Guided).with_additional(AdditionalData {
            is_being_executed: true,
            ..AdditionalData::default()
        });
        {
            let g = Grimoire::new(&state, &script);
            let out = saint(&g, SeatId(0), &ctx).unwrap();
            assert_eq!(out.game_end.map(|e| e.winner), Some(Winner::Evil));
            let calm = saint(&g, SeatId(0), &night(1, AutomationLevel::Guided)).unwrap();
            assert!(calm.game_end.is_none());
        }
        poison(&mut state, 0);
        let g = Grimoire::new(&state, &script);
        assert!(saint(&g, SeatId(0), &ctx).unwrap().game_end.is_none());
    }
}
