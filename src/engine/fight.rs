//! Fighting operation.
//!
//! Monsters are chosen from a level band around the character level
//! (by default 50% below to 10% above). The strongest monster in the band
//! wins, ties broken by distance and then code, so the choice is
//! reproducible.

use std::cmp::Reverse;

use super::actions;
use super::bank;
use super::context::CharacterContext;
use super::movement;
use super::{EngineError, EngineResult};
use crate::api::LocationQuery;
use crate::models::monster::{join_locations, level_band};
use crate::models::location::locations_to_map;
use crate::models::{calculate_distance, Character, Coords, LocationKind, Monster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FightStop {
    InventoryFull,
    Defeated,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FightOutcome {
    pub fights: u32,
    pub wins: u32,
    pub stop: FightStop,
}

pub fn choose_monster(from: Coords, monsters: Vec<Monster>) -> Option<Monster> {
    monsters
        .into_iter()
        .filter(|m| m.location.is_some())
        .min_by(|a, b| {
            let da = a.coords().map(|c| calculate_distance(from, c));
            let db = b.coords().map(|c| calculate_distance(from, c));
            (Reverse(a.level), da, &a.code).cmp(&(Reverse(b.level), db, &b.code))
        })
}

/// Fight the monster at its tile until the inventory fills up, the
/// character loses, or shutdown is requested.
pub async fn fight_until_done(
    ctx: &CharacterContext,
    character: &mut Character,
    monster: &Monster,
) -> EngineResult<FightOutcome> {
    let coords = monster
        .coords()
        .ok_or_else(|| EngineError::NotFound(format!("location of monster {}", monster.code)))?;
    movement::move_to(ctx, character, coords).await?;
    ctx.log().info(format_args!(
        "fighting {} (level {}) at {}",
        monster.code, monster.level, coords
    ));

    let mut outcome = FightOutcome {
        fights: 0,
        wins: 0,
        stop: FightStop::Cancelled,
    };
    loop {
        if ctx.is_cancelled() {
            outcome.stop = FightStop::Cancelled;
            return Ok(outcome);
        }
        if ctx.should_bank(character) {
            outcome.stop = FightStop::InventoryFull;
            return Ok(outcome);
        }
        let result = actions::fight(ctx, character).await?;
        outcome.fights += 1;
        if !result.won() {
            ctx.log()
                .warn(format_args!("lost against {} after {} turns", monster.code, result.turns));
            outcome.stop = FightStop::Defeated;
            return Ok(outcome);
        }
        outcome.wins += 1;
    }
}

/// Fight operation
pub async fn fight(ctx: &CharacterContext) -> EngineResult<FightOutcome> {
    let mut character = ctx.refresh_character().await?;
    if ctx.should_bank(&character) {
        bank::deposit_all(ctx, &mut character).await?;
    }

    let settings = ctx.settings();
    let (min, max) = level_band(
        character.level,
        settings.monster_level_floor,
        settings.monster_level_ceiling,
    );
    let monsters = ctx.api().get_monsters(min, max).await?;
    let tiles = ctx
        .api()
        .get_locations(&LocationQuery::kind(LocationKind::Monster))
        .await?;
    let placed = join_locations(monsters, &locations_to_map(&tiles));
    let monster = choose_monster(character.position(), placed)
        .ok_or_else(|| EngineError::NotFound(format!("monster between level {} and {}", min, max)))?;

    let outcome = fight_until_done(ctx, &mut character, &monster).await?;
    ctx.log().info(format_args!(
        "won {}/{} fights against {}",
        outcome.wins, outcome.fights, monster.code
    ));
    Ok(outcome)
}
