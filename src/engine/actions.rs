//! Single remote actions.
//!
//! Each helper waits for the character's cooldown, performs the call, copies
//! the returned character state into the caller's snapshot and then sleeps
//! out the new cooldown. Callers therefore never race the server.

use super::context::CharacterContext;
use super::cooldown;
use super::EngineResult;
use crate::api::{ActionResponse, FightResult, SkillInfo};
use crate::models::{Character, Coords};

async fn settle(ctx: &CharacterContext, character: &mut Character, response: ActionResponse) {
    *character = response.character;
    ctx.cooldown().observe(response.cooldown.expiration);
    cooldown::wait_until(ctx.log(), response.cooldown.expiration).await;
}

pub async fn move_to(
    ctx: &CharacterContext,
    character: &mut Character,
    coords: Coords,
) -> EngineResult<()> {
    ctx.cooldown().wait_ready(ctx.log()).await;
    ctx.log().debug(format_args!("moving to {}", coords));
    let response = ctx.api().move_to(ctx.name(), coords).await?;
    settle(ctx, character, response).await;
    Ok(())
}

pub async fn gather(ctx: &CharacterContext, character: &mut Character) -> EngineResult<SkillInfo> {
    ctx.cooldown().wait_ready(ctx.log()).await;
    let response = ctx.api().gather(ctx.name()).await?;
    ctx.log().debug(format_args!(
        "gathered {:?} (+{} xp)",
        response.details.items, response.details.xp
    ));
    settle(ctx, character, response.response).await;
    Ok(response.details)
}

pub async fn fight(ctx: &CharacterContext, character: &mut Character) -> EngineResult<FightResult> {
    ctx.cooldown().wait_ready(ctx.log()).await;
    let response = ctx.api().fight(ctx.name()).await?;
    ctx.log().debug(format_args!(
        "fight {} in {} turns (+{} xp, +{} gold)",
        response.fight.result, response.fight.turns, response.fight.xp, response.fight.gold
    ));
    settle(ctx, character, response.response).await;
    Ok(response.fight)
}

pub async fn craft(
    ctx: &CharacterContext,
    character: &mut Character,
    code: &str,
    quantity: u32,
) -> EngineResult<SkillInfo> {
    ctx.cooldown().wait_ready(ctx.log()).await;
    ctx.log().info(format_args!("crafting {} x{}", code, quantity));
    let response = ctx.api().craft(ctx.name(), code, quantity).await?;
    settle(ctx, character, response.response).await;
    Ok(response.details)
}

pub async fn deposit(
    ctx: &CharacterContext,
    character: &mut Character,
    code: &str,
    quantity: u32,
) -> EngineResult<()> {
    ctx.cooldown().wait_ready(ctx.log()).await;
    ctx.log().debug(format_args!("depositing {} x{}", code, quantity));
    let response = ctx.api().deposit(ctx.name(), code, quantity).await?;
    settle(ctx, character, response.response).await;
    Ok(())
}

pub async fn withdraw(
    ctx: &CharacterContext,
    character: &mut Character,
    code: &str,
    quantity: u32,
) -> EngineResult<()> {
    ctx.cooldown().wait_ready(ctx.log()).await;
    ctx.log().debug(format_args!("withdrawing {} x{}", code, quantity));
    let response = ctx.api().withdraw(ctx.name(), code, quantity).await?;
    settle(ctx, character, response.response).await;
    Ok(())
}
