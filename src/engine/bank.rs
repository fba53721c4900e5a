//! Banking operation.

use super::actions;
use super::context::CharacterContext;
use super::movement;
use super::EngineResult;
use crate::models::{Character, LocationSelector, SimpleItem};

/// Deposit every occupied slot. The character must already be at a bank.
/// Returns the number of units deposited.
pub async fn deposit_inventory(ctx: &CharacterContext, character: &mut Character) -> EngineResult<u32> {
    let slots: Vec<SimpleItem> = character
        .occupied_slots()
        .map(|slot| SimpleItem::new(slot.code.clone(), slot.quantity))
        .collect();
    let mut deposited = 0;
    for item in slots {
        actions::deposit(ctx, character, &item.code, item.quantity).await?;
        deposited += item.quantity;
    }
    Ok(deposited)
}

/// Travel to the nearest bank and deposit the whole inventory.
/// An empty inventory skips the trip.
pub async fn deposit_all(ctx: &CharacterContext, character: &mut Character) -> EngineResult<u32> {
    if character.occupied_slots().next().is_none() {
        ctx.log().debug(format_args!("inventory empty, nothing to bank"));
        return Ok(0);
    }
    movement::travel(ctx, character, &LocationSelector::bank()).await?;
    let deposited = deposit_inventory(ctx, character).await?;
    ctx.log()
        .info(format_args!("deposited {} items into the bank", deposited));
    Ok(deposited)
}

/// Bank operation: refresh the character and empty its inventory
pub async fn bank(ctx: &CharacterContext) -> EngineResult<u32> {
    let mut character = ctx.refresh_character().await?;
    deposit_all(ctx, &mut character).await
}
