//! Refining operation.
//!
//! Turns raw resources sitting in the bank into their refined form (ore
//! into bars, logs into planks, fish into food). The character deposits
//! first, then re-reads the bank and withdraws under the shared bank lock.
//! Travel and crafting happen with the lock released.

use super::actions;
use super::bank;
use super::context::CharacterContext;
use super::movement;
use super::order::batch_size;
use super::EngineResult;
use crate::api::ItemQuery;
use crate::models::{BankHoldings, Character, Item, ItemKind, LocationSelector, Recipe};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineOutcome {
    Refined { code: String, quantity: u32 },
    /// No banked resource can be refined at the character's skill levels
    NothingToRefine,
}

/// Refinable products for every raw resource in `bank`, best candidate first
/// (highest level, then code).
async fn refinable(
    ctx: &CharacterContext,
    character: &Character,
    bank: &BankHoldings,
) -> EngineResult<Vec<Item>> {
    let mut candidates = Vec::new();
    for (code, _) in bank.iter() {
        let raw = match ctx.api().get_item(code).await {
            Ok(item) => item,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        };
        if raw.kind() != ItemKind::Resource {
            continue;
        }
        let Some(skill) = raw.gathering_skill().and_then(|s| s.refining_skill()) else {
            continue;
        };
        let query = ItemQuery::refinable(skill, code, character.skill_level(skill));
        candidates.extend(ctx.api().get_items(&query).await?);
    }
    candidates.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.code.cmp(&b.code)));
    candidates.dedup_by(|a, b| a.code == b.code);
    Ok(candidates)
}

/// First candidate the bank can pay for at least one craft of, with its batch size
fn pick_batch<'a>(
    candidates: &'a [Item],
    bank: &BankHoldings,
    inventory_max_items: u32,
) -> Option<(&'a Item, &'a Recipe, u32)> {
    candidates.iter().find_map(|item| {
        let recipe = item.recipe.as_ref()?;
        match batch_size(recipe, u32::MAX, inventory_max_items, bank) {
            0 => None,
            batch => Some((item, recipe, batch)),
        }
    })
}

/// Refine one batch of the best refinable resource in the bank
pub async fn refine(ctx: &CharacterContext) -> EngineResult<RefineOutcome> {
    let mut character = ctx.refresh_character().await?;

    // what the bank will hold once the inventory is deposited
    let mut holdings = ctx.api().get_bank_items().await?;
    for slot in character.occupied_slots() {
        holdings.insert(slot.code.clone(), slot.quantity);
    }
    let candidates = refinable(ctx, &character, &holdings).await?;
    if pick_batch(&candidates, &holdings, character.inventory_max_items).is_none() {
        ctx.log().debug(format_args!("nothing to refine"));
        return Ok(RefineOutcome::NothingToRefine);
    }

    movement::travel(ctx, &mut character, &LocationSelector::bank()).await?;
    bank::deposit_inventory(ctx, &mut character).await?;

    let (code, recipe, batch) = {
        let _guard = ctx.coordination().lock_bank(ctx.log()).await;
        let holdings = ctx.api().get_bank_items().await?;
        let Some((item, recipe, batch)) =
            pick_batch(&candidates, &holdings, character.inventory_max_items)
        else {
            ctx.log()
                .debug(format_args!("refinable stock was taken meanwhile"));
            return Ok(RefineOutcome::NothingToRefine);
        };
        for material in &recipe.materials {
            actions::withdraw(ctx, &mut character, &material.code, material.quantity.saturating_mul(batch))
                .await?;
        }
        (item.code.clone(), recipe.clone(), batch)
    };

    movement::travel(ctx, &mut character, &LocationSelector::workshop(recipe.skill.code())).await?;
    actions::craft(ctx, &mut character, &code, batch).await?;
    bank::deposit_all(ctx, &mut character).await?;

    let quantity = batch.saturating_mul(recipe.quantity.max(1));
    ctx.log().info(format_args!("refined {} x{}", code, quantity));
    Ok(RefineOutcome::Refined { code, quantity })
}
