//! Gathering operation.
//!
//! The character levels its weakest gathering skill: among the nodes for
//! that skill within the level window it works the highest-level one,
//! repeatedly, until the inventory needs emptying.

use std::cmp::Reverse;

use super::actions;
use super::bank;
use super::context::CharacterContext;
use super::movement;
use super::{EngineError, EngineResult};
use crate::models::{calculate_distance, Character, Coords, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherOutcome {
    /// Stopped because the inventory crossed the bank threshold
    InventoryFull { gathered: u32 },
    /// Stopped because the character carries the requested quantity
    TargetReached { gathered: u32 },
    /// Stopped on shutdown
    Cancelled { gathered: u32 },
}

impl GatherOutcome {
    pub fn gathered(&self) -> u32 {
        match self {
            GatherOutcome::InventoryFull { gathered }
            | GatherOutcome::TargetReached { gathered }
            | GatherOutcome::Cancelled { gathered } => *gathered,
        }
    }
}

/// Order gatherable nodes best first: highest level, then nearest, then by code.
/// Nodes without a location or above `skill_level` are dropped.
pub fn rank_resources(from: Coords, skill_level: u32, resources: Vec<Resource>) -> Vec<Resource> {
    let mut eligible: Vec<Resource> = resources
        .into_iter()
        .filter(|r| r.level <= skill_level && r.location.is_some())
        .collect();
    eligible.sort_by(|a, b| {
        let da = a.coords().map(|c| calculate_distance(from, c));
        let db = b.coords().map(|c| calculate_distance(from, c));
        (Reverse(a.level), da, &a.code).cmp(&(Reverse(b.level), db, &b.code))
    });
    eligible
}

/// Stop condition for a gather run: carry at least `quantity` of `code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherTarget<'a> {
    pub code: &'a str,
    pub quantity: u32,
}

/// Go to `resource` and gather until the character should bank, carries the
/// optional target, or shutdown is requested. Checks the bank threshold
/// before the first gather.
pub async fn gather_until_full(
    ctx: &CharacterContext,
    character: &mut Character,
    resource: &Resource,
    target: Option<GatherTarget<'_>>,
) -> EngineResult<GatherOutcome> {
    let coords = resource
        .coords()
        .ok_or_else(|| EngineError::NotFound(format!("location of resource {}", resource.code)))?;

    let mut gathered = 0;
    if ctx.should_bank(character) {
        return Ok(GatherOutcome::InventoryFull { gathered });
    }
    movement::move_to(ctx, character, coords).await?;
    ctx.log().info(format_args!(
        "gathering {} (level {}) at {}",
        resource.code, resource.level, coords
    ));

    loop {
        if ctx.is_cancelled() {
            return Ok(GatherOutcome::Cancelled { gathered });
        }
        if ctx.should_bank(character) {
            return Ok(GatherOutcome::InventoryFull { gathered });
        }
        if let Some(t) = target {
            if character.inventory_quantity(t.code) >= t.quantity {
                return Ok(GatherOutcome::TargetReached { gathered });
            }
        }
        let details = actions::gather(ctx, character).await?;
        gathered += details.items.iter().map(|i| i.quantity).sum::<u32>();
    }
}

/// Gather operation: bank if needed, then farm the best node for the
/// weakest gathering skill until the inventory fills up.
pub async fn gather(ctx: &CharacterContext) -> EngineResult<GatherOutcome> {
    let mut character = ctx.refresh_character().await?;
    if ctx.should_bank(&character) {
        bank::deposit_all(ctx, &mut character).await?;
    }

    let weakest = character.choose_weakest_skill(ctx.settings().skill_level_window);
    ctx.log().debug(format_args!(
        "weakest gathering skill: {} (level {})",
        weakest.skill, weakest.current_level
    ));
    let candidates = ctx
        .api()
        .get_resources_by_skill(weakest.skill, weakest.min_level, weakest.current_level)
        .await?;
    let ranked = rank_resources(character.position(), weakest.current_level, candidates);
    let resource = ranked
        .first()
        .ok_or_else(|| EngineError::NoResourceNode(format!("any {} resource", weakest.skill)))?;

    let outcome = gather_until_full(ctx, &mut character, resource, None).await?;
    ctx.log()
        .info(format_args!("gathered {} items", outcome.gathered()));
    Ok(outcome)
}
