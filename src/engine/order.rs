//! Order resolution.
//!
//! An order asks for a quantity of an item to be on hand (inventory plus
//! bank). [`should_fulfil`] decides whether it still needs work and
//! [`fulfil`] takes one step towards it: gather a raw resource, report the
//! materials that are missing, or withdraw-craft-deposit a batch.
//!
//! Holdings are read live for every decision; nothing is cached across
//! steps, since other characters change the bank concurrently.

use std::time::Duration;

use super::bank;
use super::context::CharacterContext;
use super::gather::{self, GatherOutcome, GatherTarget};
use super::movement;
use super::{actions, EngineError, EngineResult};
use crate::logutil::ScopedLogger;
use crate::models::{BankHoldings, Character, Item, LocationSelector, Order, Recipe};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfilOutcome {
    /// Enough is already on hand; nothing was done
    Satisfied,
    /// A raw resource was gathered
    Gathered { resource: String, outcome: GatherOutcome },
    /// `quantity` units were crafted and deposited
    Crafted { code: String, quantity: u32 },
    /// Materials are missing; these sub-orders must be resolved first
    RequirementsNotMet(Vec<Order>),
}

/// Number of crafts to perform in one trip.
///
/// Bounded by the crafts still wanted, by how many material sets fit in an
/// empty inventory, and by the scarcest material in the bank.
pub fn batch_size(recipe: &Recipe, wanted: u32, inventory_max_items: u32, bank: &BankHoldings) -> u32 {
    wanted
        .min(recipe.sets_per_load(inventory_max_items))
        .min(recipe.affordable_sets(bank))
}

/// Crafts needed to produce `units` when one craft yields `recipe.quantity`
pub fn crafts_for(recipe: &Recipe, units: u32) -> u32 {
    units.div_ceil(recipe.quantity.max(1))
}

async fn on_hand(ctx: &CharacterContext, code: &str) -> EngineResult<(Character, u32)> {
    let character = ctx.refresh_character().await?;
    let bank = ctx.api().get_bank_items().await?;
    let quantity = bank.quantity(code) + character.inventory_quantity(code);
    Ok((character, quantity))
}

/// Whether the character's holdings (inventory plus bank) fall short of the order
pub async fn should_fulfil(ctx: &CharacterContext, order: &Order) -> EngineResult<bool> {
    let (_, quantity) = on_hand(ctx, order.code()).await?;
    let needed = quantity < order.quantity();
    ctx.log().debug(format_args!(
        "{}: on hand {}, should fulfil: {}",
        order,
        quantity,
        needed
    ));
    Ok(needed)
}

/// Take one step towards satisfying `order`.
pub async fn fulfil(ctx: &CharacterContext, order: &Order) -> EngineResult<FulfilOutcome> {
    let (mut character, quantity) = on_hand(ctx, order.code()).await?;
    if quantity >= order.quantity() {
        return Ok(FulfilOutcome::Satisfied);
    }
    let deficit = order.quantity() - quantity;

    let item = ctx.api().get_item(order.code()).await?;
    match item.recipe.clone() {
        None => fulfil_raw(ctx, &mut character, &item, deficit).await,
        Some(recipe) => fulfil_craft(ctx, &mut character, order, &item, &recipe, deficit).await,
    }
}

async fn fulfil_raw(
    ctx: &CharacterContext,
    character: &mut Character,
    item: &Item,
    deficit: u32,
) -> EngineResult<FulfilOutcome> {
    let resources = ctx.api().get_resources_by_drop(&item.code).await?;
    let Some(lowest) = resources.iter().min_by_key(|r| r.level).cloned() else {
        return Err(EngineError::NoResourceNode(item.code.clone()));
    };
    let skill_level = character.skill_level(lowest.skill);
    let ranked = gather::rank_resources(character.position(), skill_level, resources);
    let Some(resource) = ranked.first() else {
        return Err(EngineError::SkillTooLow {
            code: lowest.code,
            skill: lowest.skill,
            required: lowest.level,
            current: skill_level,
        });
    };

    if ctx.should_bank(character) {
        bank::deposit_all(ctx, character).await?;
    }
    let target = GatherTarget {
        code: &item.code,
        quantity: character.inventory_quantity(&item.code) + deficit,
    };
    let outcome = gather::gather_until_full(ctx, character, resource, Some(target)).await?;
    Ok(FulfilOutcome::Gathered {
        resource: resource.code.clone(),
        outcome,
    })
}

async fn fulfil_craft(
    ctx: &CharacterContext,
    character: &mut Character,
    order: &Order,
    item: &Item,
    recipe: &Recipe,
    deficit: u32,
) -> EngineResult<FulfilOutcome> {
    if recipe.sets_per_load(character.inventory_max_items) == 0 {
        return Err(EngineError::Unresolvable(format!(
            "one set of {} materials does not fit in {} inventory slots",
            item.code, character.inventory_max_items
        )));
    }
    let wanted = crafts_for(recipe, deficit);

    let mut unmet = Vec::new();
    for material in &recipe.materials {
        let sub = order.sub_order(material.code.clone(), material.quantity.saturating_mul(wanted));
        if should_fulfil(ctx, &sub).await? {
            unmet.push(sub);
        }
    }
    if !unmet.is_empty() {
        ctx.log().info(format_args!(
            "{} waits on {} material orders",
            order,
            unmet.len()
        ));
        return Ok(FulfilOutcome::RequirementsNotMet(unmet));
    }

    movement::travel(ctx, character, &LocationSelector::bank()).await?;
    bank::deposit_inventory(ctx, character).await?;

    let batch = {
        let _guard = ctx.coordination().lock_bank(ctx.log()).await;
        let holdings = ctx.api().get_bank_items().await?;
        let mut stocked = recipe.clone();
        stocked.fill_availability(&holdings);
        let batch = batch_size(&stocked, wanted, character.inventory_max_items, &holdings);
        if batch == 0 {
            let missing: Vec<Order> = stocked
                .materials
                .iter()
                .filter(|m| m.available < m.quantity)
                .map(|m| order.sub_order(m.code.clone(), m.quantity.saturating_mul(wanted)))
                .collect();
            if missing.is_empty() {
                return Err(EngineError::Unresolvable(format!(
                    "no batch of {} possible",
                    item.code
                )));
            }
            ctx.log().info(format_args!(
                "bank stock for {} was taken meanwhile",
                item.code
            ));
            return Ok(FulfilOutcome::RequirementsNotMet(missing));
        }
        for material in &recipe.materials {
            actions::withdraw(ctx, character, &material.code, material.quantity.saturating_mul(batch))
                .await?;
        }
        batch
    };

    movement::travel(ctx, character, &LocationSelector::workshop(recipe.skill.code())).await?;
    actions::craft(ctx, character, &item.code, batch).await?;
    bank::deposit_all(ctx, character).await?;

    let quantity = batch.saturating_mul(recipe.quantity.max(1));
    ctx.log()
        .info(format_args!("crafted {} x{} for {}", item.code, quantity, order));
    Ok(FulfilOutcome::Crafted {
        code: item.code.clone(),
        quantity,
    })
}

/// What the order worker did with one queue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    /// Queue was empty
    Idle,
    /// Order is satisfied and left the queue
    Completed(Order),
    /// Order (and possibly its sub-orders) went back into the queue
    Requeued(Order),
    /// A retryable failure; the order went back with `attempts` bumped
    Deferred(Order),
    /// Order failed too often, or can never be crafted, and was discarded
    Dropped(Order),
}

fn drop_backoff(ctx: &CharacterContext) -> Duration {
    Duration::from_secs(ctx.settings().dropped_order_backoff_seconds)
}

fn drop_order(ctx: &CharacterContext, log: &ScopedLogger, order: Order, reason: &str) -> WorkOutcome {
    log.warn(format_args!(
        "dropping {} (attempts {}): {}",
        order, order.attempts, reason
    ));
    ctx.orders().remove_children(order.code());
    ctx.orders().mark_dropped(order.code());
    WorkOutcome::Dropped(order)
}

fn complete(ctx: &CharacterContext, log: &ScopedLogger, order: Order) -> WorkOutcome {
    let stale = ctx.orders().remove_children(order.code());
    log.info(format_args!("{} satisfied", order));
    if stale > 0 {
        log.debug(format_args!("discarded {} material orders of {}", stale, order.code()));
    }
    WorkOutcome::Completed(order)
}

/// Pop one order and take a resolution step for it.
///
/// Unfinished orders go back to the queue after their sub-orders, so the
/// materials are picked up first. Once an order is satisfied its pending
/// material orders are discarded. Retryable failures bump `attempts`;
/// after `max_order_attempts` the order is dropped. A recipe that cannot be
/// carried in one trip, or whose material was itself dropped, is dropped
/// at once. Dropped codes stay out of the queue for
/// `dropped_order_backoff_seconds`. Other errors are returned and end the
/// character's loop.
pub async fn work_next(ctx: &CharacterContext) -> EngineResult<WorkOutcome> {
    let Some(mut order) = ctx.orders().pop() else {
        return Ok(WorkOutcome::Idle);
    };
    let log = ctx.log().child("orders");

    if !should_fulfil(ctx, &order).await? {
        return Ok(complete(ctx, &log, order));
    }

    match fulfil(ctx, &order).await {
        Ok(FulfilOutcome::Satisfied) => Ok(complete(ctx, &log, order)),
        Ok(FulfilOutcome::RequirementsNotMet(subs)) => {
            let backoff = drop_backoff(ctx);
            if let Some(sub) = subs
                .iter()
                .find(|s| ctx.orders().recently_dropped(s.code(), backoff))
            {
                let reason = format!("material {} was dropped", sub.code());
                return Ok(drop_order(ctx, &log, order, &reason));
            }
            for sub in subs {
                log.debug(format_args!("queueing material {}", sub));
                ctx.orders().push(sub);
            }
            ctx.orders().push(order.clone());
            Ok(WorkOutcome::Requeued(order))
        }
        Ok(outcome) => {
            log.debug(format_args!("{}: {:?}", order, outcome));
            if !should_fulfil(ctx, &order).await? {
                return Ok(complete(ctx, &log, order));
            }
            ctx.orders().push(order.clone());
            Ok(WorkOutcome::Requeued(order))
        }
        Err(EngineError::Unresolvable(reason)) => Ok(drop_order(ctx, &log, order, &reason)),
        Err(e) if e.is_retryable() => {
            order.attempts += 1;
            if order.attempts >= ctx.settings().max_order_attempts {
                return Ok(drop_order(ctx, &log, order, &e.to_string()));
            }
            log.warn(format_args!(
                "{} failed (attempt {}): {}",
                order, order.attempts, e
            ));
            ctx.orders().push(order.clone());
            Ok(WorkOutcome::Deferred(order))
        }
        Err(e) => Err(e),
    }
}

/// Put standing orders that still need work back into the queue, skipping
/// recently dropped ones. Returns how many were queued.
pub async fn seed_standing_orders(ctx: &CharacterContext) -> EngineResult<usize> {
    let backoff = drop_backoff(ctx);
    let mut queued = 0;
    for order in ctx.standing_orders() {
        if ctx.orders().recently_dropped(order.code(), backoff) {
            continue;
        }
        if should_fulfil(ctx, order).await? && ctx.orders().push(order.clone()) {
            queued += 1;
        }
    }
    Ok(queued)
}
