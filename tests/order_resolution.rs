//! Order resolution against the in-memory world: satisfaction checks,
//! material breakdown, batch crafting and the queue worker.
mod common;

use std::sync::Arc;

use common::{
    character, context, context_with_lock, crafted_item, fast_settings, forge_world, raw_item,
    Call, MockWorld,
};
use mmoengine::config::EngineConfig;
use mmoengine::engine::gather::GatherOutcome;
use mmoengine::engine::order::{
    fulfil, seed_standing_orders, should_fulfil, work_next, FulfilOutcome, WorkOutcome,
};
use mmoengine::engine::{shutdown_channel, CharacterContext, Coordination, SharedState};
use mmoengine::models::{Coords, Order, Skill};

fn strict_context(world: Arc<MockWorld>, max_order_attempts: u32, standing: Vec<Order>) -> CharacterContext {
    let (_trigger, shutdown) = shutdown_channel();
    let settings = EngineConfig {
        max_order_attempts,
        ..fast_settings()
    };
    let state = SharedState::new(world, settings, shutdown).with_standing_orders(standing);
    CharacterContext::new("alice", state)
}

#[tokio::test]
async fn satisfied_order_is_not_worked() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 100))
            .with_bank("copper_ore", 10),
    );
    let (ctx, _trigger) = context(world.clone(), "alice");
    let order = Order::new("copper_ore", 10);

    assert!(!should_fulfil(&ctx, &order).await.unwrap());
    assert_eq!(fulfil(&ctx, &order).await.unwrap(), FulfilOutcome::Satisfied);

    ctx.orders().push(order.clone());
    assert_eq!(work_next(&ctx).await.unwrap(), WorkOutcome::Completed(order));
    assert!(world.calls().is_empty());
}

#[tokio::test]
async fn inventory_counts_towards_holdings() {
    let mut alice = character("alice", 5, 100);
    alice.inventory.push(mmoengine::models::InventorySlot {
        slot: 1,
        code: "copper_ore".into(),
        quantity: 4,
    });
    let world = Arc::new(forge_world().with_character(alice).with_bank("copper_ore", 6));
    let (ctx, _trigger) = context(world, "alice");

    assert!(!should_fulfil(&ctx, &Order::new("copper_ore", 10)).await.unwrap());
    assert!(should_fulfil(&ctx, &Order::new("copper_ore", 11)).await.unwrap());
}

#[tokio::test]
async fn unmet_materials_return_sub_orders_without_acting() {
    let world = Arc::new(forge_world().with_character(character("alice", 5, 100)));
    let (ctx, _trigger) = context(world.clone(), "alice");
    let order = Order::new("copper_dagger", 2).with_concurrency(3);

    match fulfil(&ctx, &order).await.unwrap() {
        FulfilOutcome::RequirementsNotMet(subs) => {
            assert_eq!(subs.len(), 1);
            assert_eq!(subs[0].code(), "copper");
            assert_eq!(subs[0].quantity(), 12);
            assert_eq!(subs[0].concurrency, 3);
        }
        other => panic!("expected unmet requirements, got {:?}", other),
    }
    assert!(world.calls().is_empty());
}

#[tokio::test]
async fn huge_order_saturates_material_quantities() {
    let world = Arc::new(forge_world().with_character(character("alice", 5, 100)));
    let (ctx, _trigger) = context(world.clone(), "alice");

    match fulfil(&ctx, &Order::new("copper_dagger", u32::MAX)).await.unwrap() {
        FulfilOutcome::RequirementsNotMet(subs) => {
            assert_eq!(subs[0].code(), "copper");
            assert_eq!(subs[0].quantity(), u32::MAX);
        }
        other => panic!("expected unmet requirements, got {:?}", other),
    }
    assert!(world.calls().is_empty());
}

#[tokio::test]
async fn craft_withdraws_crafts_and_deposits() {
    let lock = Coordination::new();
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 100))
            .with_bank("copper", 12)
            .watch_bank_lock(lock.clone()),
    );
    let (ctx, _trigger) = context_with_lock(world.clone(), "alice", lock);

    let outcome = fulfil(&ctx, &Order::new("copper_dagger", 2)).await.unwrap();
    assert_eq!(
        outcome,
        FulfilOutcome::Crafted {
            code: "copper_dagger".into(),
            quantity: 2
        }
    );

    let alice = |s: &str| s.to_string();
    assert_eq!(
        world.calls(),
        vec![
            Call::Move { character: alice("alice"), coords: Coords::new(4, 1) },
            Call::Withdraw { character: alice("alice"), code: "copper".into(), quantity: 12 },
            Call::Move { character: alice("alice"), coords: Coords::new(2, 2) },
            Call::Craft { character: alice("alice"), code: "copper_dagger".into(), quantity: 2 },
            Call::Move { character: alice("alice"), coords: Coords::new(4, 1) },
            Call::Deposit { character: alice("alice"), code: "copper_dagger".into(), quantity: 2 },
        ]
    );
    assert_eq!(world.bank_quantity("copper_dagger"), 2);
    assert_eq!(world.bank_quantity("copper"), 0);
    assert_eq!(world.character("alice").count_inventory(), 0);
    assert!(!ctx.coordination().bank_locked());
    // only the withdrawal happens under the bank lock
    assert_eq!(world.locked_calls(), world.withdrawals());
}

#[tokio::test]
async fn batch_is_bounded_by_inventory_capacity() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 10))
            .with_bank("copper", 30),
    );
    let (ctx, _trigger) = context(world.clone(), "alice");
    let order = Order::new("copper_dagger", 5);

    let outcome = fulfil(&ctx, &order).await.unwrap();
    assert_eq!(
        outcome,
        FulfilOutcome::Crafted {
            code: "copper_dagger".into(),
            quantity: 1
        }
    );
    assert_eq!(
        world.withdrawals(),
        vec![Call::Withdraw {
            character: "alice".into(),
            code: "copper".into(),
            quantity: 6
        }]
    );
    assert!(should_fulfil(&ctx, &order).await.unwrap());
}

#[tokio::test]
async fn raw_order_gathers_until_target() {
    let world = Arc::new(forge_world().with_character(character("alice", 5, 100)));
    let (ctx, _trigger) = context(world.clone(), "alice");

    let outcome = fulfil(&ctx, &Order::new("copper_ore", 3)).await.unwrap();
    assert_eq!(
        outcome,
        FulfilOutcome::Gathered {
            resource: "copper_rocks".into(),
            outcome: GatherOutcome::TargetReached { gathered: 3 }
        }
    );
    let calls = world.calls();
    assert_eq!(
        calls[0],
        Call::Move {
            character: "alice".into(),
            coords: Coords::new(2, 0)
        }
    );
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::Gather { .. })).count(), 3);
    assert_eq!(world.character("alice").inventory_quantity("copper_ore"), 3);
}

#[tokio::test]
async fn low_skill_is_retryable() {
    let world = Arc::new(forge_world().with_character(character("alice", 0, 100)));
    let (ctx, _trigger) = context(world.clone(), "alice");

    let err = fulfil(&ctx, &Order::new("copper_ore", 3)).await.unwrap_err();
    assert!(err.is_retryable(), "{}", err);
    assert!(world.calls().is_empty());
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let world = Arc::new(forge_world().with_character(character("alice", 5, 100)));
    let (ctx, _trigger) = context(world, "alice");

    let err = fulfil(&ctx, &Order::new("dragon_scale", 1)).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn missing_resource_node_is_retried_then_dropped() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 100))
            .with_item(raw_item("gold_ore", "mining")),
    );
    let ctx = strict_context(world, 2, Vec::new());
    ctx.orders().push(Order::new("gold_ore", 1));

    match work_next(&ctx).await.unwrap() {
        WorkOutcome::Deferred(order) => assert_eq!(order.attempts, 1),
        other => panic!("expected a deferred order, got {:?}", other),
    }
    assert_eq!(ctx.orders().pending()[0].attempts, 1);

    match work_next(&ctx).await.unwrap() {
        WorkOutcome::Dropped(order) => assert_eq!(order.attempts, 2),
        other => panic!("expected drop, got {:?}", other),
    }
    assert!(ctx.orders().is_empty());
    assert_eq!(ctx.orders().snapshot().dropped_failed, 1);
}

#[tokio::test]
async fn dropped_standing_order_is_not_reseeded() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 100))
            .with_item(raw_item("gold_ore", "mining")),
    );
    let ctx = strict_context(world.clone(), 1, vec![Order::new("gold_ore", 5)]);

    assert_eq!(seed_standing_orders(&ctx).await.unwrap(), 1);
    assert!(matches!(work_next(&ctx).await.unwrap(), WorkOutcome::Dropped(_)));

    assert_eq!(seed_standing_orders(&ctx).await.unwrap(), 0);
    assert_eq!(work_next(&ctx).await.unwrap(), WorkOutcome::Idle);
    assert_eq!(world.resource_lookups(), 1);
}

#[tokio::test]
async fn order_waiting_on_dropped_material_is_dropped() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 100))
            .with_item(raw_item("gold_ore", "mining"))
            .with_item(crafted_item("gold", Skill::Mining, 1, &[("gold_ore", 10)])),
    );
    let ctx = strict_context(world.clone(), 1, Vec::new());
    ctx.orders().push(Order::new("gold", 1));

    assert!(matches!(work_next(&ctx).await.unwrap(), WorkOutcome::Requeued(_)));
    match work_next(&ctx).await.unwrap() {
        WorkOutcome::Dropped(order) => assert_eq!(order.code(), "gold_ore"),
        other => panic!("expected the material to drop, got {:?}", other),
    }
    match work_next(&ctx).await.unwrap() {
        WorkOutcome::Dropped(order) => assert_eq!(order.code(), "gold"),
        other => panic!("expected the parent to drop, got {:?}", other),
    }
    assert!(ctx.orders().is_empty());
    assert!(world.calls().is_empty());
}

#[tokio::test]
async fn recipe_larger_than_inventory_is_dropped_without_acting() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 5))
            .with_bank("copper", 12),
    );
    let (ctx, _trigger) = context(world.clone(), "alice");
    ctx.orders().push(Order::new("copper_dagger", 1));

    match work_next(&ctx).await.unwrap() {
        WorkOutcome::Dropped(order) => assert_eq!(order.code(), "copper_dagger"),
        other => panic!("expected drop, got {:?}", other),
    }
    assert!(ctx.orders().is_empty());
    assert!(world.calls().is_empty());
    assert_eq!(world.bank_quantity("copper"), 12);
}

#[tokio::test]
async fn worker_resolves_nested_recipe() {
    let world = Arc::new(
        forge_world()
            .with_character(character("alice", 5, 100))
            .with_bank("copper_ore", 60),
    );
    let (ctx, _trigger) = context(world.clone(), "alice");
    ctx.orders().push(Order::new("copper_dagger", 1));

    match work_next(&ctx).await.unwrap() {
        WorkOutcome::Requeued(order) => assert_eq!(order.code(), "copper_dagger"),
        other => panic!("expected requeue, got {:?}", other),
    }
    let pending: Vec<String> = ctx.orders().pending().iter().map(|o| o.code().to_string()).collect();
    assert_eq!(pending, ["copper", "copper_dagger"]);

    for _ in 0..10 {
        if work_next(&ctx).await.unwrap() == WorkOutcome::Idle {
            break;
        }
    }
    assert!(ctx.orders().is_empty());
    assert_eq!(world.bank_quantity("copper_dagger"), 1);
    assert_eq!(world.bank_quantity("copper"), 0);
    assert_eq!(world.bank_quantity("copper_ore"), 0);
}
