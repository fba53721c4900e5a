//! Per-character operation scheduler.
//!
//! A character is configured with an ordered list of behaviors. The
//! scheduler runs them round-robin: the current behavior is stepped until it
//! reports it is done for this turn, then the index advances (wrapping)
//! regardless of the outcome. Shutdown is checked between steps; an error
//! from any behavior ends the loop and is returned to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::context::CharacterContext;
use super::fight;
use super::gather;
use super::order::{self, WorkOutcome};
use super::refine::{self, RefineOutcome};
use super::{bank, EngineError, EngineResult};
use crate::models::Character;

/// A long-running unit of character work
#[async_trait]
pub trait Behavior: Send + Sync {
    fn name(&self) -> &str;

    /// Perform one step. `Ok(true)` hands the turn to the next behavior,
    /// `Ok(false)` asks to be stepped again.
    async fn step(&self, ctx: &CharacterContext, character: &Character) -> EngineResult<bool>;
}

/// Built-in operations selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Empty the inventory into the bank
    Bank,
    /// Level the weakest gathering skill
    #[serde(alias = "forage")]
    Gather,
    /// Refine banked raw resources, one batch per step
    Refine,
    /// Fight monsters around the character level
    Fight,
    /// Work the shared order queue
    Orders,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Bank => "bank",
            OperationKind::Gather => "gather",
            OperationKind::Refine => "refine",
            OperationKind::Fight => "fight",
            OperationKind::Orders => "orders",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
impl Behavior for OperationKind {
    fn name(&self) -> &str {
        self.as_str()
    }

    async fn step(&self, ctx: &CharacterContext, _character: &Character) -> EngineResult<bool> {
        match self {
            OperationKind::Bank => {
                bank::bank(ctx).await?;
                Ok(true)
            }
            OperationKind::Gather => {
                gather::gather(ctx).await?;
                Ok(true)
            }
            OperationKind::Fight => {
                fight::fight(ctx).await?;
                Ok(true)
            }
            OperationKind::Refine => match refine::refine(ctx).await? {
                RefineOutcome::Refined { .. } => Ok(false),
                RefineOutcome::NothingToRefine => Ok(true),
            },
            OperationKind::Orders => orders_step(ctx).await,
        }
    }
}

async fn orders_step(ctx: &CharacterContext) -> EngineResult<bool> {
    if ctx.orders().is_empty() {
        let seeded = order::seed_standing_orders(ctx).await?;
        if seeded > 0 {
            ctx.log()
                .debug(format_args!("re-queued {} standing orders", seeded));
        }
    }
    let idle = Duration::from_secs(ctx.settings().idle_seconds);
    match order::work_next(ctx).await? {
        WorkOutcome::Idle => {
            ctx.log()
                .debug(format_args!("no orders, idling {}s", idle.as_secs()));
            ctx.shutdown().idle(idle).await;
            Ok(true)
        }
        // failed steps make only read calls, so nothing else paces them
        WorkOutcome::Deferred(_) | WorkOutcome::Dropped(_) => {
            ctx.shutdown().idle(idle).await;
            Ok(true)
        }
        WorkOutcome::Completed(_) | WorkOutcome::Requeued(_) => Ok(false),
    }
}

pub struct OperationScheduler {
    behaviors: Vec<Arc<dyn Behavior>>,
    start_index: usize,
}

impl OperationScheduler {
    pub fn new(behaviors: Vec<Arc<dyn Behavior>>) -> Self {
        Self {
            behaviors,
            start_index: 0,
        }
    }

    pub fn from_kinds(kinds: &[OperationKind]) -> Self {
        Self::new(
            kinds
                .iter()
                .map(|&kind| Arc::new(kind) as Arc<dyn Behavior>)
                .collect(),
        )
    }

    /// Index of the first behavior to run; wraps around the list length
    pub fn with_start_index(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Run until shutdown or the first error.
    pub async fn run(&self, ctx: &CharacterContext) -> EngineResult<()> {
        if self.behaviors.is_empty() {
            return Err(EngineError::NoOperations(ctx.name().to_string()));
        }
        let character = ctx.refresh_character().await?;

        let mut index = self.start_index % self.behaviors.len();
        loop {
            if ctx.is_cancelled() {
                ctx.log().info(format_args!("scheduler stopped"));
                return Ok(());
            }
            let behavior = &self.behaviors[index];
            ctx.log()
                .debug(format_args!("running operation {}", behavior.name()));
            loop {
                if ctx.is_cancelled() {
                    ctx.log().info(format_args!("scheduler stopped"));
                    return Ok(());
                }
                if behavior.step(ctx, &character).await? {
                    break;
                }
            }
            index = (index + 1) % self.behaviors.len();
        }
    }
}
