//! Engine supervisor: one task per character.
//!
//! Characters are independent. A character whose loop fails, or whose task
//! panics, is reported and the others keep running until shutdown.

use std::sync::Arc;
use tokio::task::JoinSet;

use super::context::{CharacterContext, SharedState, Shutdown};
use super::cooldown::block_initial_action;
use super::scheduler::OperationScheduler;
use super::{EngineError, EngineResult};
use crate::api::WorldApi;
use crate::config::{CharacterConfig, EngineConfig};
use crate::models::Order;

/// How one character's loop ended
#[derive(Debug)]
pub struct CharacterReport {
    pub name: String,
    pub result: EngineResult<()>,
}

pub struct Engine {
    shared: SharedState,
    characters: Vec<CharacterConfig>,
}

impl Engine {
    pub fn new(
        api: Arc<dyn WorldApi>,
        settings: EngineConfig,
        characters: Vec<CharacterConfig>,
        standing_orders: Vec<Order>,
        shutdown: Shutdown,
    ) -> Self {
        let shared = SharedState::new(api, settings, shutdown).with_standing_orders(standing_orders);
        Self { shared, characters }
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Context for a single character sharing this engine's state
    pub fn context(&self, name: &str) -> CharacterContext {
        CharacterContext::new(name, self.shared.clone())
    }

    /// Run every configured character until shutdown. Returns one report
    /// per character once all of them have stopped.
    pub async fn run(&self) -> Vec<CharacterReport> {
        for order in self.shared.standing_orders.iter() {
            self.shared.orders.push(order.clone());
        }

        let mut tasks = JoinSet::new();
        for character in &self.characters {
            let ctx = self.context(&character.name);
            let scheduler = OperationScheduler::from_kinds(&character.operations)
                .with_start_index(self.shared.settings.scheduler_start_index);
            log::info!(
                "starting {} with operations [{}]",
                character.name,
                character
                    .operations
                    .iter()
                    .map(|op| op.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            let name = character.name.clone();
            tasks.spawn(async move {
                let inner = tokio::spawn(async move { run_character(&ctx, &scheduler).await });
                let result = match inner.await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => Err(EngineError::Crashed(name.clone())),
                    Err(e) => Err(EngineError::Crashed(format!("{}: {}", name, e))),
                };
                CharacterReport { name, result }
            });
        }

        let mut reports = Vec::with_capacity(self.characters.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    match &report.result {
                        Ok(()) => log::info!("{} stopped", report.name),
                        Err(e) => log::error!("{} failed: {}", report.name, e),
                    }
                    reports.push(report);
                }
                Err(e) => log::error!("character task aborted: {}", e),
            }
        }
        let stats = self.shared.orders.snapshot();
        log::debug!(
            "order queue: queued={} pushed={} popped={} merged={} overflow={} failed={}",
            stats.queued,
            stats.pushed_total,
            stats.popped_total,
            stats.merged_total,
            stats.dropped_overflow,
            stats.dropped_failed
        );
        reports
    }
}

async fn run_character(ctx: &CharacterContext, scheduler: &OperationScheduler) -> EngineResult<()> {
    if scheduler.is_empty() {
        return Err(EngineError::NoOperations(ctx.name().to_string()));
    }
    block_initial_action(ctx).await?;
    scheduler.run(ctx).await
}
