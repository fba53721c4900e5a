//! Character-scoped execution context.
//!
//! Everything an engine function needs is passed in explicitly through a
//! [`CharacterContext`]: the API handle, a scoped logger, the shutdown
//! signal, the shared bank lock and order queue, tuning settings and the
//! character's cooldown tracker.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::cooldown::CooldownTracker;
use super::coordination::Coordination;
use super::queue::OrderQueue;
use super::EngineResult;
use crate::api::WorldApi;
use crate::config::EngineConfig;
use crate::logutil::ScopedLogger;
use crate::models::{Character, Order};

/// Sender half of the shutdown signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cooperative cancellation flag shared by every character task.
///
/// Checked at loop boundaries only; it never interrupts a request in flight
/// or a cooldown wait.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been triggered. Never resolves if the
    /// trigger was dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration` unless shutdown fires first. Only used for idle
    /// pauses, never for cooldowns.
    pub async fn idle(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancelled() => {}
        }
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// State shared by all character tasks of one engine
#[derive(Clone)]
pub struct SharedState {
    pub api: Arc<dyn WorldApi>,
    pub coordination: Coordination,
    pub orders: OrderQueue,
    pub standing_orders: Arc<Vec<Order>>,
    pub settings: Arc<EngineConfig>,
    pub shutdown: Shutdown,
}

impl SharedState {
    pub fn new(api: Arc<dyn WorldApi>, settings: EngineConfig, shutdown: Shutdown) -> Self {
        let orders = OrderQueue::new(settings.order_queue_capacity);
        Self {
            api,
            coordination: Coordination::new(),
            orders,
            standing_orders: Arc::new(Vec::new()),
            settings: Arc::new(settings),
            shutdown,
        }
    }

    pub fn with_standing_orders(mut self, orders: Vec<Order>) -> Self {
        self.standing_orders = Arc::new(orders);
        self
    }
}

pub struct CharacterContext {
    name: String,
    log: ScopedLogger,
    shared: SharedState,
    cooldown: CooldownTracker,
}

impl CharacterContext {
    pub fn new(name: impl Into<String>, shared: SharedState) -> Self {
        let name = name.into();
        Self {
            log: ScopedLogger::new(name.clone()),
            name,
            shared,
            cooldown: CooldownTracker::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self) -> &ScopedLogger {
        &self.log
    }

    pub fn api(&self) -> &dyn WorldApi {
        self.shared.api.as_ref()
    }

    pub fn coordination(&self) -> &Coordination {
        &self.shared.coordination
    }

    pub fn orders(&self) -> &OrderQueue {
        &self.shared.orders
    }

    pub fn standing_orders(&self) -> &[Order] {
        &self.shared.standing_orders
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.shared.settings
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shared.shutdown
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    /// Fetch a fresh view of this character and remember its cooldown
    pub async fn refresh_character(&self) -> EngineResult<Character> {
        let character = self.api().get_character(&self.name).await?;
        if let Some(expiration) = character.cooldown_expiration {
            self.cooldown.observe(expiration);
        }
        Ok(character)
    }

    pub fn should_bank(&self, character: &Character) -> bool {
        character.should_bank(self.settings().bank_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_flag_propagates_to_clones() {
        let (trigger, shutdown) = shutdown_channel();
        let clone = shutdown.clone();
        assert!(!clone.is_cancelled());
        trigger.trigger();
        assert!(shutdown.is_cancelled());
        assert!(clone.is_cancelled());
        clone.cancelled().await;
    }

    #[tokio::test]
    async fn idle_returns_early_on_shutdown() {
        let (trigger, shutdown) = shutdown_channel();
        trigger.trigger();
        let started = std::time::Instant::now();
        shutdown.idle(Duration::from_secs(30)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
