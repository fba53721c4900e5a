//! Cooldown pacing.
//!
//! Every action puts the character on cooldown. Issuing another action
//! before it expires is rejected by the server, so the engine sleeps out
//! the remainder first. Sleeps are never interrupted by shutdown.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

use super::context::CharacterContext;
use super::EngineResult;
use crate::logutil::ScopedLogger;
use crate::models::Character;

/// Time left until `expiration`; zero once it has passed
pub fn remaining(expiration: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (expiration - now).to_std().unwrap_or(Duration::ZERO)
}

/// Sleep until `expiration`. Returns how long it slept.
pub async fn wait_until(log: &ScopedLogger, expiration: DateTime<Utc>) -> Duration {
    let wait = remaining(expiration, Utc::now());
    if !wait.is_zero() {
        log.debug(format_args!("cooldown: sleeping {:.1}s", wait.as_secs_f64()));
        tokio::time::sleep(wait).await;
    }
    wait
}

/// Latest known cooldown expiration of one character
#[derive(Debug, Default)]
pub struct CooldownTracker {
    ready_at: Mutex<Option<DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an expiration; an earlier one never overrides a later one
    pub fn observe(&self, expiration: DateTime<Utc>) {
        if let Ok(mut guard) = self.ready_at.lock() {
            match *guard {
                Some(current) if current >= expiration => {}
                _ => *guard = Some(expiration),
            }
        }
    }

    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.ready_at.lock().ok().and_then(|guard| *guard)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.ready_at()
            .map(|exp| remaining(exp, now))
            .unwrap_or(Duration::ZERO)
    }

    /// Block until the character may act again
    pub async fn wait_ready(&self, log: &ScopedLogger) -> Duration {
        match self.ready_at() {
            Some(expiration) => wait_until(log, expiration).await,
            None => Duration::ZERO,
        }
    }
}

/// Fetch the character and sleep out any cooldown left over from a
/// previous session before its first action.
pub async fn block_initial_action(ctx: &CharacterContext) -> EngineResult<Character> {
    let character = ctx.refresh_character().await?;
    let remaining = ctx.cooldown().remaining(Utc::now());
    if !remaining.is_zero() {
        ctx.log().info(format_args!(
            "waiting {:.1}s for cooldown before first action",
            remaining.as_secs_f64()
        ));
        ctx.cooldown().wait_ready(ctx.log()).await;
    }
    Ok(character)
}
