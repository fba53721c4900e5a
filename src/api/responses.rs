//! Results of character actions.
//!
//! Every action answers with the updated character and a cooldown. The
//! engine patches its local character from `character` and must not act
//! again before `cooldown.expiration`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::models::{Character, SimpleItem};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cooldown {
    #[serde(default)]
    pub total_seconds: u32,
    #[serde(default)]
    pub remaining_seconds: u32,
    pub expiration: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
}

impl Cooldown {
    /// Cooldown that has already expired
    pub fn expired_at(expiration: DateTime<Utc>) -> Self {
        Self {
            total_seconds: 0,
            remaining_seconds: 0,
            expiration,
            reason: String::new(),
        }
    }

    /// Time left until `expiration`, zero once it has passed
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expiration - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Generic action result: updated character plus cooldown
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    pub character: Character,
    pub cooldown: Cooldown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SkillInfo {
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub items: Vec<SimpleItem>,
}

/// Result of gathering or crafting
#[derive(Debug, Clone, PartialEq)]
pub struct SkillResponse {
    pub response: ActionResponse,
    pub details: SkillInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FightResult {
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub drops: Vec<SimpleItem>,
    #[serde(default)]
    pub turns: u32,
    #[serde(default)]
    pub result: String,
}

impl FightResult {
    pub fn won(&self) -> bool {
        self.result == "win"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FightResponse {
    pub response: ActionResponse,
    pub fight: FightResult,
}

/// Result of a deposit or withdrawal
#[derive(Debug, Clone, PartialEq)]
pub struct BankResponse {
    pub response: ActionResponse,
    pub item: SimpleItem,
    /// Bank contents after the transaction
    pub bank: Vec<SimpleItem>,
}
