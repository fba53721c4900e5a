//! # Game API Boundary
//!
//! The engine talks to the remote game world exclusively through the
//! [`WorldApi`] trait: read-only world queries (characters, bank, catalog,
//! map) plus the handful of character actions that consume a cooldown.
//!
//! - [`client`] - `reqwest` implementation against the HTTP API
//! - [`schema`] - wire payloads and their conversion into [`crate::models`]
//! - [`responses`] - action results carrying updated state and cooldown
//!
//! Every call either succeeds or fails with an [`ApiError`]. Retries for
//! contention statuses happen inside the HTTP client only; callers treat an
//! error as fatal for the step in progress.

pub mod client;
pub mod responses;
pub mod schema;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    BankHoldings, Character, Coords, Item, Location, LocationKind, Monster, Resource, Skill,
};

pub use client::HttpWorldApi;
pub use responses::{ActionResponse, BankResponse, Cooldown, FightResponse, FightResult, SkillInfo, SkillResponse};

/// Errors returned by any [`WorldApi`] call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport level failure (connection, TLS, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The server answered with a non-success status.
    #[error("status failure ({status}), message: {body}")]
    Status { status: u16, body: String },

    /// The requested character, item or page does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The payload could not be interpreted.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// HTTP status code when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Filter for map tile listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationQuery {
    pub kind: Option<LocationKind>,
    pub code: Option<String>,
}

impl LocationQuery {
    pub fn kind(kind: LocationKind) -> Self {
        Self {
            kind: Some(kind),
            code: None,
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self {
            kind: None,
            code: Some(code.into()),
        }
    }

    pub fn matches(&self, location: &Location) -> bool {
        self.kind.as_ref().map_or(true, |k| *k == location.kind)
            && self.code.as_ref().map_or(true, |c| *c == location.code)
    }
}

/// Filter for item catalog searches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub craft_skill: Option<Skill>,
    pub craft_material: Option<String>,
    pub min_level: Option<u32>,
    pub max_level: Option<u32>,
}

impl ItemQuery {
    /// Items craftable with `skill` from `material` up to `max_level`
    pub fn refinable(skill: Skill, material: impl Into<String>, max_level: u32) -> Self {
        Self {
            craft_skill: Some(skill),
            craft_material: Some(material.into()),
            min_level: Some(0),
            max_level: Some(max_level),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        let recipe = item.recipe.as_ref();
        self.craft_skill
            .map_or(true, |s| recipe.map_or(false, |r| r.skill == s))
            && self
                .craft_material
                .as_ref()
                .map_or(true, |m| recipe.map_or(false, |r| r.uses(m)))
            && self.min_level.map_or(true, |min| item.level >= min)
            && self.max_level.map_or(true, |max| item.level <= max)
    }
}

/// World query facade and character action executor.
///
/// Implementations must be shareable across every character task.
#[async_trait]
pub trait WorldApi: Send + Sync {
    /// Current state of one of the account's characters
    async fn get_character(&self, name: &str) -> ApiResult<Character>;

    /// Live bank contents shared by all characters
    async fn get_bank_items(&self) -> ApiResult<BankHoldings>;

    /// Catalog entry (with recipe, if any) for an item
    async fn get_item(&self, code: &str) -> ApiResult<Item>;

    /// Catalog search
    async fn get_items(&self, query: &ItemQuery) -> ApiResult<Vec<Item>>;

    /// Map tiles matching the query
    async fn get_locations(&self, query: &LocationQuery) -> ApiResult<Vec<Location>>;

    /// Resource nodes that drop `code`, joined with their locations
    async fn get_resources_by_drop(&self, code: &str) -> ApiResult<Vec<Resource>>;

    /// Resource nodes for a gathering skill within a level range, joined with their locations
    async fn get_resources_by_skill(
        &self,
        skill: Skill,
        min_level: u32,
        max_level: u32,
    ) -> ApiResult<Vec<Resource>>;

    /// Monsters within a level range (locations not joined)
    async fn get_monsters(&self, min_level: u32, max_level: u32) -> ApiResult<Vec<Monster>>;

    async fn move_to(&self, character: &str, coords: Coords) -> ApiResult<ActionResponse>;

    async fn gather(&self, character: &str) -> ApiResult<SkillResponse>;

    async fn fight(&self, character: &str) -> ApiResult<FightResponse>;

    async fn craft(&self, character: &str, code: &str, quantity: u32) -> ApiResult<SkillResponse>;

    async fn deposit(&self, character: &str, code: &str, quantity: u32) -> ApiResult<BankResponse>;

    async fn withdraw(&self, character: &str, code: &str, quantity: u32)
        -> ApiResult<BankResponse>;
}
