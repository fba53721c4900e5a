//! # Decision and Order Fulfilment Engine
//!
//! Drives characters against the game API. Each character runs in its own
//! task, rotating through its configured operations; characters share only
//! the bank lock, the order queue and the API client.
//!
//! ## Components
//!
//! - [`scheduler`] - per-character round-robin over operations
//! - [`order`] - order resolution: should an order be worked, and how
//! - [`queue`] - shared order work queue
//! - [`coordination`] - bank withdrawal lock shared by all characters
//! - [`movement`] - travel to the nearest location of a kind/code
//! - [`actions`] - single remote actions with cooldown pacing
//! - [`cooldown`] - cooldown tracking and waiting
//! - [`bank`], [`gather`], [`fight`], [`refine`] - operation bodies
//! - [`supervisor`] - spawns and supervises one task per character
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   pop / push   ┌──────────────┐
//! │  Scheduler   │ ─────────────▶ │ Order Queue  │
//! └──────────────┘                └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐   bank lock    ┌──────────────┐
//! │ Order / Ops  │ ─────────────▶ │ Coordination │
//! └──────────────┘                └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ Actions +    │ ← every call paced by the character cooldown
//! │ Movement     │
//! └──────────────┘
//! ```
//!
//! ## Errors
//!
//! Operations return [`EngineError`] for faults. "Nothing to do" and "needs
//! more materials" are ordinary outcomes, not errors. A fault stops only the
//! character that hit it; the supervisor reports it and the other
//! characters keep running.

pub mod actions;
pub mod bank;
pub mod context;
pub mod cooldown;
pub mod coordination;
pub mod fight;
pub mod gather;
pub mod movement;
pub mod order;
pub mod queue;
pub mod refine;
pub mod scheduler;
pub mod supervisor;

use thiserror::Error;

use crate::api::ApiError;
use crate::models::Skill;

pub use context::{shutdown_channel, CharacterContext, SharedState, Shutdown, ShutdownTrigger};
pub use coordination::Coordination;
pub use order::{fulfil, should_fulfil, FulfilOutcome};
pub use queue::OrderQueue;
pub use scheduler::{Behavior, OperationKind, OperationScheduler};
pub use supervisor::{CharacterReport, Engine};

/// Faults raised by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Any failure reported by the API client.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// A character, item or location the engine relies on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No resource node drops the item. May resolve later (new map content),
    /// may be permanent.
    #[error("no resource node drops {0}")]
    NoResourceNode(String),

    /// Resource nodes exist but the character's skill is too low for all of them.
    #[error("{code} requires {skill} level {required}, character has {current}")]
    SkillTooLow {
        code: String,
        skill: Skill,
        required: u32,
        current: u32,
    },

    /// The order can never be completed as requested.
    #[error("cannot resolve order: {0}")]
    Unresolvable(String),

    /// A scheduler was built without any operation.
    #[error("no operations configured for {0}")]
    NoOperations(String),

    #[error("character task crashed: {0}")]
    Crashed(String),
}

impl EngineError {
    /// Whether the caller may put the work back in the queue and try again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::NoResourceNode(_) | EngineError::SkillTooLow { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::NotFound(_) => true,
            EngineError::Api(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
