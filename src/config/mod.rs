//! # Configuration Management Module
//!
//! This module handles all configuration aspects of the engine: where the game
//! API lives, which characters to drive, which operations each of them rotates
//! through and which standing orders to keep fulfilled.
//!
//! ## Configuration Structure
//!
//! - [`ApiConfig`] - API endpoint, token, timeouts and retry policy
//! - [`LoggingConfig`] - Logging level and optional log file
//! - [`EngineConfig`] - Banking threshold, queue sizing and selection tuning
//! - [`CharacterConfig`] - One entry per driven character
//! - `orders` - Standing orders seeded into the shared work queue
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mmoengine::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("API: {}", config.api.base_url);
//!     for c in &config.characters {
//!         println!("{} -> {:?}", c.name, c.operations);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://api.artifactsmmo.com"
//! token = ""
//!
//! [engine]
//! bank_threshold = 0.9
//!
//! [[characters]]
//! name = "alice"
//! operations = ["bank", "gather", "refine"]
//!
//! [[characters]]
//! name = "bob"
//! operations = ["orders"]
//!
//! [[orders]]
//! code = "copper_bar"
//! quantity = 50
//! ```
//!
//! ## Environment Integration
//!
//! The API token may come from the `MMO_TOKEN` environment variable. Precedence:
//! CLI args > Environment > Config file > Defaults

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::engine::scheduler::OperationKind;
use crate::models::SimpleItem;

/// Environment variable consulted for the API token
pub const TOKEN_ENV: &str = "MMO_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Retries for contention statuses (461/486/499) and server errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff step between retries (ms)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Page size for listing endpoints
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    "https://api.artifactsmmo.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    4
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_page_size() -> u32 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Inventory fullness ratio above which a character banks before gathering
    pub bank_threshold: f64,
    /// Pause when an operation finds nothing to do (seconds)
    pub idle_seconds: u64,
    /// Retryable failures tolerated per order before it is dropped
    pub max_order_attempts: u32,
    /// How long a dropped order is kept out of the queue (seconds)
    pub dropped_order_backoff_seconds: u64,
    /// Capacity of the shared order queue
    pub order_queue_capacity: usize,
    /// Gathering picks resources within this many levels below the skill level
    pub skill_level_window: u32,
    /// Fraction of the character level below which monsters are ignored
    pub monster_level_floor: f64,
    /// Fraction of the character level above which monsters are ignored
    pub monster_level_ceiling: f64,
    /// Index of the first operation each character runs
    pub scheduler_start_index: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bank_threshold: 0.9,
            idle_seconds: 30,
            max_order_attempts: 5,
            dropped_order_backoff_seconds: 600,
            order_queue_capacity: 256,
            skill_level_window: 10,
            monster_level_floor: 0.5,
            monster_level_ceiling: 0.1,
            scheduler_start_index: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub name: String,
    pub operations: Vec<OperationKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub characters: Vec<CharacterConfig>,
    /// Standing orders: keep at least `quantity` of `code` in the bank
    #[serde(default)]
    pub orders: Vec<SimpleItem>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.apply_env();
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Let `MMO_TOKEN` override the configured token
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.api.token = token.trim().to_string();
            }
        }
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if !(engine.bank_threshold > 0.0 && engine.bank_threshold <= 1.0) {
            return Err(anyhow!(
                "engine.bank_threshold must be in (0, 1], got {}",
                engine.bank_threshold
            ));
        }
        if engine.max_order_attempts == 0 {
            return Err(anyhow!("engine.max_order_attempts must be at least 1"));
        }
        if engine.order_queue_capacity == 0 {
            return Err(anyhow!("engine.order_queue_capacity must be at least 1"));
        }
        if engine.monster_level_floor < 0.0 || engine.monster_level_ceiling < 0.0 {
            return Err(anyhow!("engine monster level fractions must not be negative"));
        }
        for (i, c) in self.characters.iter().enumerate() {
            if c.name.trim().is_empty() {
                return Err(anyhow!("characters[{}] has an empty name", i));
            }
            if c.operations.is_empty() {
                return Err(anyhow!("character {} has no operations", c.name));
            }
        }
        for order in &self.orders {
            if order.code.trim().is_empty() || order.quantity == 0 {
                return Err(anyhow!(
                    "order '{}' x{} needs a code and a positive quantity",
                    order.code,
                    order.quantity
                ));
            }
        }
        Ok(())
    }

    pub fn character(&self, name: &str) -> Option<&CharacterConfig> {
        self.characters.iter().find(|c| c.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("mmoengine.log".to_string()),
            },
            engine: EngineConfig::default(),
            characters: vec![CharacterConfig {
                name: "character1".to_string(),
                operations: vec![
                    OperationKind::Bank,
                    OperationKind::Gather,
                    OperationKind::Refine,
                ],
            }],
            orders: Vec::new(),
        }
    }
}
