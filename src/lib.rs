//! # mmoengine - Character automation for a turn-paced MMO API
//!
//! mmoengine drives one or more game characters against a remote game-world
//! HTTP API. It decides what each character should do next, carries out
//! multi-step plans (travel, gather, refine, craft, fight, bank) and honours
//! the server's per-character action cooldown.
//!
//! ## Features
//!
//! - **Operation rotation**: each character cycles through a configured list
//!   of operations (bank, gather, refine, fight, orders).
//! - **Order resolution**: demand for an item is broken down recursively into
//!   material orders, gathered or crafted, and deposited in the bank.
//! - **Shared bank**: characters coordinate through a bank lock so two of
//!   them never withdraw the same stock.
//! - **Cooldown pacing**: no action is sent before the previous one's
//!   cooldown expires.
//! - **Async Design**: one Tokio task per character.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mmoengine::api::HttpWorldApi;
//! use mmoengine::config::Config;
//! use mmoengine::engine::{shutdown_channel, Engine};
//! use mmoengine::models::Order;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let api = Arc::new(HttpWorldApi::new(config.api.clone())?);
//!     let (_trigger, shutdown) = shutdown_channel();
//!     let orders = config.orders.iter().cloned().map(Order::from).collect();
//!     let engine = Engine::new(api, config.engine.clone(), config.characters.clone(), orders, shutdown);
//!     for report in engine.run().await {
//!         println!("{}: {:?}", report.name, report.result);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`api`] - `WorldApi` trait and its HTTP implementation
//! - [`engine`] - scheduler, order resolution, coordination and operations
//! - [`models`] - characters, items, recipes, locations, orders
//! - [`config`] - TOML configuration
//! - [`logutil`] - scoped logging helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Supervisor    │ ← one task per character
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Engine        │ ← scheduler, orders, bank lock
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   World API     │ ← HTTP client, retries, paging
//! └─────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod logutil;
pub mod models;
