//! # Domain Models
//!
//! Plain data types describing the game world as the engine sees it. Every
//! value here is a snapshot: the engine refetches state from the
//! [`WorldApi`](crate::api::WorldApi) whenever it needs a current view and
//! patches [`Character`] locally from action responses in between.
//!
//! - [`character`] - characters, inventory slots and skills
//! - [`map`] - coordinates and Manhattan distance
//! - [`location`] - map tiles keyed by `(kind, code)`
//! - [`resource`] / [`monster`] - catalog entries joined with their locations
//! - [`item`] - item catalog, recipes and bank holdings
//! - [`order`] - demand records processed by the order resolution engine

pub mod character;
pub mod item;
pub mod location;
pub mod map;
pub mod monster;
pub mod order;
pub mod resource;

pub use character::{Character, InventorySlot, Skill};
pub use item::{BankHoldings, CraftMaterial, Item, ItemKind, Recipe, SimpleItem};
pub use location::{Location, LocationKind, LocationMap, LocationSelector};
pub use map::{calculate_distance, Coords};
pub use monster::Monster;
pub use order::{Order, OrderAction};
pub use resource::Resource;
