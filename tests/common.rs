//! Test utilities & fixtures.
//! Provides [`MockWorld`], an in-memory `WorldApi` with a shared bank, and
//! helpers to build characters, items and map tiles.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mmoengine::api::{
    ActionResponse, ApiError, ApiResult, BankResponse, Cooldown, FightResponse, FightResult,
    ItemQuery, LocationQuery, SkillInfo, SkillResponse, WorldApi,
};
use mmoengine::config::EngineConfig;
use mmoengine::engine::{
    shutdown_channel, CharacterContext, Coordination, SharedState, ShutdownTrigger,
};
use mmoengine::models::{
    BankHoldings, Character, Coords, CraftMaterial, InventorySlot, Item, Location, LocationKind,
    Monster, Recipe, Resource, SimpleItem, Skill,
};

/// Remote actions recorded by the mock, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Move { character: String, coords: Coords },
    Gather { character: String },
    Fight { character: String },
    Craft { character: String, code: String, quantity: u32 },
    Deposit { character: String, code: String, quantity: u32 },
    Withdraw { character: String, code: String, quantity: u32 },
}

impl Call {
    pub fn character(&self) -> &str {
        match self {
            Call::Move { character, .. }
            | Call::Gather { character }
            | Call::Fight { character }
            | Call::Craft { character, .. }
            | Call::Deposit { character, .. }
            | Call::Withdraw { character, .. } => character,
        }
    }
}

#[derive(Default)]
struct World {
    characters: HashMap<String, Character>,
    bank: BankHoldings,
    calls: Vec<Call>,
    /// Actions performed while the watched bank lock was held
    locked_calls: Vec<Call>,
}

/// In-memory game world. Every call yields once so concurrent characters
/// interleave the way they would against a real server.
#[derive(Default)]
pub struct MockWorld {
    world: Mutex<World>,
    items: HashMap<String, Item>,
    locations: Vec<Location>,
    /// resource node -> (node, dropped item code)
    resources: Vec<(Resource, String)>,
    monsters: Vec<Monster>,
    resource_lookups: AtomicUsize,
    bank_lock: Option<Coordination>,
    /// Reading this character panics
    panics_for: Option<String>,
}

fn status(code: u16, body: &str) -> ApiError {
    ApiError::Status {
        status: code,
        body: body.to_string(),
    }
}

fn add_inventory(character: &mut Character, code: &str, quantity: u32) {
    if let Some(slot) = character.inventory.iter_mut().find(|s| s.code == code) {
        slot.quantity += quantity;
    } else if let Some(slot) = character.inventory.iter_mut().find(|s| s.is_empty()) {
        slot.code = code.to_string();
        slot.quantity = quantity;
    } else {
        let slot = character.inventory.len() as u32 + 1;
        character.inventory.push(InventorySlot {
            slot,
            code: code.to_string(),
            quantity,
        });
    }
}

fn remove_inventory(character: &mut Character, code: &str, quantity: u32) -> ApiResult<()> {
    if character.inventory_quantity(code) < quantity {
        return Err(status(478, &format!("missing {} x{}", code, quantity)));
    }
    let slot = character
        .inventory
        .iter_mut()
        .find(|s| s.code == code)
        .ok_or_else(|| status(478, code))?;
    slot.quantity -= quantity;
    if slot.quantity == 0 {
        slot.code.clear();
    }
    Ok(())
}

fn expired() -> Cooldown {
    Cooldown::expired_at(Utc::now() - ChronoDuration::seconds(1))
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(self, character: Character) -> Self {
        self.world
            .lock()
            .unwrap()
            .characters
            .insert(character.name.clone(), character);
        self
    }

    pub fn with_bank(self, code: &str, quantity: u32) -> Self {
        self.world.lock().unwrap().bank.insert(code, quantity);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.code.clone(), item);
        self
    }

    pub fn with_location(mut self, kind: LocationKind, code: &str, x: i32, y: i32) -> Self {
        self.locations.push(location(kind, code, x, y));
        self
    }

    /// A resource node at `(x, y)` dropping one `drop` per gather
    pub fn with_resource(mut self, code: &str, skill: Skill, level: u32, drop: &str, x: i32, y: i32) -> Self {
        self.locations.push(location(LocationKind::Resource, code, x, y));
        self.resources.push((
            Resource {
                name: code.to_string(),
                code: code.to_string(),
                skill,
                level,
                location: None,
            },
            drop.to_string(),
        ));
        self
    }

    pub fn with_monster(mut self, code: &str, level: u32, x: i32, y: i32) -> Self {
        self.locations.push(location(LocationKind::Monster, code, x, y));
        self.monsters.push(Monster {
            name: code.to_string(),
            code: code.to_string(),
            level,
            location: None,
        });
        self
    }

    /// Make any read of `name` panic, as a bug in a character task would
    pub fn panicking_for(mut self, name: &str) -> Self {
        self.panics_for = Some(name.to_string());
        self
    }

    /// Record which actions happen while `coordination` holds the bank lock
    pub fn watch_bank_lock(mut self, coordination: Coordination) -> Self {
        self.bank_lock = Some(coordination);
        self
    }

    pub fn locked_calls(&self) -> Vec<Call> {
        self.world.lock().unwrap().locked_calls.clone()
    }

    /// Number of `get_resources_by_drop` requests served
    pub fn resource_lookups(&self) -> usize {
        self.resource_lookups.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.world.lock().unwrap().calls.clone()
    }

    pub fn withdrawals(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Withdraw { .. }))
            .collect()
    }

    pub fn bank_quantity(&self, code: &str) -> u32 {
        self.world.lock().unwrap().bank.quantity(code)
    }

    pub fn character(&self, name: &str) -> Character {
        self.world.lock().unwrap().characters[name].clone()
    }

    fn place(&self, resource: &Resource) -> Option<Resource> {
        let loc = self
            .locations
            .iter()
            .find(|l| l.kind == LocationKind::Resource && l.code == resource.code)?;
        let mut placed = resource.clone();
        placed.location = Some(loc.clone());
        Some(placed)
    }

    fn act<T>(
        &self,
        name: &str,
        call: Call,
        f: impl FnOnce(&mut Character, &mut BankHoldings) -> ApiResult<T>,
    ) -> ApiResult<(ActionResponse, T)> {
        let mut world = self.world.lock().unwrap();
        let World {
            characters,
            bank,
            calls,
            locked_calls,
        } = &mut *world;
        let character = characters
            .get_mut(name)
            .ok_or_else(|| ApiError::NotFound(format!("character {}", name)))?;
        let out = f(character, bank)?;
        if self.bank_lock.as_ref().is_some_and(|c| c.bank_locked()) {
            locked_calls.push(call.clone());
        }
        calls.push(call);
        Ok((
            ActionResponse {
                character: character.clone(),
                cooldown: expired(),
            },
            out,
        ))
    }

    fn bank_response(&self, response: ActionResponse, code: &str, quantity: u32) -> BankResponse {
        let bank = self
            .world
            .lock()
            .unwrap()
            .bank
            .iter()
            .map(|(c, q)| SimpleItem::new(c, q))
            .collect();
        BankResponse {
            response,
            item: SimpleItem::new(code, quantity),
            bank,
        }
    }
}

#[async_trait]
impl WorldApi for MockWorld {
    async fn get_character(&self, name: &str) -> ApiResult<Character> {
        tokio::task::yield_now().await;
        if self.panics_for.as_deref() == Some(name) {
            panic!("corrupt character record for {}", name);
        }
        self.world
            .lock()
            .unwrap()
            .characters
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("character {}", name)))
    }

    async fn get_bank_items(&self) -> ApiResult<BankHoldings> {
        tokio::task::yield_now().await;
        Ok(self.world.lock().unwrap().bank.clone())
    }

    async fn get_item(&self, code: &str) -> ApiResult<Item> {
        tokio::task::yield_now().await;
        self.items
            .get(code)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("item {}", code)))
    }

    async fn get_items(&self, query: &ItemQuery) -> ApiResult<Vec<Item>> {
        tokio::task::yield_now().await;
        let mut items: Vec<Item> = self.items.values().filter(|i| query.matches(i)).cloned().collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items)
    }

    async fn get_locations(&self, query: &LocationQuery) -> ApiResult<Vec<Location>> {
        tokio::task::yield_now().await;
        Ok(self.locations.iter().filter(|l| query.matches(l)).cloned().collect())
    }

    async fn get_resources_by_drop(&self, code: &str) -> ApiResult<Vec<Resource>> {
        tokio::task::yield_now().await;
        self.resource_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .resources
            .iter()
            .filter(|(_, drop)| drop == code)
            .filter_map(|(r, _)| self.place(r))
            .collect())
    }

    async fn get_resources_by_skill(&self, skill: Skill, min_level: u32, max_level: u32) -> ApiResult<Vec<Resource>> {
        tokio::task::yield_now().await;
        Ok(self
            .resources
            .iter()
            .filter(|(r, _)| r.skill == skill && r.level >= min_level && r.level <= max_level)
            .filter_map(|(r, _)| self.place(r))
            .collect())
    }

    async fn get_monsters(&self, min_level: u32, max_level: u32) -> ApiResult<Vec<Monster>> {
        tokio::task::yield_now().await;
        Ok(self
            .monsters
            .iter()
            .filter(|m| m.level >= min_level && m.level <= max_level)
            .cloned()
            .collect())
    }

    async fn move_to(&self, character: &str, coords: Coords) -> ApiResult<ActionResponse> {
        tokio::task::yield_now().await;
        let call = Call::Move {
            character: character.to_string(),
            coords,
        };
        let (response, ()) = self.act(character, call, |c, _| {
            if c.position() == coords {
                return Err(status(490, "already at destination"));
            }
            c.x = coords.x;
            c.y = coords.y;
            Ok(())
        })?;
        Ok(response)
    }

    async fn gather(&self, character: &str) -> ApiResult<SkillResponse> {
        tokio::task::yield_now().await;
        let call = Call::Gather {
            character: character.to_string(),
        };
        let (response, drop) = self.act(character, call, |c, _| {
            let here = c.position();
            let drop = self
                .resources
                .iter()
                .find(|(r, _)| self.place(r).and_then(|p| p.coords()) == Some(here))
                .map(|(_, drop)| drop.clone())
                .ok_or_else(|| status(598, "no resource here"))?;
            if c.count_inventory() >= c.inventory_max_items {
                return Err(status(497, "inventory full"));
            }
            add_inventory(c, &drop, 1);
            Ok(drop)
        })?;
        Ok(SkillResponse {
            response,
            details: SkillInfo {
                xp: 1,
                items: vec![SimpleItem::new(drop, 1)],
            },
        })
    }

    async fn fight(&self, character: &str) -> ApiResult<FightResponse> {
        tokio::task::yield_now().await;
        let call = Call::Fight {
            character: character.to_string(),
        };
        let (response, ()) = self.act(character, call, |c, _| {
            add_inventory(c, "feather", 1);
            Ok(())
        })?;
        Ok(FightResponse {
            response,
            fight: FightResult {
                xp: 5,
                gold: 1,
                drops: vec![SimpleItem::new("feather", 1)],
                turns: 3,
                result: "win".to_string(),
            },
        })
    }

    async fn craft(&self, character: &str, code: &str, quantity: u32) -> ApiResult<SkillResponse> {
        tokio::task::yield_now().await;
        let recipe = self
            .items
            .get(code)
            .and_then(|i| i.recipe.clone())
            .ok_or_else(|| status(404, "no recipe"))?;
        let call = Call::Craft {
            character: character.to_string(),
            code: code.to_string(),
            quantity,
        };
        let produced = quantity * recipe.quantity;
        let (response, ()) = self.act(character, call, |c, _| {
            for m in &recipe.materials {
                remove_inventory(c, &m.code, m.quantity * quantity)?;
            }
            add_inventory(c, code, produced);
            Ok(())
        })?;
        Ok(SkillResponse {
            response,
            details: SkillInfo {
                xp: 10,
                items: vec![SimpleItem::new(code, produced)],
            },
        })
    }

    async fn deposit(&self, character: &str, code: &str, quantity: u32) -> ApiResult<BankResponse> {
        tokio::task::yield_now().await;
        let call = Call::Deposit {
            character: character.to_string(),
            code: code.to_string(),
            quantity,
        };
        let (response, ()) = self.act(character, call, |c, bank| {
            remove_inventory(c, code, quantity)?;
            bank.insert(code, quantity);
            Ok(())
        })?;
        Ok(self.bank_response(response, code, quantity))
    }

    async fn withdraw(&self, character: &str, code: &str, quantity: u32) -> ApiResult<BankResponse> {
        tokio::task::yield_now().await;
        let call = Call::Withdraw {
            character: character.to_string(),
            code: code.to_string(),
            quantity,
        };
        let (response, ()) = self.act(character, call, |c, bank| {
            let held = bank.quantity(code);
            if held < quantity {
                return Err(status(478, &format!("bank holds {} {}", held, code)));
            }
            let mut rest = BankHoldings::new();
            for (k, q) in bank.iter() {
                let q = if k == code { q - quantity } else { q };
                if q > 0 {
                    rest.insert(k, q);
                }
            }
            *bank = rest;
            add_inventory(c, code, quantity);
            Ok(())
        })?;
        Ok(self.bank_response(response, code, quantity))
    }
}

pub fn location(kind: LocationKind, code: &str, x: i32, y: i32) -> Location {
    Location {
        name: code.to_string(),
        skin: code.to_string(),
        coords: Coords::new(x, y),
        code: code.to_string(),
        kind,
    }
}

/// A character with all skills at `level` and an empty inventory of `capacity`
pub fn character(name: &str, level: u32, capacity: u32) -> Character {
    Character {
        name: name.to_string(),
        level,
        woodcutting_level: level,
        mining_level: level,
        fishing_level: level,
        cooking_level: level,
        weaponcrafting_level: level,
        gearcrafting_level: level,
        jewelrycrafting_level: level,
        inventory_max_items: capacity,
        ..Character::default()
    }
}

pub fn raw_item(code: &str, subtype: &str) -> Item {
    Item {
        name: code.to_string(),
        code: code.to_string(),
        level: 1,
        item_type: "resource".to_string(),
        subtype: subtype.to_string(),
        recipe: None,
    }
}

pub fn crafted_item(code: &str, skill: Skill, level: u32, materials: &[(&str, u32)]) -> Item {
    Item {
        name: code.to_string(),
        code: code.to_string(),
        level,
        item_type: "weapon".to_string(),
        subtype: String::new(),
        recipe: Some(Recipe {
            skill,
            level,
            materials: materials
                .iter()
                .map(|(c, q)| CraftMaterial::new(*c, *q))
                .collect(),
            quantity: 1,
        }),
    }
}

/// Standard little world: bank at (4, 1), weaponcrafting and mining
/// workshops, copper rocks at (2, 0) dropping copper ore, and a copper
/// dagger needing 6 copper bars.
pub fn forge_world() -> MockWorld {
    MockWorld::new()
        .with_location(LocationKind::Bank, "bank", 4, 1)
        .with_location(LocationKind::Workshop, "weaponcrafting", 2, 2)
        .with_location(LocationKind::Workshop, "mining", 1, 5)
        .with_resource("copper_rocks", Skill::Mining, 1, "copper_ore", 2, 0)
        .with_item(raw_item("copper_ore", "mining"))
        .with_item({
            let mut bar = crafted_item("copper", Skill::Mining, 1, &[("copper_ore", 10)]);
            bar.item_type = "resource".to_string();
            bar.subtype = "bar".to_string();
            bar
        })
        .with_item(crafted_item("copper_dagger", Skill::Weaponcrafting, 1, &[("copper", 6)]))
}

pub fn fast_settings() -> EngineConfig {
    EngineConfig {
        idle_seconds: 1,
        ..EngineConfig::default()
    }
}

pub fn shared(world: Arc<MockWorld>) -> (SharedState, ShutdownTrigger) {
    let (trigger, shutdown) = shutdown_channel();
    (SharedState::new(world, fast_settings(), shutdown), trigger)
}

pub fn context(world: Arc<MockWorld>, name: &str) -> (CharacterContext, ShutdownTrigger) {
    let (state, trigger) = shared(world);
    (CharacterContext::new(name, state), trigger)
}

/// Like [`context`], but the character uses `coordination` as its bank lock
pub fn context_with_lock(
    world: Arc<MockWorld>,
    name: &str,
    coordination: Coordination,
) -> (CharacterContext, ShutdownTrigger) {
    let (mut state, trigger) = shared(world);
    state.coordination = coordination;
    (CharacterContext::new(name, state), trigger)
}
