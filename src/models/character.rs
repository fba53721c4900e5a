//! Character state as reported by the game API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::map::Coords;

/// Skills tracked per character. Gathering skills produce raw resources,
/// the rest are crafting skills tied to a workshop of the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Woodcutting,
    Mining,
    Fishing,
    Cooking,
    Weaponcrafting,
    Gearcrafting,
    Jewelrycrafting,
}

impl Skill {
    /// Skills that gather raw resources from map nodes, in tie-break order.
    pub const GATHERING: [Skill; 3] = [Skill::Woodcutting, Skill::Mining, Skill::Fishing];

    /// API / workshop code for this skill
    pub fn code(&self) -> &'static str {
        match self {
            Skill::Woodcutting => "woodcutting",
            Skill::Mining => "mining",
            Skill::Fishing => "fishing",
            Skill::Cooking => "cooking",
            Skill::Weaponcrafting => "weaponcrafting",
            Skill::Gearcrafting => "gearcrafting",
            Skill::Jewelrycrafting => "jewelrycrafting",
        }
    }

    /// Parse from an API code (case-insensitive)
    pub fn from_code(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "woodcutting" => Some(Skill::Woodcutting),
            "mining" => Some(Skill::Mining),
            "fishing" => Some(Skill::Fishing),
            "cooking" => Some(Skill::Cooking),
            "weaponcrafting" => Some(Skill::Weaponcrafting),
            "gearcrafting" => Some(Skill::Gearcrafting),
            "jewelrycrafting" => Some(Skill::Jewelrycrafting),
            _ => None,
        }
    }

    /// Crafting skill that refines the raw output of a gathering skill.
    ///
    /// Fish are cooked; logs and ore are refined with their own skill.
    pub fn refining_skill(&self) -> Option<Skill> {
        match self {
            Skill::Woodcutting => Some(Skill::Woodcutting),
            Skill::Mining => Some(Skill::Mining),
            Skill::Fishing => Some(Skill::Cooking),
            _ => None,
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single inventory slot. Empty slots carry an empty code and zero quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub slot: u32,
    pub code: String,
    pub quantity: u32,
}

impl InventorySlot {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() || self.quantity == 0
    }
}

/// A character skill selection used when picking what to gather next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSkill {
    pub skill: Skill,
    pub current_level: u32,
    pub min_level: u32,
}

/// Character snapshot. Field names match the API payload so the wire
/// representation deserializes directly; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: String,
    pub level: u32,
    pub x: i32,
    pub y: i32,
    pub woodcutting_level: u32,
    pub mining_level: u32,
    pub fishing_level: u32,
    pub cooking_level: u32,
    pub weaponcrafting_level: u32,
    pub gearcrafting_level: u32,
    pub jewelrycrafting_level: u32,
    pub inventory_max_items: u32,
    pub inventory: Vec<InventorySlot>,
    pub cooldown_expiration: Option<DateTime<Utc>>,
}

impl Character {
    /// Current position on the map
    pub fn position(&self) -> Coords {
        Coords::new(self.x, self.y)
    }

    /// Total number of items carried across all slots
    pub fn count_inventory(&self) -> u32 {
        self.inventory.iter().map(|slot| slot.quantity).sum()
    }

    /// Quantity of a single item carried across all slots
    pub fn inventory_quantity(&self, code: &str) -> u32 {
        self.inventory
            .iter()
            .filter(|slot| slot.code == code)
            .map(|slot| slot.quantity)
            .sum()
    }

    /// Non-empty inventory slots
    pub fn occupied_slots(&self) -> impl Iterator<Item = &InventorySlot> {
        self.inventory.iter().filter(|slot| !slot.is_empty())
    }

    /// Fraction of carry capacity in use. A zero capacity counts as full.
    pub fn inventory_fullness(&self) -> f64 {
        if self.inventory_max_items == 0 {
            return 1.0;
        }
        f64::from(self.count_inventory()) / f64::from(self.inventory_max_items)
    }

    /// Whether the character should empty its inventory into the bank
    /// before doing anything that adds items.
    pub fn should_bank(&self, threshold: f64) -> bool {
        let percent_full = self.inventory_fullness();
        if percent_full > threshold {
            log::debug!(
                "{} should bank (percent_full={:.2}, threshold={:.2})",
                self.name,
                percent_full,
                threshold
            );
            true
        } else {
            false
        }
    }

    pub fn skill_level(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Woodcutting => self.woodcutting_level,
            Skill::Mining => self.mining_level,
            Skill::Fishing => self.fishing_level,
            Skill::Cooking => self.cooking_level,
            Skill::Weaponcrafting => self.weaponcrafting_level,
            Skill::Gearcrafting => self.gearcrafting_level,
            Skill::Jewelrycrafting => self.jewelrycrafting_level,
        }
    }

    /// Pick the lowest gathering skill so gathering levels stay balanced.
    /// Ties resolve in [`Skill::GATHERING`] order.
    pub fn choose_weakest_skill(&self, level_window: u32) -> CharacterSkill {
        let mut skills: Vec<CharacterSkill> = Skill::GATHERING
            .iter()
            .map(|&skill| {
                let current_level = self.skill_level(skill);
                CharacterSkill {
                    skill,
                    current_level,
                    min_level: current_level.saturating_sub(level_window),
                }
            })
            .collect();
        // stable sort keeps the declaration order for equal levels
        skills.sort_by_key(|s| s.current_level);
        skills[0]
    }

    /// Time left before the character may act again
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Duration {
        self.cooldown_expiration
            .and_then(|exp| (exp - now).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }
}
