use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::character::Skill;

/// An item code with a quantity; used for bank listings, orders and config
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleItem {
    pub code: String,
    pub quantity: u32,
}

impl SimpleItem {
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity,
        }
    }
}

/// Broad classification of catalog items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Gathered from a resource node, no recipe
    Resource,
    /// Produced by a recipe at a workshop
    Craft,
    /// Anything else (drops, quest items, currency)
    Other,
}

/// One input line of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftMaterial {
    pub code: String,
    /// Quantity required per crafted unit
    pub quantity: u32,
    /// Quantity on hand at resolution time; transient, never sent to the API
    #[serde(default, skip_serializing)]
    pub available: u32,
}

impl CraftMaterial {
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity,
            available: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub skill: Skill,
    pub level: u32,
    pub materials: Vec<CraftMaterial>,
    /// Units produced per craft
    pub quantity: u32,
}

impl Recipe {
    /// Total number of material units consumed to craft one unit
    pub fn materials_per_set(&self) -> u32 {
        self.materials.iter().map(|m| m.quantity).sum()
    }

    /// How many sets fit in an empty inventory of `max_items`
    pub fn sets_per_load(&self, max_items: u32) -> u32 {
        match self.materials_per_set() {
            0 => max_items,
            per_set => max_items / per_set,
        }
    }

    /// How many sets the given holdings can pay for; the scarcest material binds
    pub fn affordable_sets(&self, holdings: &BankHoldings) -> u32 {
        self.materials
            .iter()
            .filter(|m| m.quantity > 0)
            .map(|m| holdings.quantity(&m.code) / m.quantity)
            .min()
            .unwrap_or(0)
    }

    /// Populate the transient `available` field of each material
    pub fn fill_availability(&mut self, holdings: &BankHoldings) {
        for m in &mut self.materials {
            m.available = holdings.quantity(&m.code);
        }
    }

    pub fn uses(&self, code: &str) -> bool {
        self.materials.iter().any(|m| m.code == code)
    }
}

/// Catalog entry for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub code: String,
    pub level: u32,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub recipe: Option<Recipe>,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        if self.recipe.is_some() {
            ItemKind::Craft
        } else if self.item_type == "resource" {
            ItemKind::Resource
        } else {
            ItemKind::Other
        }
    }

    /// Skill required to craft this item, derived from its recipe
    pub fn craft_skill(&self) -> Option<Skill> {
        self.recipe.as_ref().map(|r| r.skill)
    }

    /// Gathering skill that produced a raw resource, taken from its subtype
    pub fn gathering_skill(&self) -> Option<Skill> {
        if self.kind() != ItemKind::Resource {
            return None;
        }
        Skill::from_code(&self.subtype).filter(|s| Skill::GATHERING.contains(s))
    }
}

/// Live bank contents: item code -> quantity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankHoldings(BTreeMap<String, u32>);

impl BankHoldings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quantity(&self, code: &str) -> u32 {
        self.0.get(code).copied().unwrap_or(0)
    }

    pub fn insert(&mut self, code: impl Into<String>, quantity: u32) {
        *self.0.entry(code.into()).or_insert(0) += quantity;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_items(&self) -> u64 {
        self.0.values().map(|&v| u64::from(v)).sum()
    }
}

impl FromIterator<SimpleItem> for BankHoldings {
    fn from_iter<T: IntoIterator<Item = SimpleItem>>(iter: T) -> Self {
        let mut holdings = BankHoldings::new();
        for item in iter {
            if item.quantity > 0 {
                holdings.insert(item.code, item.quantity);
            }
        }
        holdings
    }
}
