//! Wire payloads of the game API and their conversion into domain models.
//!
//! Every response wraps its payload in `{"data": ...}`; listings are paged.
//! Fields the engine does not use are left to serde to ignore.

use serde::Deserialize;

use super::responses::{ActionResponse, Cooldown, FightResult, SkillInfo};
use super::ApiError;
use crate::models::{
    Character, Coords, CraftMaterial, Item, Location, LocationKind, Monster, Recipe, Resource,
    SimpleItem, Skill,
};

#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct PagedEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub pages: Option<u32>,
}

impl<T> PagedEnvelope<T> {
    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        match (self.page, self.pages) {
            (Some(page), Some(pages)) => page < pages,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CraftSchema {
    pub skill: Option<String>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub items: Vec<SimpleItem>,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ItemSchema {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub level: u32,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub craft: Option<CraftSchema>,
}

impl TryFrom<ItemSchema> for Item {
    type Error = ApiError;

    fn try_from(schema: ItemSchema) -> Result<Self, Self::Error> {
        let recipe = match schema.craft {
            None => None,
            Some(craft) => {
                let skill_code = craft.skill.unwrap_or_default();
                let skill = Skill::from_code(&skill_code).ok_or_else(|| {
                    ApiError::Decode(format!(
                        "item {} has unknown craft skill '{}'",
                        schema.code, skill_code
                    ))
                })?;
                Some(Recipe {
                    skill,
                    level: craft.level,
                    materials: craft
                        .items
                        .into_iter()
                        .map(|i| CraftMaterial::new(i.code, i.quantity))
                        .collect(),
                    quantity: craft.quantity.max(1),
                })
            }
        };
        Ok(Item {
            name: schema.name,
            code: schema.code,
            level: schema.level,
            item_type: schema.item_type,
            subtype: schema.subtype,
            recipe,
        })
    }
}

/// `GET /items/{code}` has answered both with the bare item and with
/// `{"item": ..., "ge": ...}` across API versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SingleItemSchema {
    Wrapped { item: ItemSchema },
    Bare(ItemSchema),
}

impl SingleItemSchema {
    pub fn into_item(self) -> ItemSchema {
        match self {
            SingleItemSchema::Wrapped { item } => item,
            SingleItemSchema::Bare(item) => item,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MapContentSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct MapSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skin: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub content: Option<MapContentSchema>,
}

impl MapSchema {
    /// Tiles without content are not addressable locations
    pub fn into_location(self) -> Option<Location> {
        let content = self.content?;
        Some(Location {
            name: self.name,
            skin: self.skin,
            coords: Coords::new(self.x, self.y),
            code: content.code,
            kind: LocationKind::from(content.kind),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourceSchema {
    pub name: String,
    pub code: String,
    pub skill: String,
    #[serde(default)]
    pub level: u32,
}

impl TryFrom<ResourceSchema> for Resource {
    type Error = ApiError;

    fn try_from(schema: ResourceSchema) -> Result<Self, Self::Error> {
        let skill = Skill::from_code(&schema.skill).ok_or_else(|| {
            ApiError::Decode(format!(
                "resource {} has unknown skill '{}'",
                schema.code, schema.skill
            ))
        })?;
        Ok(Resource {
            name: schema.name,
            code: schema.code,
            skill,
            level: schema.level,
            location: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MonsterSchema {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub level: u32,
}

impl From<MonsterSchema> for Monster {
    fn from(schema: MonsterSchema) -> Self {
        Monster {
            name: schema.name,
            code: schema.code,
            level: schema.level,
            location: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveData {
    pub cooldown: Cooldown,
    pub character: Character,
}

impl From<MoveData> for ActionResponse {
    fn from(data: MoveData) -> Self {
        ActionResponse {
            character: data.character,
            cooldown: data.cooldown,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SkillData {
    pub cooldown: Cooldown,
    #[serde(default)]
    pub details: SkillInfo,
    pub character: Character,
}

#[derive(Debug, Deserialize)]
pub struct FightData {
    pub cooldown: Cooldown,
    #[serde(default)]
    pub fight: FightResult,
    pub character: Character,
}

#[derive(Debug, Deserialize)]
pub struct BankItemSchema {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct BankData {
    pub cooldown: Cooldown,
    #[serde(default)]
    pub item: Option<BankItemSchema>,
    #[serde(default)]
    pub bank: Vec<SimpleItem>,
    pub character: Character,
}

/// Request body for move
#[derive(Debug, serde::Serialize)]
pub struct MoveRequest {
    pub x: i32,
    pub y: i32,
}

/// Request body for craft, deposit and withdraw
#[derive(Debug, serde::Serialize)]
pub struct ItemRequest<'a> {
    pub code: &'a str,
    pub quantity: u32,
}
