use serde::{Deserialize, Serialize};

use super::location::{Location, LocationKind, LocationMap};
use super::map::Coords;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub code: String,
    pub level: u32,
    pub location: Option<Location>,
}

impl Monster {
    pub fn key(&self) -> (LocationKind, String) {
        (LocationKind::Monster, self.code.clone())
    }

    pub fn coords(&self) -> Option<Coords> {
        self.location.as_ref().map(|l| l.coords)
    }
}

/// Attach map locations to monsters; monsters not present on the map are dropped.
pub fn join_locations(monsters: Vec<Monster>, locations: &LocationMap) -> Vec<Monster> {
    monsters
        .into_iter()
        .filter_map(|mut m| {
            let loc = locations.get(&m.key())?;
            m.location = Some(loc.clone());
            Some(m)
        })
        .collect()
}

/// Inclusive level band of monsters worth fighting for a character level.
///
/// `floor` and `ceiling` are fractions of the character level, e.g. 0.5 / 0.1
/// gives `[level - 50%, level + 10%]`.
pub fn level_band(level: u32, floor: f64, ceiling: f64) -> (u32, u32) {
    let level = f64::from(level);
    let min = (level - level * floor).floor().max(0.0) as u32;
    let max = (level + level * ceiling).ceil().max(0.0) as u32;
    (min, max)
}
