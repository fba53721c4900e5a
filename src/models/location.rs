use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::map::Coords;

/// Type of content found on a map tile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationKind {
    Monster,
    Resource,
    Workshop,
    Bank,
    GrandExchange,
    TasksMaster,
    Other(String),
}

impl LocationKind {
    pub fn as_str(&self) -> &str {
        match self {
            LocationKind::Monster => "monster",
            LocationKind::Resource => "resource",
            LocationKind::Workshop => "workshop",
            LocationKind::Bank => "bank",
            LocationKind::GrandExchange => "grand_exchange",
            LocationKind::TasksMaster => "tasks_master",
            LocationKind::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for LocationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "monster" => LocationKind::Monster,
            "resource" => LocationKind::Resource,
            "workshop" => LocationKind::Workshop,
            "bank" => LocationKind::Bank,
            "grand_exchange" => LocationKind::GrandExchange,
            "tasks_master" => LocationKind::TasksMaster,
            _ => LocationKind::Other(s),
        }
    }
}

impl From<&str> for LocationKind {
    fn from(s: &str) -> Self {
        LocationKind::from(s.to_string())
    }
}

impl From<LocationKind> for String {
    fn from(kind: LocationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A map tile with content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub skin: String,
    pub coords: Coords,
    pub code: String,
    pub kind: LocationKind,
}

impl Location {
    /// Join key shared with resources and monsters
    pub fn key(&self) -> (LocationKind, String) {
        (self.kind.clone(), self.code.clone())
    }
}

/// Selects "the nearest location of this kind and code"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSelector {
    pub kind: LocationKind,
    pub code: String,
}

impl LocationSelector {
    pub fn new(kind: LocationKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }

    pub fn bank() -> Self {
        Self::new(LocationKind::Bank, "bank")
    }

    pub fn workshop(skill: impl Into<String>) -> Self {
        Self::new(LocationKind::Workshop, skill)
    }

    pub fn matches(&self, location: &Location) -> bool {
        location.kind == self.kind && location.code == self.code
    }
}

impl fmt::Display for LocationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.kind, self.code)
    }
}

/// Locations keyed by `(kind, code)`. When several tiles share a key the first one wins.
pub type LocationMap = HashMap<(LocationKind, String), Location>;

pub fn locations_to_map(locations: &[Location]) -> LocationMap {
    let mut map = LocationMap::new();
    for loc in locations {
        map.entry(loc.key()).or_insert_with(|| loc.clone());
    }
    map
}
