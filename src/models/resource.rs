use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::character::Skill;
use super::location::{Location, LocationKind, LocationMap};
use super::map::Coords;

/// A gatherable resource node, optionally joined with its map location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub code: String,
    pub skill: Skill,
    pub level: u32,
    pub location: Option<Location>,
}

impl Resource {
    pub fn key(&self) -> (LocationKind, String) {
        (LocationKind::Resource, self.code.clone())
    }

    pub fn coords(&self) -> Option<Coords> {
        self.location.as_ref().map(|l| l.coords)
    }
}

/// Attach a location to every resource with a matching `(resource, code)` key.
/// Resources without a location on the map are dropped.
pub fn join_locations(resources: Vec<Resource>, locations: &LocationMap) -> Vec<Resource> {
    resources
        .into_iter()
        .filter_map(|mut r| {
            let loc = locations.get(&r.key())?;
            r.location = Some(loc.clone());
            Some(r)
        })
        .collect()
}

/// Deduplicate resources by code, keeping the first occurrence
pub fn dedupe(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::new();
    resources
        .into_iter()
        .filter(|r| seen.insert(r.code.clone()))
        .collect()
}
