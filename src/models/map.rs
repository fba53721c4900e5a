use serde::{Deserialize, Serialize};
use std::fmt;

/// X, Y map coordinates as signed integers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Number of moves between two coordinates using the Manhattan distance formula.
///
/// Only used to rank candidate locations; movement itself is a single jump.
pub fn calculate_distance(one: Coords, two: Coords) -> u32 {
    one.x.abs_diff(two.x) + one.y.abs_diff(two.y)
}
