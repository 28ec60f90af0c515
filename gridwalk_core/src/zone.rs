//! Named walkable zones.
//!
//! While the registry holds at least one zone, zone membership replaces the
//! terrain rules for every cell of the map.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Cell, PathError};

/// Stores named sets of walkable cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRegistry {
    zones: HashMap<String, HashSet<Cell>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cells` under `name`, replacing any zone with the same name.
    /// Duplicate cells collapse.
    pub fn define_zone<I>(&mut self, name: impl Into<String>, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        let name = name.into();
        let cells: HashSet<Cell> = cells.into_iter().collect();
        debug!(zone = %name, cells = cells.len(), "zone defined");
        self.zones.insert(name, cells);
    }

    /// Registers the inclusive rectangle `(x1, y1)..=(x2, y2)` under `name`.
    ///
    /// A single row, column, or cell is a valid rectangle. A reversed range on
    /// either axis is rejected and leaves the registry untouched.
    pub fn define_rect_zone(
        &mut self,
        name: impl Into<String>,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    ) -> Result<(), PathError> {
        let name = name.into();
        if x1 > x2 || y1 > y2 {
            return Err(PathError::InvalidZoneRange {
                name,
                x1,
                y1,
                x2,
                y2,
            });
        }
        let cells = (x1..=x2).flat_map(|x| (y1..=y2).map(move |y| Cell::new(x, y)));
        self.define_zone(name, cells);
        Ok(())
    }

    /// Deletes the zone called `name`, returning its cells.
    pub fn remove_zone(&mut self, name: &str) -> Result<HashSet<Cell>, PathError> {
        self.zones
            .remove(name)
            .ok_or_else(|| PathError::UnknownZone(name.to_string()))
    }

    /// Returns true if `cell` belongs to any registered zone.
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.zones.values().any(|zone| zone.contains(&cell))
    }

    pub fn zone(&self, name: &str) -> Result<&HashSet<Cell>, PathError> {
        self.zones
            .get(name)
            .ok_or_else(|| PathError::UnknownZone(name.to_string()))
    }

    /// Returns the registered zone names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.zones.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.zones.len()
    }
}
