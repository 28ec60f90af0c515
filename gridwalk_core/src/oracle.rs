//! Passability decisions consulted by the search.

use serde::{Deserialize, Serialize};

use crate::{Cell, Direction, zone::ZoneRegistry};

/// Exposes the dimensions of the map being searched.
pub trait GridBounds {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Checks `0 <= x < width` and `0 <= y < height`.
    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width()
            && (cell.y as usize) < self.height()
    }
}

/// Per-cell, per-direction collision data of the map.
pub trait TerrainCollision {
    /// Returns true if a character standing on `cell` may leave it towards `direction`.
    fn is_exit_open(&self, cell: Cell, direction: Direction) -> bool;
}

/// How terrain collision decides whether a cell can be entered when no zone
/// is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainRule {
    /// A cell is enterable if at least one of its four exits is open,
    /// regardless of the direction it is entered from.
    #[default]
    AnyExit,
    /// Moving from `a` to `b` requires the exit of `a` towards `b` and the
    /// exit of `b` back towards `a` to both be open.
    EntryDirection,
}

/// The interface [`PathFinder`](crate::pathfinder::PathFinder) searches through.
pub trait Passability: GridBounds {
    /// Returns true if a character on `from` may step towards `direction`.
    fn can_enter(&self, from: Cell, direction: Direction) -> bool;
}

/// Combines map bounds, zone membership, and terrain collision.
#[derive(Debug, Clone, Copy)]
pub struct PassabilityOracle<'a, M> {
    map: &'a M,
    zones: &'a ZoneRegistry,
    rule: TerrainRule,
}

impl<'a, M> PassabilityOracle<'a, M>
where
    M: GridBounds + TerrainCollision,
{
    pub fn new(map: &'a M, zones: &'a ZoneRegistry) -> Self {
        Self {
            map,
            zones,
            rule: TerrainRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: TerrainRule) -> Self {
        self.rule = rule;
        self
    }

    /// Returns true if `cell` may be entered.
    ///
    /// Out-of-bounds cells never are. With zones registered, only cells
    /// belonging to some zone are; otherwise a cell is passable unless it is
    /// walled on all four sides.
    pub fn is_passable(&self, cell: Cell) -> bool {
        if !self.map.in_bounds(cell) {
            return false;
        }
        if !self.zones.is_empty() {
            return self.zones.is_walkable(cell);
        }
        Direction::ALL
            .iter()
            .any(|&direction| self.map.is_exit_open(cell, direction))
    }
}

impl<M> GridBounds for PassabilityOracle<'_, M>
where
    M: GridBounds,
{
    fn width(&self) -> usize {
        self.map.width()
    }

    fn height(&self) -> usize {
        self.map.height()
    }
}

impl<M> Passability for PassabilityOracle<'_, M>
where
    M: GridBounds + TerrainCollision,
{
    fn can_enter(&self, from: Cell, direction: Direction) -> bool {
        let to = from.step(direction);
        match self.rule {
            TerrainRule::AnyExit => self.is_passable(to),
            TerrainRule::EntryDirection => {
                if !self.map.in_bounds(to) {
                    return false;
                }
                if !self.zones.is_empty() {
                    return self.zones.is_walkable(to);
                }
                self.map.is_exit_open(from, direction)
                    && self.map.is_exit_open(to, direction.opposite())
            }
        }
    }
}
