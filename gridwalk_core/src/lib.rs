use serde::{Deserialize, Serialize};

pub mod command;
pub mod config;
pub mod error;
pub mod follower;
pub mod map;
pub mod obstacle;
pub mod oracle;
pub mod pathfinder;
pub mod terrain;
pub mod world;
pub mod zone;

pub use error::PathError;

/// Unique identifier for characters. `0` is the player, events start at `1`.
pub type EntityId = usize;

/// An ordered route of cells, excluding the cell the search started from.
pub type Path = Vec<Cell>;

/// Represents a 2D grid coordinate.
///
/// Coordinates are signed so that neighbors of edge cells (and commands
/// naming cells left of or above the map) can be represented and rejected by
/// a bounds check instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// Returns the adjacent cell one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell::new(self.x + dx, self.y + dy)
    }

    /// Returns the manhattan distance between two cells.
    #[inline]
    pub fn manhattan_distance(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Cell::new(x, y)
    }
}

/// The four orthogonal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions, in the order neighbors are examined during a search.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Returns the `(dx, dy)` unit offset of this direction. `y` grows downwards.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Picks the direction that moves from `from` towards `to`.
    ///
    /// The horizontal axis wins when both axes differ. Returns `None` when the
    /// cells are equal.
    pub fn towards(from: Cell, to: Cell) -> Option<Direction> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx != 0 {
            Some(if dx > 0 { Direction::Right } else { Direction::Left })
        } else if dy != 0 {
            Some(if dy > 0 { Direction::Down } else { Direction::Up })
        } else {
            None
        }
    }
}
