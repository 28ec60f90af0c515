use serde::{Deserialize, Serialize};

use crate::{
    Cell, Direction,
    map::{Grid, GridError},
    oracle::{GridBounds, TerrainCollision},
};

/// Set of open exits of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Exits(u8);

impl Exits {
    pub const NONE: Exits = Exits(0);
    pub const ALL: Exits = Exits(0b1111);

    #[inline]
    fn bit(direction: Direction) -> u8 {
        match direction {
            Direction::Up => 0b0001,
            Direction::Down => 0b0010,
            Direction::Left => 0b0100,
            Direction::Right => 0b1000,
        }
    }

    pub fn only(direction: Direction) -> Exits {
        Exits(Self::bit(direction))
    }

    pub fn with(self, direction: Direction) -> Exits {
        Exits(self.0 | Self::bit(direction))
    }

    #[inline]
    pub fn contains(self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }
}

/// Represents the static type of a tile in the terrain grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Floor,
    Wall,
    /// A tile that can only be left through some of its sides.
    Ledge { exits: Exits },
}

impl CellType {
    pub fn exits(self) -> Exits {
        match self {
            CellType::Floor => Exits::ALL,
            CellType::Wall => Exits::NONE,
            CellType::Ledge { exits } => exits,
        }
    }
}

/// Errors produced while loading a map from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Map string is empty")]
    Empty,
    #[error("Map has zero width")]
    ZeroWidth,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map code '{code}' at position ({x}, {y})")]
    UnknownCode { code: String, x: usize, y: usize },
    #[error("Multiple start positions ('ST') found")]
    MultipleStarts,
    #[error("No start position ('ST') found in map")]
    NoStart,
}

/// The collision layer of a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainMap {
    tiles: Grid<CellType>,
}

impl TerrainMap {
    /// Creates a map where every tile is floor.
    pub fn open(width: usize, height: usize) -> Self {
        TerrainMap {
            tiles: Grid::new(width, height),
        }
    }

    pub fn from_grid(tiles: Grid<CellType>) -> Self {
        TerrainMap { tiles }
    }

    pub fn tile(&self, cell: Cell) -> Option<CellType> {
        self.tiles.get(cell).copied()
    }

    pub fn set_tile(&mut self, cell: Cell, tile: CellType) -> Result<(), GridError> {
        self.tiles.set(cell, tile)
    }

    pub fn tiles(&self) -> &Grid<CellType> {
        &self.tiles
    }
}

impl GridBounds for TerrainMap {
    fn width(&self) -> usize {
        self.tiles.width()
    }

    fn height(&self) -> usize {
        self.tiles.height()
    }
}

impl TerrainCollision for TerrainMap {
    fn is_exit_open(&self, cell: Cell, direction: Direction) -> bool {
        self.tile(cell)
            .is_some_and(|tile| tile.exits().contains(direction))
    }
}

/// Loads a terrain map and the player start from whitespace-separated codes.
///
/// | Code | Tile |
/// |---|---|
/// | `FL` | floor |
/// | `WL` | wall |
/// | `ST` | floor, player start |
/// | `EU` `ED` `EL` `ER` | ledge open only up/down/left/right |
pub fn load_map_from_string(map_string: &str) -> Result<(TerrainMap, Cell), MapError> {
    let lines: Vec<&str> = map_string.trim().lines().collect();
    if lines.is_empty() {
        return Err(MapError::Empty);
    }

    let height = lines.len();
    let mut width = 0;
    let mut parsed_rows: Vec<Vec<&str>> = Vec::with_capacity(height);

    for (y, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if y == 0 {
            width = tokens.len();
            if width == 0 {
                return Err(MapError::ZeroWidth);
            }
        } else if tokens.len() != width {
            return Err(MapError::InconsistentWidth {
                row: y,
                expected: width,
                found: tokens.len(),
            });
        }
        parsed_rows.push(tokens);
    }

    let mut tiles: Grid<CellType> = Grid::new(width, height);
    let mut start_position: Option<Cell> = None;

    for (y, row_tokens) in parsed_rows.iter().enumerate() {
        for (x, token) in row_tokens.iter().enumerate() {
            let cell = Cell::new(x as i32, y as i32);
            let tile = match *token {
                "ST" => {
                    if start_position.is_some() {
                        return Err(MapError::MultipleStarts);
                    }
                    start_position = Some(cell);
                    CellType::Floor
                }
                "FL" => CellType::Floor,
                "WL" => CellType::Wall,
                "EU" => ledge(Direction::Up),
                "ED" => ledge(Direction::Down),
                "EL" => ledge(Direction::Left),
                "ER" => ledge(Direction::Right),
                unknown => {
                    return Err(MapError::UnknownCode {
                        code: unknown.to_string(),
                        x,
                        y,
                    });
                }
            };
            tiles[cell] = tile;
        }
    }

    let start = start_position.ok_or(MapError::NoStart)?;
    Ok((TerrainMap::from_grid(tiles), start))
}

fn ledge(direction: Direction) -> CellType {
    CellType::Ledge {
        exits: Exits::only(direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_tiles_and_start() {
        let (map, start) = load_map_from_string(
            "
            FL WL ER
            ST FL FL
            ",
        )
        .unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(start, Cell::new(0, 1));
        assert_eq!(map.tile(Cell::new(1, 0)), Some(CellType::Wall));
        assert!(map.is_exit_open(Cell::new(2, 0), Direction::Right));
        assert!(!map.is_exit_open(Cell::new(2, 0), Direction::Down));
        assert!(!map.is_exit_open(Cell::new(1, 0), Direction::Up));
        assert!(map.is_exit_open(Cell::new(0, 1), Direction::Up));
    }

    #[test]
    fn rejects_malformed_maps() {
        assert_eq!(load_map_from_string("   "), Err(MapError::Empty));
        assert_eq!(
            load_map_from_string("ST FL\nFL"),
            Err(MapError::InconsistentWidth {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            load_map_from_string("ST XX"),
            Err(MapError::UnknownCode {
                code: "XX".to_string(),
                x: 1,
                y: 0
            })
        );
        assert_eq!(load_map_from_string("ST ST"), Err(MapError::MultipleStarts));
        assert_eq!(load_map_from_string("FL FL"), Err(MapError::NoStart));
    }

    #[test]
    fn exits_builder() {
        let exits = Exits::only(Direction::Up).with(Direction::Left);
        assert!(exits.contains(Direction::Up));
        assert!(exits.contains(Direction::Left));
        assert!(!exits.contains(Direction::Down));
        assert_eq!(Exits::ALL.with(Direction::Down), Exits::ALL);
    }
}
