//! A* shortest-path search over a 4-connected grid.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    Cell, Direction, Path, PathError,
    oracle::Passability,
};

/// A search node. Parents are indices into the search's node arena, so they
/// are only meaningful for the duration of one [`PathFinder::find_path`] call.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    cell: Cell,
    g: u32,
    h: u32,
    f: u32,
    parent: Option<usize>,
}

/// Finds shortest paths with unit step costs and a manhattan heuristic.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a, P> {
    passability: &'a P,
}

impl<'a, P> PathFinder<'a, P>
where
    P: Passability,
{
    pub fn new(passability: &'a P) -> Self {
        Self { passability }
    }

    /// Searches with obstacle checks enabled.
    pub fn find_route(&self, start: Cell, goal: Cell) -> Result<Option<Path>, PathError> {
        self.find_path(start, goal, true)
    }

    /// Computes the shortest path from `start` to `goal`.
    ///
    /// The returned path excludes `start` and ends with `goal`; it is empty
    /// when both are the same cell. `Ok(None)` means the goal is unreachable.
    ///
    /// When `check_obstacles` is false every in-bounds neighbor is accepted.
    /// Both endpoints must lie inside the grid.
    ///
    /// Among nodes with equal `f` the one inserted into the open set first is
    /// expanded, so results are deterministic for a given map.
    pub fn find_path(
        &self,
        start: Cell,
        goal: Cell,
        check_obstacles: bool,
    ) -> Result<Option<Path>, PathError> {
        self.check_bounds(start)?;
        self.check_bounds(goal)?;

        let mut nodes: Vec<SearchNode> = Vec::new();
        // Arena indices of unexpanded nodes, in insertion order.
        let mut open: Vec<usize> = Vec::new();
        let mut open_index: HashMap<Cell, usize> = HashMap::new();
        let mut closed: HashSet<Cell> = HashSet::new();

        let h = start.manhattan_distance(goal);
        nodes.push(SearchNode {
            cell: start,
            g: 0,
            h,
            f: h,
            parent: None,
        });
        open.push(0);
        open_index.insert(start, 0);

        while !open.is_empty() {
            let mut best = 0;
            for (slot, &idx) in open.iter().enumerate().skip(1) {
                if nodes[idx].f < nodes[open[best]].f {
                    best = slot;
                }
            }
            let current_idx = open.remove(best);
            let current = nodes[current_idx];
            open_index.remove(&current.cell);

            if current.cell == goal {
                let path = reconstruct(&nodes, current_idx);
                debug!(
                    ?start,
                    ?goal,
                    steps = path.len(),
                    expanded = closed.len(),
                    "path found"
                );
                return Ok(Some(path));
            }
            closed.insert(current.cell);

            for direction in Direction::ALL {
                let next = current.cell.step(direction);
                if check_obstacles {
                    if !self.passability.can_enter(current.cell, direction) {
                        continue;
                    }
                } else if !self.passability.in_bounds(next) {
                    continue;
                }
                if closed.contains(&next) {
                    continue;
                }

                let g = current.g + 1;
                match open_index.get(&next) {
                    None => {
                        let h = next.manhattan_distance(goal);
                        nodes.push(SearchNode {
                            cell: next,
                            g,
                            h,
                            f: g + h,
                            parent: Some(current_idx),
                        });
                        let idx = nodes.len() - 1;
                        open.push(idx);
                        open_index.insert(next, idx);
                    }
                    Some(&idx) => {
                        let node = &mut nodes[idx];
                        if g < node.g {
                            node.g = g;
                            node.f = g + node.h;
                            node.parent = Some(current_idx);
                        }
                    }
                }
            }
        }

        debug!(?start, ?goal, expanded = closed.len(), "no path");
        Ok(None)
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), PathError> {
        if self.passability.in_bounds(cell) {
            Ok(())
        } else {
            Err(PathError::OutOfBounds {
                cell,
                width: self.passability.width(),
                height: self.passability.height(),
            })
        }
    }
}

/// Walks parent links back from `goal_idx`, dropping the root.
fn reconstruct(nodes: &[SearchNode], goal_idx: usize) -> Path {
    let mut path = Vec::new();
    let mut idx = goal_idx;
    while let Some(parent) = nodes[idx].parent {
        path.push(nodes[idx].cell);
        idx = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        oracle::{GridBounds, PassabilityOracle},
        terrain::{CellType, TerrainMap},
        zone::ZoneRegistry,
    };

    fn assert_connected(start: Cell, path: &[Cell]) {
        let mut previous = start;
        for &cell in path {
            assert_eq!(
                previous.manhattan_distance(cell),
                1,
                "{previous:?} -> {cell:?} is not a single orthogonal step"
            );
            previous = cell;
        }
    }

    /// Breadth-first distance used as a reference for optimality.
    fn bfs_distance(map: &TerrainMap, zones: &ZoneRegistry, start: Cell, goal: Cell) -> Option<u32> {
        let oracle = PassabilityOracle::new(map, zones);
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0)]);
        while let Some((cell, dist)) = queue.pop_front() {
            if cell == goal {
                return Some(dist);
            }
            for direction in Direction::ALL {
                let next = cell.step(direction);
                if oracle.can_enter(cell, direction) && seen.insert(next) {
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    #[test]
    fn open_grid_example() {
        let map = TerrainMap::open(5, 5);
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);

        let start = Cell::new(0, 0);
        let goal = Cell::new(2, 3);
        let path = finder.find_route(start, goal).unwrap().unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
        assert_connected(start, &path);

        // Every step gets strictly closer to the goal.
        let mut previous = start.manhattan_distance(goal);
        for cell in &path {
            let now = cell.manhattan_distance(goal);
            assert_eq!(now + 1, previous);
            previous = now;
        }
    }

    #[test]
    fn ties_follow_insertion_order() {
        let map = TerrainMap::open(3, 3);
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);

        let path = finder.find_route(Cell::new(0, 0), Cell::new(1, 1)).unwrap();
        assert_eq!(path, Some(vec![Cell::new(0, 1), Cell::new(1, 1)]));
        // Same query, same answer.
        let again = finder.find_route(Cell::new(0, 0), Cell::new(1, 1)).unwrap();
        assert_eq!(path, again);
    }

    #[test]
    fn start_equals_goal_is_empty_path() {
        let map = TerrainMap::open(2, 2);
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        assert_eq!(
            finder.find_route(Cell::new(1, 1), Cell::new(1, 1)).unwrap(),
            Some(vec![])
        );
    }

    #[test]
    fn walled_off_goal_has_no_path() {
        let mut map = TerrainMap::open(5, 5);
        for cell in [Cell::new(3, 4), Cell::new(4, 3), Cell::new(3, 3)] {
            map.set_tile(cell, CellType::Wall).unwrap();
        }
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        assert_eq!(finder.find_route(Cell::new(0, 0), Cell::new(4, 4)).unwrap(), None);
    }

    #[test]
    fn goal_is_not_special_cased() {
        let mut map = TerrainMap::open(3, 1);
        map.set_tile(Cell::new(2, 0), CellType::Wall).unwrap();
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        assert_eq!(finder.find_route(Cell::new(0, 0), Cell::new(2, 0)).unwrap(), None);
        // Without obstacle checks the wall is ignored.
        assert_eq!(
            finder.find_path(Cell::new(0, 0), Cell::new(2, 0), false).unwrap(),
            Some(vec![Cell::new(1, 0), Cell::new(2, 0)])
        );
    }

    #[test]
    fn endpoints_outside_grid_are_rejected() {
        let map = TerrainMap::open(3, 3);
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        assert_eq!(
            finder.find_route(Cell::new(0, 0), Cell::new(3, 0)),
            Err(PathError::OutOfBounds {
                cell: Cell::new(3, 0),
                width: 3,
                height: 3
            })
        );
        assert!(finder.find_path(Cell::new(-1, 0), Cell::new(1, 1), false).is_err());
    }

    #[test]
    fn unchecked_search_stays_in_bounds() {
        let map = TerrainMap::open(1, 3);
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        let path = finder
            .find_path(Cell::new(0, 0), Cell::new(0, 2), false)
            .unwrap()
            .unwrap();
        assert!(path.iter().all(|&cell| map.in_bounds(cell)));
    }

    #[test]
    fn detours_around_walls() {
        // A wall column with a single gap at the bottom.
        let mut map = TerrainMap::open(5, 5);
        for y in 0..4 {
            map.set_tile(Cell::new(2, y), CellType::Wall).unwrap();
        }
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        let start = Cell::new(0, 0);
        let path = finder.find_route(start, Cell::new(4, 0)).unwrap().unwrap();
        assert_eq!(path.len(), 12);
        assert!(path.contains(&Cell::new(2, 4)));
        assert_connected(start, &path);
    }

    #[test]
    fn zone_restricts_search() {
        let map = TerrainMap::open(6, 6);
        let mut zones = ZoneRegistry::new();
        // An L-shaped corridor.
        zones.define_rect_zone("down", 0, 0, 0, 5).unwrap();
        zones.define_rect_zone("across", 0, 5, 5, 5).unwrap();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);

        let path = finder.find_route(Cell::new(0, 0), Cell::new(5, 5)).unwrap().unwrap();
        assert_eq!(path.len(), 10);
        assert!(path.iter().all(|&cell| zones.is_walkable(cell)));
        assert_eq!(finder.find_route(Cell::new(0, 0), Cell::new(3, 3)).unwrap(), None);
    }

    #[test]
    fn random_maps_yield_valid_optimal_paths() {
        let mut rng = StdRng::seed_from_u64(0x9a7f);
        for _ in 0..40 {
            let width = rng.random_range(3..12);
            let height = rng.random_range(3..12);
            let mut map = TerrainMap::open(width, height);
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    if rng.random_bool(0.25) {
                        map.set_tile(Cell::new(x, y), CellType::Wall).unwrap();
                    }
                }
            }
            let zones = ZoneRegistry::new();
            let oracle = PassabilityOracle::new(&map, &zones);
            let finder = PathFinder::new(&oracle);

            let start = Cell::new(rng.random_range(0..width as i32), rng.random_range(0..height as i32));
            let goal = Cell::new(rng.random_range(0..width as i32), rng.random_range(0..height as i32));
            let result = finder.find_route(start, goal).unwrap();
            let expected = bfs_distance(&map, &zones, start, goal);

            match result {
                Some(path) => {
                    assert_eq!(Some(path.len() as u32), expected);
                    assert_connected(start, &path);
                    assert!(path.iter().all(|&cell| oracle.is_passable(cell)));
                }
                None => assert_eq!(expected, None),
            }
        }
    }

    #[test]
    fn open_grid_paths_match_manhattan_distance() {
        let map = TerrainMap::open(8, 6);
        let zones = ZoneRegistry::new();
        let oracle = PassabilityOracle::new(&map, &zones);
        let finder = PathFinder::new(&oracle);
        for (start, goal) in [
            ((0, 0), (7, 5)),
            ((7, 5), (0, 0)),
            ((3, 2), (3, 2)),
            ((6, 1), (1, 4)),
            ((0, 5), (7, 0)),
        ] {
            let (start, goal) = (Cell::from(start), Cell::from(goal));
            let path = finder.find_route(start, goal).unwrap().unwrap();
            assert_eq!(path.len() as u32, start.manhattan_distance(goal));
        }
    }
}
