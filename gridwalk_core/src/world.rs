use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Cell, Direction, EntityId, Path, PathError,
    config::WorldConfig,
    follower::{Mover, PathFollower},
    obstacle::{InteractionHost, ObstacleTracker},
    oracle::{GridBounds, Passability, PassabilityOracle},
    pathfinder::PathFinder,
    terrain::TerrainMap,
    zone::ZoneRegistry,
};

/// Position and movement state of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub position: Cell,
    pub facing: Direction,
    /// Frames left until the current step finishes animating.
    pub move_frames_left: u32,
    pub erased: bool,
}

/// The player or a map event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    id: EntityId,
    body: Body,
    follower: PathFollower,
}

impl Character {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> Cell {
        self.body.position
    }

    pub fn facing(&self) -> Direction {
        self.body.facing
    }

    pub fn is_moving(&self) -> bool {
        self.body.move_frames_left > 0
    }

    pub fn is_erased(&self) -> bool {
        self.body.erased
    }

    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }
}

/// An animation the game was asked to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationRequest {
    pub target: EntityId,
    pub animation: u32,
    pub frame: u64,
}

/// Moves a [`Body`] on behalf of its follower, refusing steps the map or an
/// obstacle forbids.
struct BodyMover<'a, P> {
    id: EntityId,
    body: &'a mut Body,
    passability: &'a P,
    blocked: &'a HashSet<Cell>,
    move_frames: u32,
}

impl<P> Mover for BodyMover<'_, P>
where
    P: Passability,
{
    fn position(&self) -> Cell {
        self.body.position
    }

    fn is_moving(&self) -> bool {
        self.body.move_frames_left > 0
    }

    fn move_straight(&mut self, direction: Direction) {
        self.body.facing = direction;
        let target = self.body.position.step(direction);
        if !self.passability.can_enter(self.body.position, direction)
            || self.blocked.contains(&target)
        {
            warn!(id = self.id, ?target, "step refused");
            return;
        }
        self.body.position = target;
        self.body.move_frames_left = self.move_frames;
    }
}

/// Forwards interaction effects to the parts of a [`World`] they touch.
struct WorldHost<'a> {
    characters: &'a mut BTreeMap<EntityId, Character>,
    switches: &'a mut HashMap<u32, bool>,
    animations: &'a mut Vec<AnimationRequest>,
    frame: u64,
}

impl InteractionHost for WorldHost<'_> {
    fn request_animation(&mut self, target: EntityId, animation: u32) {
        self.animations.push(AnimationRequest {
            target,
            animation,
            frame: self.frame,
        });
    }

    fn set_switch(&mut self, switch: u32, value: bool) {
        self.switches.insert(switch, value);
    }

    fn erase_event(&mut self, target: EntityId) {
        match self.characters.get_mut(&target) {
            Some(character) => {
                character.body.erased = true;
                character.follower.stop();
            }
            None => warn!(target, "erase requested for missing event"),
        }
    }
}

/// A running map: terrain, zones, obstacles, and the characters on it.
pub struct World {
    config: WorldConfig,
    terrain: TerrainMap,
    zones: ZoneRegistry,
    obstacles: ObstacleTracker,
    characters: BTreeMap<EntityId, Character>,
    switches: HashMap<u32, bool>,
    animations: Vec<AnimationRequest>,
    next_entity_id: EntityId,
    frame: u64,
}

impl World {
    /// Creates a world with no characters.
    pub fn new(terrain: TerrainMap, config: WorldConfig) -> Self {
        World {
            config,
            terrain,
            zones: ZoneRegistry::new(),
            obstacles: ObstacleTracker::new(),
            characters: BTreeMap::new(),
            switches: HashMap::new(),
            animations: Vec::new(),
            next_entity_id: 0,
            frame: 0,
        }
    }

    /// Places a new character and returns its id. The first one is the player.
    pub fn spawn(&mut self, position: Cell) -> Result<EntityId, PathError> {
        self.check_bounds(position)?;
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        self.characters.insert(
            id,
            Character {
                id,
                body: Body {
                    position,
                    facing: Direction::Down,
                    move_frames_left: 0,
                    erased: false,
                },
                follower: PathFollower::new(),
            },
        );
        debug!(id, ?position, "character spawned");
        Ok(id)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut ZoneRegistry {
        &mut self.zones
    }

    pub fn obstacles(&self) -> &ObstacleTracker {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut ObstacleTracker {
        &mut self.obstacles
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn switch(&self, id: u32) -> bool {
        self.switches.get(&id).copied().unwrap_or(false)
    }

    pub fn animations(&self) -> &[AnimationRequest] {
        &self.animations
    }

    /// Hands pending animation requests to the caller, emptying the log.
    pub fn drain_animations(&mut self) -> Vec<AnimationRequest> {
        std::mem::take(&mut self.animations)
    }

    pub fn character(&self, id: EntityId) -> Result<&Character, PathError> {
        self.characters.get(&id).ok_or(PathError::UnknownAgent(id))
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// The oracle over the current terrain and zones.
    pub fn oracle(&self) -> PassabilityOracle<'_, TerrainMap> {
        PassabilityOracle::new(&self.terrain, &self.zones).with_rule(self.config.terrain_rule)
    }

    pub fn find_path(
        &self,
        start: Cell,
        goal: Cell,
        check_obstacles: bool,
    ) -> Result<Option<Path>, PathError> {
        let oracle = self.oracle();
        PathFinder::new(&oracle).find_path(start, goal, check_obstacles)
    }

    /// Sends character `id` towards `goal`. Returns `Ok(false)` if no path exists.
    pub fn start_pathfinding(&mut self, id: EntityId, goal: Cell) -> Result<bool, PathError> {
        let oracle = PassabilityOracle::new(&self.terrain, &self.zones)
            .with_rule(self.config.terrain_rule);
        let finder = PathFinder::new(&oracle);
        let character = self
            .characters
            .get_mut(&id)
            .ok_or(PathError::UnknownAgent(id))?;
        let found = character
            .follower
            .start(&finder, character.body.position, goal)?;
        if found {
            info!(id, ?goal, steps = character.follower.route().len(), "pathfinding started");
        } else {
            info!(id, ?goal, "no path");
        }
        Ok(found)
    }

    pub fn stop_pathfinding(&mut self, id: EntityId) -> Result<(), PathError> {
        let character = self
            .characters
            .get_mut(&id)
            .ok_or(PathError::UnknownAgent(id))?;
        character.follower.stop();
        Ok(())
    }

    /// Drops the route of every character.
    pub fn stop_all(&mut self) {
        for character in self.characters.values_mut() {
            character.follower.stop();
        }
    }

    /// Characters standing on `cell`, erased ones excluded.
    pub fn events_at(&self, cell: Cell) -> Vec<EntityId> {
        self.characters
            .values()
            .filter(|c| !c.body.erased && c.body.position == cell)
            .map(|c| c.id)
            .collect()
    }

    /// The first registered obstacle standing on `cell`.
    pub fn obstacle_at(&self, cell: Cell) -> Option<EntityId> {
        self.obstacles.find_registered(self.events_at(cell))
    }

    /// Interacts with obstacle `event_id`, applying its effects to this world.
    pub fn interact(&mut self, event_id: EntityId) -> Result<bool, PathError> {
        let mut host = WorldHost {
            characters: &mut self.characters,
            switches: &mut self.switches,
            animations: &mut self.animations,
            frame: self.frame,
        };
        self.obstacles.interact(event_id, &mut host)
    }

    /// Advances one frame: every character finishes a slice of its current
    /// step, then its follower may request the next one.
    ///
    /// Returns the steps requested this frame.
    pub fn update(&mut self) -> Vec<(EntityId, Direction)> {
        self.frame += 1;
        let blocked = self.blocked_cells();
        let oracle = PassabilityOracle::new(&self.terrain, &self.zones)
            .with_rule(self.config.terrain_rule);

        let mut steps = Vec::new();
        for character in self.characters.values_mut() {
            let Character { id, body, follower } = character;
            if body.erased {
                continue;
            }
            body.move_frames_left = body.move_frames_left.saturating_sub(1);

            let mut mover = BodyMover {
                id: *id,
                body,
                passability: &oracle,
                blocked: &blocked,
                move_frames: self.config.move_frames,
            };
            if let Some(direction) = follower.tick(&mut mover) {
                steps.push((*id, direction));
            }
        }
        steps
    }

    /// Cells occupied by obstacles that cannot be walked through.
    fn blocked_cells(&self) -> HashSet<Cell> {
        self.characters
            .values()
            .filter(|c| !c.body.erased && !self.obstacles.is_obstacle_passable(c.id))
            .map(|c| c.body.position)
            .collect()
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), PathError> {
        if self.terrain.in_bounds(cell) {
            Ok(())
        } else {
            Err(PathError::OutOfBounds {
                cell,
                width: self.terrain.width(),
                height: self.terrain.height(),
            })
        }
    }
}
