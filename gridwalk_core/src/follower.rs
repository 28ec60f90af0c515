//! Steps an agent along a precomputed route, one move per tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    Cell, Direction, Path, PathError,
    oracle::Passability,
    pathfinder::PathFinder,
};

/// The agent side of path following: where it stands, whether a step is
/// still animating, and how to request the next one.
pub trait Mover {
    fn position(&self) -> Cell;

    /// True while a previously requested step is still in progress.
    fn is_moving(&self) -> bool;

    /// Requests a single step in `direction`.
    fn move_straight(&mut self, direction: Direction);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowerState {
    Idle,
    Following,
}

/// Per-agent route state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFollower {
    route: Path,
    cursor: usize,
    active: bool,
}

impl PathFollower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches a route from `from` to `goal` and starts following it.
    ///
    /// Returns `Ok(false)` when no route exists; the follower is then left as
    /// it was.
    pub fn start<P>(
        &mut self,
        finder: &PathFinder<'_, P>,
        from: Cell,
        goal: Cell,
    ) -> Result<bool, PathError>
    where
        P: Passability,
    {
        match finder.find_route(from, goal)? {
            Some(route) => {
                self.follow(route);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Starts following an already computed route.
    pub fn follow(&mut self, route: Path) {
        debug!(steps = route.len(), "following route");
        self.route = route;
        self.cursor = 0;
        self.active = true;
    }

    /// Drops the current route immediately.
    pub fn stop(&mut self) {
        if self.active {
            debug!(remaining = self.remaining().len(), "route aborted");
        }
        self.clear();
    }

    /// Advances the follower by one frame.
    ///
    /// Issues at most one step on `mover` and returns its direction. Nothing
    /// is issued while the mover is still busy with the previous step. Once
    /// every step has been issued the next tick returns the follower to idle.
    pub fn tick<M>(&mut self, mover: &mut M) -> Option<Direction>
    where
        M: Mover + ?Sized,
    {
        if !self.active || mover.is_moving() {
            return None;
        }

        let Some(&next) = self.route.get(self.cursor) else {
            trace!("route complete");
            self.clear();
            return None;
        };

        let direction = Direction::towards(mover.position(), next);
        if let Some(direction) = direction {
            mover.move_straight(direction);
        }
        self.cursor += 1;
        direction
    }

    pub fn state(&self) -> FollowerState {
        if self.active {
            FollowerState::Following
        } else {
            FollowerState::Idle
        }
    }

    #[inline]
    pub fn is_following(&self) -> bool {
        self.active
    }

    pub fn route(&self) -> &[Cell] {
        &self.route
    }

    /// Cells not yet stepped towards.
    pub fn remaining(&self) -> &[Cell] {
        self.route.get(self.cursor..).unwrap_or(&[])
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn clear(&mut self) {
        self.route.clear();
        self.cursor = 0;
        self.active = false;
    }
}
