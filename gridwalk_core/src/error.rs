use crate::{Cell, EntityId};

/// Errors raised by pathfinding, zone, and obstacle operations.
///
/// "No path exists" is deliberately not part of this enum: a search that
/// exhausts its frontier returns `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Cell ({}, {}) is out of bounds for grid size ({width}, {height})", cell.x, cell.y)]
    OutOfBounds {
        cell: Cell,
        width: usize,
        height: usize,
    },
    #[error("Zone '{name}' has a reversed range: ({x1}, {y1}) to ({x2}, {y2})")]
    InvalidZoneRange {
        name: String,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    #[error("Zone '{0}' is not registered")]
    UnknownZone(String),
    #[error("Agent {0} does not exist")]
    UnknownAgent(EntityId),
    #[error("Event {0} has no registered obstacle")]
    UnknownObstacle(EntityId),
}
