//! Textual commands and their dispatch onto a [`World`].
//!
//! ```text
//! DefineZone plaza 10 10 20 20
//! PathfindTo 1 15 15
//! RegisterObstacle 5 breakable 10
//! InteractObstacle 5
//! StopPathfinding 1
//! RemoveZone plaza
//! ```

use std::{fmt, str::FromStr};

use tracing::info;

use crate::{
    Cell, EntityId, PathError,
    obstacle::ObstacleConfig,
    world::World,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects {expected} arguments, found {found}")]
    Arity {
        command: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid integer '{value}' for {command}")]
    InvalidInteger { command: &'static str, value: String },
    #[error("Line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<CommandError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    DefineZone {
        name: String,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    PathfindTo {
        agent: EntityId,
        goal: Cell,
    },
    StopPathfinding {
        agent: EntityId,
    },
    RegisterObstacle {
        event: EntityId,
        kind: String,
        animation: u32,
    },
    InteractObstacle {
        event: EntityId,
    },
    RemoveZone {
        name: String,
    },
}

/// What executing a [`Command`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    PathStarted,
    NoPath,
    Interacted(bool),
}

impl Command {
    /// Applies this command to `world`.
    pub fn execute(&self, world: &mut World) -> Result<CommandOutcome, PathError> {
        info!(command = %self, "executing");
        let outcome = match self {
            Command::DefineZone {
                name,
                x1,
                y1,
                x2,
                y2,
            } => {
                world
                    .zones_mut()
                    .define_rect_zone(name.clone(), *x1, *y1, *x2, *y2)?;
                CommandOutcome::Done
            }
            Command::PathfindTo { agent, goal } => {
                if world.start_pathfinding(*agent, *goal)? {
                    CommandOutcome::PathStarted
                } else {
                    CommandOutcome::NoPath
                }
            }
            Command::StopPathfinding { agent } => {
                world.stop_pathfinding(*agent)?;
                CommandOutcome::Done
            }
            Command::RegisterObstacle {
                event,
                kind,
                animation,
            } => {
                world.character(*event)?;
                world.obstacles_mut().register(
                    *event,
                    ObstacleConfig {
                        kind: kind.clone(),
                        animation: Some(*animation),
                        interactable: true,
                        ..ObstacleConfig::default()
                    },
                );
                CommandOutcome::Done
            }
            Command::InteractObstacle { event } => {
                CommandOutcome::Interacted(world.interact(*event)?)
            }
            Command::RemoveZone { name } => {
                world.zones_mut().remove_zone(name)?;
                CommandOutcome::Done
            }
        };
        Ok(outcome)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        let command = match name {
            "DefineZone" => {
                let [zone, x1, y1, x2, y2] = expect_args::<5>("DefineZone", &args)?;
                Command::DefineZone {
                    name: zone.to_string(),
                    x1: parse_int("DefineZone", x1)?,
                    y1: parse_int("DefineZone", y1)?,
                    x2: parse_int("DefineZone", x2)?,
                    y2: parse_int("DefineZone", y2)?,
                }
            }
            "PathfindTo" => {
                let [agent, x, y] = expect_args::<3>("PathfindTo", &args)?;
                Command::PathfindTo {
                    agent: parse_int("PathfindTo", agent)?,
                    goal: Cell::new(parse_int("PathfindTo", x)?, parse_int("PathfindTo", y)?),
                }
            }
            "StopPathfinding" => {
                let [agent] = expect_args::<1>("StopPathfinding", &args)?;
                Command::StopPathfinding {
                    agent: parse_int("StopPathfinding", agent)?,
                }
            }
            "RegisterObstacle" => {
                let [event, kind, animation] = expect_args::<3>("RegisterObstacle", &args)?;
                Command::RegisterObstacle {
                    event: parse_int("RegisterObstacle", event)?,
                    kind: kind.to_string(),
                    animation: parse_int("RegisterObstacle", animation)?,
                }
            }
            "InteractObstacle" => {
                let [event] = expect_args::<1>("InteractObstacle", &args)?;
                Command::InteractObstacle {
                    event: parse_int("InteractObstacle", event)?,
                }
            }
            "RemoveZone" => {
                let [zone] = expect_args::<1>("RemoveZone", &args)?;
                Command::RemoveZone {
                    name: zone.to_string(),
                }
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::DefineZone {
                name,
                x1,
                y1,
                x2,
                y2,
            } => write!(f, "DefineZone {name} {x1} {y1} {x2} {y2}"),
            Command::PathfindTo { agent, goal } => {
                write!(f, "PathfindTo {agent} {} {}", goal.x, goal.y)
            }
            Command::StopPathfinding { agent } => write!(f, "StopPathfinding {agent}"),
            Command::RegisterObstacle {
                event,
                kind,
                animation,
            } => write!(f, "RegisterObstacle {event} {kind} {animation}"),
            Command::InteractObstacle { event } => write!(f, "InteractObstacle {event}"),
            Command::RemoveZone { name } => write!(f, "RemoveZone {name}"),
        }
    }
}

/// Parses a command script: one command per line, blank lines and `#`
/// comments skipped.
pub fn parse_script(script: &str) -> Result<Vec<Command>, CommandError> {
    script
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line, text)| {
            text.parse::<Command>().map_err(|source| CommandError::AtLine {
                line,
                source: Box::new(source),
            })
        })
        .collect()
}

fn expect_args<'a, const N: usize>(
    command: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; N], CommandError> {
    <[&str; N]>::try_from(args).map_err(|_| CommandError::Arity {
        command,
        expected: N,
        found: args.len(),
    })
}

fn parse_int<T: FromStr>(command: &'static str, value: &str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidInteger {
        command,
        value: value.to_string(),
    })
}
