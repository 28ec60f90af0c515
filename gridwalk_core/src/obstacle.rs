//! Obstacle bookkeeping: which events are obstacles and what interacting
//! with them does.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{EntityId, PathError};

/// Side effects an interaction can request from the game.
pub trait InteractionHost {
    fn request_animation(&mut self, target: EntityId, animation: u32);
    fn set_switch(&mut self, switch: u32, value: bool);
    fn erase_event(&mut self, target: EntityId);
}

/// One effect run when an obstacle is interacted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    SetSwitch { id: u32, value: bool },
    EraseEvent,
    PlayAnimation { id: u32 },
}

impl Interaction {
    pub fn apply(&self, target: EntityId, host: &mut dyn InteractionHost) {
        match *self {
            Interaction::SetSwitch { id, value } => host.set_switch(id, value),
            Interaction::EraseEvent => host.erase_event(target),
            Interaction::PlayAnimation { id } => host.request_animation(target, id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Free-form label such as `static`, `breakable` or `destroyable`.
    pub kind: String,
    /// Animation played on every successful interaction.
    pub animation: Option<u32>,
    pub interactable: bool,
    pub passable: bool,
    /// Effects run in order after the animation is requested.
    pub on_interact: Vec<Interaction>,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        ObstacleConfig {
            kind: "static".to_string(),
            animation: None,
            interactable: true,
            passable: false,
            on_interact: Vec::new(),
        }
    }
}

/// Registry of obstacle events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleTracker {
    obstacles: HashMap<EntityId, ObstacleConfig>,
}

impl ObstacleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `event_id` as an obstacle, replacing any earlier config.
    pub fn register(&mut self, event_id: EntityId, config: ObstacleConfig) {
        debug!(event_id, kind = %config.kind, "obstacle registered");
        self.obstacles.insert(event_id, config);
    }

    pub fn get(&self, event_id: EntityId) -> Option<&ObstacleConfig> {
        self.obstacles.get(&event_id)
    }

    /// Returns the first of `events` that is a registered obstacle.
    pub fn find_registered<I>(&self, events: I) -> Option<EntityId>
    where
        I: IntoIterator<Item = EntityId>,
    {
        events
            .into_iter()
            .find(|id| self.obstacles.contains_key(id))
    }

    /// Runs the interaction of `event_id`.
    ///
    /// Returns `Ok(false)` when the obstacle is not interactable.
    pub fn interact(
        &self,
        event_id: EntityId,
        host: &mut dyn InteractionHost,
    ) -> Result<bool, PathError> {
        let obstacle = self
            .obstacles
            .get(&event_id)
            .ok_or(PathError::UnknownObstacle(event_id))?;
        if !obstacle.interactable {
            return Ok(false);
        }

        info!(event_id, kind = %obstacle.kind, "obstacle interaction");
        if let Some(animation) = obstacle.animation {
            host.request_animation(event_id, animation);
        }
        for effect in &obstacle.on_interact {
            effect.apply(event_id, host);
        }
        Ok(true)
    }

    /// Unregistered events never block.
    pub fn is_obstacle_passable(&self, event_id: EntityId) -> bool {
        self.obstacles
            .get(&event_id)
            .is_none_or(|obstacle| obstacle.passable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingHost {
        animations: Vec<(EntityId, u32)>,
        switches: Vec<(u32, bool)>,
        erased: Vec<EntityId>,
    }

    impl InteractionHost for RecordingHost {
        fn request_animation(&mut self, target: EntityId, animation: u32) {
            self.animations.push((target, animation));
        }

        fn set_switch(&mut self, switch: u32, value: bool) {
            self.switches.push((switch, value));
        }

        fn erase_event(&mut self, target: EntityId) {
            self.erased.push(target);
        }
    }

    #[test]
    fn interaction_plays_animation_then_effects() {
        let mut tracker = ObstacleTracker::new();
        tracker.register(
            3,
            ObstacleConfig {
                kind: "destroyable".to_string(),
                animation: Some(15),
                on_interact: vec![
                    Interaction::SetSwitch { id: 10, value: true },
                    Interaction::EraseEvent,
                ],
                ..ObstacleConfig::default()
            },
        );

        let mut host = RecordingHost::default();
        assert_eq!(tracker.interact(3, &mut host), Ok(true));
        assert_eq!(host.animations, vec![(3, 15)]);
        assert_eq!(host.switches, vec![(10, true)]);
        assert_eq!(host.erased, vec![3]);
    }

    #[test]
    fn config_animation_plays_before_handler_animation() {
        let mut tracker = ObstacleTracker::new();
        tracker.register(
            4,
            ObstacleConfig {
                animation: Some(3),
                on_interact: vec![Interaction::PlayAnimation { id: 7 }],
                ..ObstacleConfig::default()
            },
        );

        let mut host = RecordingHost::default();
        assert_eq!(tracker.interact(4, &mut host), Ok(true));
        assert_eq!(host.animations, vec![(4, 3), (4, 7)]);
        assert!(host.switches.is_empty());
        assert!(host.erased.is_empty());
    }

    #[test]
    fn non_interactable_obstacle_does_nothing() {
        let mut tracker = ObstacleTracker::new();
        tracker.register(
            1,
            ObstacleConfig {
                animation: Some(2),
                interactable: false,
                ..ObstacleConfig::default()
            },
        );
        let mut host = RecordingHost::default();
        assert_eq!(tracker.interact(1, &mut host), Ok(false));
        assert!(host.animations.is_empty());
    }

    #[test]
    fn unknown_obstacle_is_an_error() {
        let tracker = ObstacleTracker::new();
        let mut host = RecordingHost::default();
        assert_eq!(
            tracker.interact(9, &mut host),
            Err(PathError::UnknownObstacle(9))
        );
    }

    #[test]
    fn passability_defaults() {
        let mut tracker = ObstacleTracker::new();
        tracker.register(1, ObstacleConfig::default());
        tracker.register(
            2,
            ObstacleConfig {
                passable: true,
                ..ObstacleConfig::default()
            },
        );
        assert!(!tracker.is_obstacle_passable(1));
        assert!(tracker.is_obstacle_passable(2));
        assert!(tracker.is_obstacle_passable(7));
        assert_eq!(tracker.find_registered([7, 2, 1]), Some(2));
        assert_eq!(tracker.find_registered([7, 8]), None);
    }

    #[test]
    fn config_fields_default_when_missing() {
        let config: ObstacleConfig = serde_json::from_str(r#"{"kind": "breakable"}"#).unwrap();
        assert_eq!(config.kind, "breakable");
        assert!(config.interactable);
        assert!(!config.passable);
        assert_eq!(config.animation, None);
    }
}
