//! Keyboard-driven kinematic pusher.
//!
//! Key presses set a [`DirectionalIntent`]; once per tick the actuator adds the
//! matching displacement to the pusher's committed transform. The world then
//! moves the engine body there during the next executed sub-steps.

use log::{debug, trace};
use rapier3d::prelude::*;

use crate::config::{ActuatorConfig, PushStepping};
use crate::input::{KeyEvent, KeyState, PushKey};
use crate::units::UnitScale;
use crate::world::{BodyId, PhysicsWorld};

/// Lateral (x) and depth (z) multipliers, each in {-1, 0, +1}.
///
/// Set on key down, reset on the matching key up. Ticks read it without
/// clearing it, so a held key keeps pushing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectionalIntent {
    pub lateral: i8,
    pub depth: i8,
}

impl DirectionalIntent {
    pub fn apply(&mut self, event: KeyEvent) {
        match (event.key, event.state) {
            (PushKey::Left, KeyState::Down) => self.lateral = 1,
            (PushKey::Right, KeyState::Down) => self.lateral = -1,
            (PushKey::Forward, KeyState::Down) => self.depth = 1,
            (PushKey::Back, KeyState::Down) => self.depth = -1,
            (PushKey::Left | PushKey::Right, KeyState::Up) => self.lateral = 0,
            (PushKey::Forward | PushKey::Back, KeyState::Up) => self.depth = 0,
            (PushKey::Space, _) => {}
        }
    }

    pub fn is_idle(&self) -> bool {
        self.lateral == 0 && self.depth == 0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct KinematicActuator {
    body: BodyId,
    intent: DirectionalIntent,
    force_enabled: bool,
    stepping: PushStepping,
    lateral_step: f32,
    depth_step: f32,
    /// Simulation units per second.
    lateral_speed: f32,
    depth_speed: f32,
}

impl KinematicActuator {
    pub fn new(body: BodyId, config: &ActuatorConfig, units: UnitScale) -> Self {
        Self {
            body,
            intent: DirectionalIntent::default(),
            force_enabled: false,
            stepping: config.stepping,
            lateral_step: config.lateral_step,
            depth_step: config.depth_step,
            lateral_speed: units.velocity(config.lateral_speed_mps),
            depth_speed: units.velocity(config.depth_speed_mps),
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn intent(&self) -> DirectionalIntent {
        self.intent
    }

    /// Toggled by space. Recorded for the render hook; it does not change the
    /// kinematic push.
    pub fn force_enabled(&self) -> bool {
        self.force_enabled
    }

    pub fn stepping(&self) -> PushStepping {
        self.stepping
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        if event.key == PushKey::Space {
            if event.state == KeyState::Down {
                self.force_enabled = !self.force_enabled;
                debug!("force flag {}", if self.force_enabled { "on" } else { "off" });
            }
            return;
        }
        self.intent.apply(event);
        trace!("{} {:?} -> intent {:?}", event.key, event.state, self.intent);
    }

    /// Raw character pass-through. Unmapped characters are ignored.
    pub fn handle_char(&mut self, c: char, state: KeyState) {
        if let Some(key) = PushKey::from_char(c) {
            self.handle_key(KeyEvent { key, state });
        }
    }

    /// Displacement of one tick given the frame's elapsed time.
    pub fn displacement(&self, elapsed: f32) -> Vector<f32> {
        let (lateral, depth) = match self.stepping {
            PushStepping::PerTick => (self.lateral_step, self.depth_step),
            PushStepping::Velocity => (self.lateral_speed * elapsed, self.depth_speed * elapsed),
        };
        Vector::new(
            lateral * self.intent.lateral as f32,
            0.0,
            depth * self.intent.depth as f32,
        )
    }

    /// Advance the pusher's committed transform by one tick.
    ///
    /// Returns `false` if the pusher is not tracked by `world`.
    pub fn tick(&self, world: &mut PhysicsWorld, elapsed: f32) -> bool {
        let Some(motion) = world.motion_state(self.body) else {
            return false;
        };
        let mut transform = motion.committed;
        transform.translation.vector += self.displacement(elapsed);
        world.set_committed_transform(self.body, transform)
    }
}
