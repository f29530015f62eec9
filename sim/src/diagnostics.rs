use std::fmt;

use log::trace;
use rapier3d::prelude::*;

use crate::world::{BodyId, PhysicsWorld, TickObserver};

/// Pusher read-back taken after one sub-step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PusherSample {
    pub substep: u64,
    pub committed: Vector<f32>,
    pub interpolated: Vector<f32>,
    pub interpolated_linvel: Vector<f32>,
}

struct Triple<'a>(&'a Vector<f32>);

impl fmt::Display for Triple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} | {} | {})", self.0.x, self.0.y, self.0.z)
    }
}

impl fmt::Display for PusherSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} committed {} interpolated {} linvel {}",
            self.substep,
            Triple(&self.committed),
            Triple(&self.interpolated),
            Triple(&self.interpolated_linvel)
        )
    }
}

/// Read-only observer of the pusher, fired once per executed sub-step.
#[derive(Clone, Debug)]
pub struct DiagnosticSampler {
    pusher: BodyId,
    substeps: u64,
    latest: Option<PusherSample>,
}

impl DiagnosticSampler {
    pub fn new(pusher: BodyId) -> Self {
        Self {
            pusher,
            substeps: 0,
            latest: None,
        }
    }

    pub fn substeps(&self) -> u64 {
        self.substeps
    }

    pub fn latest(&self) -> Option<&PusherSample> {
        self.latest.as_ref()
    }
}

impl TickObserver for DiagnosticSampler {
    fn on_substep(&mut self, world: &PhysicsWorld, _dt: f32) {
        self.substeps += 1;
        let Some(motion) = world.motion_state(self.pusher) else {
            return;
        };
        let sample = PusherSample {
            substep: self.substeps,
            committed: motion.committed.translation.vector,
            interpolated: motion.interpolated.translation.vector,
            interpolated_linvel: motion.interpolated_linvel,
        };
        trace!("pusher {sample}");
        self.latest = Some(sample);
    }
}
