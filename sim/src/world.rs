//! The physics world: rapier sets, the ground, tracked bodies and stepping.
//!
//! Stepping follows a fixed-step / variable-frame model
//! - [`PhysicsWorld::step_simulation`] takes the elapsed frame time and lets the
//!   [`SubstepScheduler`] decide how many fixed sub-steps run.
//! - Kinematic bodies are moved linearly from their last engine pose to their
//!   committed pose across the executed sub-steps.
//! - After stepping, dynamic motion states are integrated forward by the
//!   leftover time so they can be drawn between fixed steps.
//! - A [`TickObserver`] is called after every executed sub-step.

use log::{debug, trace, warn};
use nalgebra as na;
use rapier3d::prelude::*;

use crate::body::{BodyKind, MotionState};
use crate::config::{Material, SolverConfig};
use crate::scheduler::{StepPlan, SubstepScheduler};
use crate::solver_mode::{SolverMode, SolverModeFlag};
use crate::units::UnitScale;

/// Index of a body tracked by the world, stable for the world's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

impl BodyId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Callback fired once per executed fixed sub-step.
pub trait TickObserver {
    fn on_substep(&mut self, world: &PhysicsWorld, dt: f32);
}

impl TickObserver for () {
    fn on_substep(&mut self, _world: &PhysicsWorld, _dt: f32) {}
}

/// Solver settings applied once at construction.
///
/// `iterations` and the warm-start flag map onto rapier's integration
/// parameters. ERP, CFM and split impulse have no direct rapier counterpart;
/// they are kept here so a loaded parameter set stays inspectable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverSettings {
    pub iterations: u32,
    pub mode: SolverMode,
    pub split_impulse: bool,
    pub erp: f32,
    pub cfm: f32,
}

/// What one call to [`PhysicsWorld::step_simulation`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub plan: StepPlan,
    /// Total sub-steps executed since the world was created.
    pub total_substeps: u64,
}

impl StepReport {
    pub fn executed(&self) -> u32 {
        self.plan.executed
    }
}

#[derive(Clone, Copy, Debug)]
struct TrackedBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    kind: BodyKind,
    motion: MotionState,
}

pub struct PhysicsWorld {
    gravity: Vector<f32>,
    params: IntegrationParameters,
    solver: SolverSettings,
    scheduler: SubstepScheduler,

    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    ground: Option<ColliderHandle>,
    tracked: Vec<TrackedBody>,
    total_substeps: u64,
}

impl PhysicsWorld {
    /// Fresh world with the solver configuration applied.
    pub fn new(solver: &SolverConfig, units: UnitScale) -> Self {
        let mode = solver.solver_mode();

        let mut params = IntegrationParameters {
            dt: solver.fixed_step,
            length_unit: units.length(1.0),
            ..IntegrationParameters::default()
        };
        params.num_solver_iterations = solver.iterations as usize;
        params.warmstart_coefficient = if mode.has(SolverModeFlag::Warmstarting) {
            1.0
        } else {
            0.0
        };

        let settings = SolverSettings {
            iterations: solver.iterations,
            mode,
            split_impulse: solver.split_impulse,
            erp: solver.erp,
            cfm: solver.cfm,
        };
        debug!(
            "solver: iterations={} mode={:#07b} split_impulse={} erp={} cfm={} dt={} max_substeps={}",
            settings.iterations,
            settings.mode.bits,
            settings.split_impulse,
            settings.erp,
            settings.cfm,
            solver.fixed_step,
            solver.max_substeps
        );

        let [gx, gy, gz] = solver.gravity;
        Self {
            gravity: Vector::new(gx, gy, gz),
            params,
            solver: settings,
            scheduler: SubstepScheduler::new(solver.fixed_step, solver.max_substeps),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground: None,
            tracked: Vec::new(),
            total_substeps: 0,
        }
    }

    /// Static half-space with its surface at y = 0 and normal +Y.
    pub fn add_ground(&mut self, material: Material) -> ColliderHandle {
        let ground = ColliderBuilder::halfspace(Vector::y_axis())
            .friction(material.friction)
            .restitution(material.restitution)
            .build();
        let handle = self.colliders.insert(ground);
        self.ground = Some(handle);
        handle
    }

    pub fn ground(&self) -> Option<&Collider> {
        self.ground.and_then(|h| self.colliders.get(h))
    }

    /// Register a body and its collider. Used by the body factory.
    pub(crate) fn insert_tracked(
        &mut self,
        body: RigidBody,
        collider: Collider,
        kind: BodyKind,
    ) -> BodyId {
        let pose = *body.position();
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        let id = BodyId(self.tracked.len());
        self.tracked.push(TrackedBody {
            body,
            collider,
            kind,
            motion: MotionState::at(pose),
        });
        id
    }

    pub fn gravity(&self) -> Vector<f32> {
        self.gravity
    }

    pub fn integration_parameters(&self) -> &IntegrationParameters {
        &self.params
    }

    pub fn solver_settings(&self) -> &SolverSettings {
        &self.solver
    }

    pub fn scheduler(&self) -> &SubstepScheduler {
        &self.scheduler
    }

    pub fn body_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn total_substeps(&self) -> u64 {
        self.total_substeps
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        let tracked = self.tracked.get(id.0)?;
        self.bodies.get(tracked.body)
    }

    pub fn collider(&self, id: BodyId) -> Option<&Collider> {
        let tracked = self.tracked.get(id.0)?;
        self.colliders.get(tracked.collider)
    }

    pub fn kind(&self, id: BodyId) -> Option<BodyKind> {
        self.tracked.get(id.0).map(|t| t.kind)
    }

    pub fn motion_state(&self, id: BodyId) -> Option<&MotionState> {
        self.tracked.get(id.0).map(|t| &t.motion)
    }

    /// Write the committed transform of a body. For kinematic bodies this is
    /// the target reached by the end of the next executed step.
    pub fn set_committed_transform(&mut self, id: BodyId, transform: Isometry<f32>) -> bool {
        match self.tracked.get_mut(id.0) {
            Some(tracked) => {
                tracked.motion.committed = transform;
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by `elapsed` seconds of wall time.
    pub fn step_simulation<O: TickObserver>(&mut self, elapsed: f32, observer: &mut O) -> StepReport {
        let plan = self.scheduler.plan(elapsed);
        if plan.dropped_time > 0.0 {
            warn!(
                "frame overrun: dropped {} sub-steps ({:.3} s), executed {}",
                plan.dropped_substeps(),
                plan.dropped_time,
                plan.executed
            );
        }

        if plan.executed > 0 {
            let anchors: Vec<Option<Isometry<f32>>> = self
                .tracked
                .iter()
                .map(|t| match t.kind {
                    BodyKind::Kinematic => self.bodies.get(t.body).map(|b| *b.position()),
                    BodyKind::Dynamic => None,
                })
                .collect();

            for step in 1..=plan.executed {
                let fraction = step as f32 / plan.executed as f32;
                self.drive_kinematic_bodies(&anchors, fraction);
                self.step_once();
                self.refresh_motion_states();
                self.total_substeps += 1;
                trace!("sub-step {} of {}", step, plan.executed);
                observer.on_substep(self, self.params.dt);
            }

            self.finish_kinematic_motion(&anchors, plan.executed);
        }

        self.interpolate_dynamic_bodies(plan.remainder);

        StepReport {
            plan,
            total_substeps: self.total_substeps,
        }
    }

    fn step_once(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn drive_kinematic_bodies(&mut self, anchors: &[Option<Isometry<f32>>], fraction: f32) {
        for (tracked, anchor) in self.tracked.iter().zip(anchors) {
            let Some(anchor) = anchor else { continue };
            let Some(body) = self.bodies.get_mut(tracked.body) else {
                continue;
            };
            let target = tracked.motion.committed;
            let translation = anchor
                .translation
                .vector
                .lerp(&target.translation.vector, fraction);
            // Half-turn deltas have no unique slerp path; snap to the target.
            let rotation = anchor
                .rotation
                .try_slerp(&target.rotation, fraction, 1.0e-6)
                .unwrap_or(target.rotation);
            body.set_next_kinematic_translation(translation);
            body.set_next_kinematic_rotation(rotation);
            // `can_sleep(false)` alone does not keep an idle kinematic body
            // out of the island manager's sleep pass.
            body.wake_up(true);
        }
    }

    /// Mirror engine poses and velocities into the motion states after a sub-step.
    fn refresh_motion_states(&mut self) {
        for tracked in &mut self.tracked {
            let Some(body) = self.bodies.get(tracked.body) else {
                continue;
            };
            tracked.motion.interpolated = *body.position();
            tracked.motion.interpolated_linvel = *body.linvel();
            tracked.motion.interpolated_angvel = *body.angvel();
            if tracked.kind == BodyKind::Dynamic {
                tracked.motion.committed = *body.position();
            }
        }
    }

    /// Kinematic velocity over the whole frame, from anchor to committed pose.
    fn finish_kinematic_motion(&mut self, anchors: &[Option<Isometry<f32>>], executed: u32) {
        let span = self.params.dt * executed as f32;
        for (tracked, anchor) in self.tracked.iter_mut().zip(anchors) {
            let Some(anchor) = anchor else { continue };
            let target = tracked.motion.committed;
            let delta_rotation = target.rotation * anchor.rotation.inverse();
            tracked.motion.interpolated = target;
            tracked.motion.interpolated_linvel =
                (target.translation.vector - anchor.translation.vector) / span;
            tracked.motion.interpolated_angvel = delta_rotation.scaled_axis() / span;
        }
    }

    /// Predict dynamic poses `remainder` seconds past the last fixed step.
    fn interpolate_dynamic_bodies(&mut self, remainder: f32) {
        for tracked in &mut self.tracked {
            if tracked.kind != BodyKind::Dynamic {
                continue;
            }
            let Some(body) = self.bodies.get(tracked.body) else {
                continue;
            };
            let pose = *body.position();
            let linvel = *body.linvel();
            let angvel = *body.angvel();
            let translation = pose.translation.vector + linvel * remainder;
            let rotation = na::UnitQuaternion::from_scaled_axis(angvel * remainder) * pose.rotation;
            let predicted = Isometry::from_parts(na::Translation3::from(translation), rotation);

            tracked.motion.committed = predicted;
            tracked.motion.interpolated = predicted;
            tracked.motion.interpolated_linvel = linvel;
            tracked.motion.interpolated_angvel = angvel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{RigidBodyFactory, yaw_transform};
    use crate::shapes::ShapeTemplate;
    use approx::assert_relative_eq;

    fn solver(max_substeps: u32) -> SolverConfig {
        SolverConfig {
            fixed_step: 0.05,
            max_substeps,
            ..SolverConfig::default()
        }
    }

    fn ball() -> ShapeTemplate {
        ShapeTemplate::new(SharedShape::ball(0.5), 0.0)
    }

    #[derive(Default)]
    struct Counter {
        calls: u32,
        dt: f32,
    }

    impl TickObserver for Counter {
        fn on_substep(&mut self, _world: &PhysicsWorld, dt: f32) {
            self.calls += 1;
            self.dt = dt;
        }
    }

    #[test]
    fn solver_configuration_reaches_integration_parameters() {
        let mut config = solver(10);
        config.iterations = 25;
        config.solver_mode = vec![SolverModeFlag::Simd];
        let world = PhysicsWorld::new(&config, UnitScale::new(5.0));

        let params = world.integration_parameters();
        assert_relative_eq!(params.dt, 0.05);
        assert_relative_eq!(params.length_unit, 5.0);
        assert_eq!(params.warmstart_coefficient, 0.0);
        assert_eq!(world.solver_settings().iterations, 25);
        assert_eq!(params.num_solver_iterations, 25);
        assert!(!world.solver_settings().mode.has(SolverModeFlag::Warmstarting));
    }

    #[test]
    fn observer_runs_once_per_executed_substep() {
        let mut world = PhysicsWorld::new(&solver(3), UnitScale::new(1.0));
        let mut counter = Counter::default();

        let report = world.step_simulation(0.26, &mut counter);
        assert_eq!(report.plan.requested, 5);
        assert_eq!(report.executed(), 3);
        assert_eq!(counter.calls, 3);
        assert_relative_eq!(counter.dt, 0.05);
        assert_eq!(world.total_substeps(), 3);
    }

    #[test]
    fn dynamic_body_falls_onto_ground_and_stays_awake() {
        let mut world = PhysicsWorld::new(&solver(10), UnitScale::new(1.0));
        world.add_ground(Material::new(0.5, 0.0));
        let id = RigidBodyFactory::default().create_dynamic_body(
            &mut world,
            yaw_transform(Vector::new(0.0, 2.0, 0.0), 0.0),
            &ball(),
            1.0,
            Material::new(0.5, 0.0),
            None,
        );

        for _ in 0..200 {
            world.step_simulation(0.05, &mut ());
        }

        let body = world.body(id).unwrap();
        assert!(!body.is_sleeping());
        assert!(body.translation().y < 2.0);
        assert!(body.translation().y > 0.3);
        assert!(world.ground().is_some());
    }

    #[test]
    fn kinematic_body_reaches_committed_transform_after_a_frame() {
        let mut world = PhysicsWorld::new(&solver(10), UnitScale::new(1.0));
        let id = RigidBodyFactory::default().create_kinematic_body(
            &mut world,
            yaw_transform(Vector::new(0.0, 1.0, 0.0), 0.0),
            &ball(),
            Material::new(0.3, 0.0),
        );

        let target = yaw_transform(Vector::new(1.0, 1.0, 0.0), 0.0);
        assert!(world.set_committed_transform(id, target));
        let report = world.step_simulation(0.1, &mut ());
        assert_eq!(report.executed(), 2);

        let body = world.body(id).unwrap();
        assert_relative_eq!(*body.translation(), Vector::new(1.0, 1.0, 0.0), epsilon = 1.0e-5);

        let motion = world.motion_state(id).unwrap();
        assert_eq!(motion.committed, target);
        assert_relative_eq!(motion.interpolated_linvel, Vector::new(10.0, 0.0, 0.0), epsilon = 1.0e-3);
    }

    #[test]
    fn kinematic_body_waits_for_a_full_step() {
        let mut world = PhysicsWorld::new(&solver(10), UnitScale::new(1.0));
        let id = RigidBodyFactory::default().create_kinematic_body(
            &mut world,
            Isometry::identity(),
            &ball(),
            Material::new(0.3, 0.0),
        );
        world.set_committed_transform(id, yaw_transform(Vector::new(1.0, 0.0, 0.0), 0.0));

        let report = world.step_simulation(0.01, &mut ());
        assert_eq!(report.executed(), 0);
        assert_relative_eq!(*world.body(id).unwrap().translation(), Vector::zeros());
    }

    #[test]
    fn idle_kinematic_body_never_sleeps() {
        let mut world = PhysicsWorld::new(&solver(10), UnitScale::new(1.0));
        world.add_ground(Material::new(0.5, 0.0));
        let id = RigidBodyFactory::default().create_kinematic_body(
            &mut world,
            yaw_transform(Vector::new(0.0, 0.5, 0.0), 0.0),
            &ball(),
            Material::new(0.3, 0.0),
        );

        for frame in 0..150 {
            world.step_simulation(0.05, &mut ());
            assert!(!world.body(id).unwrap().is_sleeping(), "asleep at frame {frame}");
        }
    }

    #[test]
    fn unknown_body_is_rejected() {
        let mut world = PhysicsWorld::new(&solver(10), UnitScale::new(1.0));
        assert!(!world.set_committed_transform(BodyId(3), Isometry::identity()));
        assert!(world.body(BodyId(3)).is_none());
        assert!(world.kind(BodyId(3)).is_none());
    }

    #[test]
    fn dynamic_motion_state_is_extrapolated_by_the_remainder() {
        let mut config = solver(10);
        config.gravity = [0.0; 3];
        let mut world = PhysicsWorld::new(&config, UnitScale::new(1.0));
        let id = RigidBodyFactory::default().create_dynamic_body(
            &mut world,
            Isometry::identity(),
            &ball(),
            1.0,
            Material::new(0.5, 0.0),
            None,
        );
        world.step_simulation(0.05, &mut ());
        let before = *world.body(id).unwrap().translation();

        // 0.02 s is below one fixed step: no sub-step, only extrapolation.
        world.step_simulation(0.02, &mut ());
        let motion = world.motion_state(id).unwrap();
        assert_relative_eq!(motion.translation(), before, epsilon = 1.0e-6);
    }
}
