//! Scene assembly: solver, ground, shapes, pusher and the seven tangram pieces.
//!
//! Assembly order
//! 1. Fresh world with the solver parameters applied.
//! 2. Static ground half-space at y = 0.
//! 3. Shape catalog.
//! 4. Kinematic pusher at `(2.5·a, a/2, 0)`.
//! 5. Dynamic pieces at the fixture placements below.
//!
//! Base values are scaled from the configuration: `a = S·base_length`,
//! `h = S·height`, `m = S³·base_mass`.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

use log::{debug, info};
use nalgebra as na;
use rapier3d::prelude::*;

use crate::actuator::KinematicActuator;
use crate::body::{RigidBodyFactory, yaw_transform};
use crate::config::SimConfig;
use crate::error::SceneError;
use crate::inertia::InertiaTensorResolver;
use crate::shapes::{PieceDimensions, PieceKind, ShapeCatalog};
use crate::units::UnitScale;
use crate::world::{BodyId, PhysicsWorld, StepReport, TickObserver};

/// Where and how heavy one tangram piece starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceDescriptor {
    pub kind: PieceKind,
    /// Multiple of the base mass `m`.
    pub mass_multiplier: f32,
    pub position: Vector<f32>,
    /// Rotation about +Y in radians.
    pub yaw: f32,
}

impl PieceDescriptor {
    pub fn placement(&self) -> Isometry<f32> {
        yaw_transform(self.position, self.yaw)
    }
}

/// Scaled base values of the layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneDimensions {
    pub base_length: f32,
    pub height: f32,
    pub base_mass: f32,
    pub margin: f32,
    pub spacing: f32,
}

impl SceneDimensions {
    pub fn from_config(config: &SimConfig) -> Self {
        let units = config.units();
        Self {
            base_length: units.length(config.geometry.base_length_m),
            height: units.length(config.geometry.height_m),
            base_mass: units.mass(config.geometry.base_mass_kg),
            margin: config.collision_margin(),
            spacing: config.geometry.spacing,
        }
    }

    pub fn pusher_position(&self) -> Vector<f32> {
        let a = self.base_length;
        Vector::new(2.5 * a, a * 0.5, 0.0)
    }

    /// The assembled square: two large triangles, medium triangle, square,
    /// parallelogram and the two small triangles, pulled apart by `spacing`.
    pub fn layout(&self) -> [PieceDescriptor; 7] {
        let a = self.base_length;
        let a2 = a + a * self.spacing;
        // Pieces are dropped from twice their thickness; the first small
        // triangle rests on the ground with its margin-inflated thickness.
        let drop_y = self.height;
        let rest_y = (self.height + 2.0 * self.margin) * 0.5;

        let piece = |kind, mass_multiplier, x, y, z, yaw| PieceDescriptor {
            kind,
            mass_multiplier,
            position: Vector::new(x, y, z),
            yaw,
        };

        [
            piece(
                PieceKind::SmallTriangle,
                1.0,
                -a2 * SQRT_2 / 3.0,
                rest_y,
                0.0,
                FRAC_PI_2,
            ),
            piece(
                PieceKind::SmallTriangle,
                1.0,
                a2 / SQRT_2,
                drop_y,
                a2 * (SQRT_2 / 2.0 + SQRT_2 / 3.0),
                -PI,
            ),
            piece(
                PieceKind::MediumTriangle,
                2.0,
                -a2 * 2.0 * SQRT_2 / 3.0,
                drop_y,
                a2 * 2.0 * SQRT_2 / 3.0,
                -FRAC_PI_4,
            ),
            piece(
                PieceKind::LargeTriangle,
                4.0,
                0.0,
                drop_y,
                -a2 * 2.0 * SQRT_2 / 3.0,
                0.0,
            ),
            piece(
                PieceKind::LargeTriangle,
                4.0,
                a2 * 2.0 * SQRT_2 / 3.0,
                drop_y,
                0.0,
                -FRAC_PI_2,
            ),
            // Kept at 4m like the historical parameter set, although the
            // square's area would suggest 2m.
            piece(PieceKind::Square, 4.0, 0.0, drop_y, a2 / SQRT_2, -FRAC_PI_4),
            piece(
                PieceKind::Parallelogram,
                2.0,
                -3.0 * a2 * SQRT_2 / 4.0,
                drop_y,
                -a2 * SQRT_2 / 4.0,
                -FRAC_PI_2,
            ),
        ]
    }
}

/// A tangram piece that made it into the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Piece {
    pub descriptor: PieceDescriptor,
    pub body: BodyId,
    pub mass: f32,
    /// Resolved diagonal inertia (also reported for the exact model).
    pub inertia: na::Vector3<f32>,
}

/// Everything the frame loop drives. Owns the world exclusively.
pub struct Scene {
    config: SimConfig,
    dimensions: SceneDimensions,
    catalog: ShapeCatalog,
    world: PhysicsWorld,
    pusher: BodyId,
    pieces: Vec<Piece>,
    actuator: KinematicActuator,
}

impl Scene {
    pub fn assemble(config: &SimConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let units: UnitScale = config.units();
        let dimensions = SceneDimensions::from_config(config);
        info!(
            "assembling scene: S={} a={} h={} m={} margin={}",
            units.factor(),
            dimensions.base_length,
            dimensions.height,
            dimensions.base_mass,
            dimensions.margin
        );

        let mut world = PhysicsWorld::new(&config.solver, units);
        world.add_ground(config.materials.ground);

        let catalog = ShapeCatalog::build(PieceDimensions {
            base_length: dimensions.base_length,
            height: dimensions.height,
            margin: dimensions.margin,
        })?;

        let factory = RigidBodyFactory::new(config.damping);
        let pusher = factory.create_kinematic_body(
            &mut world,
            yaw_transform(dimensions.pusher_position(), 0.0),
            &catalog.pusher,
            config.materials.pusher,
        );
        info!("pusher placed at {:?}", dimensions.pusher_position().as_slice());

        let resolver = InertiaTensorResolver::new(config.inertia_model());
        let pieces = dimensions
            .layout()
            .into_iter()
            .map(|descriptor| {
                let template = catalog.get(descriptor.kind);
                let mass = dimensions.base_mass * descriptor.mass_multiplier;
                let inertia = resolver.resolve(template, mass);
                debug!(
                    "{}: mass={} inertia=({} | {} | {}) model={:?}",
                    descriptor.kind,
                    mass,
                    inertia.x,
                    inertia.y,
                    inertia.z,
                    resolver.model()
                );
                let body = factory.create_dynamic_body(
                    &mut world,
                    descriptor.placement(),
                    template,
                    mass,
                    config.materials.polygon,
                    resolver.for_factory(template, mass),
                );
                Piece {
                    descriptor,
                    body,
                    mass,
                    inertia,
                }
            })
            .collect::<Vec<_>>();
        info!("scene ready: {} pieces, 1 pusher", pieces.len());

        let actuator = KinematicActuator::new(pusher, &config.actuator, units);

        Ok(Self {
            config: config.clone(),
            dimensions,
            catalog,
            world,
            pusher,
            pieces,
            actuator,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn dimensions(&self) -> &SceneDimensions {
        &self.dimensions
    }

    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn pusher(&self) -> BodyId {
        self.pusher
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn actuator(&self) -> &KinematicActuator {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut KinematicActuator {
        &mut self.actuator
    }

    /// One frame of simulation: pusher tick, then stepping.
    pub fn advance<O: TickObserver>(&mut self, elapsed: f32, observer: &mut O) -> StepReport {
        self.actuator.tick(&mut self.world, elapsed);
        self.world.step_simulation(elapsed, observer)
    }
}
