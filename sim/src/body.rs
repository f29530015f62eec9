//! Rigid-body construction and the externally tracked motion state.
//!
//! Bodies are created through [`RigidBodyFactory`], which applies the scene's
//! damping, never lets anything sleep, and registers the body with the world
//! together with a [`MotionState`].

use nalgebra as na;
use rapier3d::prelude::*;

use crate::config::{Damping, Material};
use crate::inertia::exact_mass_properties;
use crate::shapes::ShapeTemplate;
use crate::world::{BodyId, PhysicsWorld};

/// How the engine moves a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Integrated by the solver.
    Dynamic,
    /// Follows its committed transform, pushes dynamic bodies, is never pushed.
    Kinematic,
}

/// Transform and velocities tracked outside the engine.
///
/// - `committed` is the authoritative placement. The actuator writes it for
///   kinematic bodies; the world writes it for dynamic bodies after a step.
/// - `interpolated` is where the body is drawn between fixed steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    pub committed: Isometry<f32>,
    pub interpolated: Isometry<f32>,
    pub interpolated_linvel: Vector<f32>,
    pub interpolated_angvel: Vector<f32>,
}

impl MotionState {
    pub fn at(transform: Isometry<f32>) -> Self {
        Self {
            committed: transform,
            interpolated: transform,
            interpolated_linvel: Vector::zeros(),
            interpolated_angvel: Vector::zeros(),
        }
    }

    pub fn translation(&self) -> Vector<f32> {
        self.committed.translation.vector
    }
}

/// Placement helper: translation plus rotation about +Y.
pub fn yaw_transform(translation: Vector<f32>, yaw: f32) -> Isometry<f32> {
    Isometry::from_parts(
        na::Translation3::from(translation),
        na::UnitQuaternion::from_axis_angle(&Vector::y_axis(), yaw),
    )
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RigidBodyFactory {
    damping: Damping,
}

impl RigidBodyFactory {
    pub fn new(damping: Damping) -> Self {
        Self { damping }
    }

    /// Create a dynamic body and register it with `world`.
    ///
    /// `inertia` is a principal diagonal about the shape origin. `None` uses
    /// the exact mass properties of the shape. Mass is not validated.
    pub fn create_dynamic_body(
        &self,
        world: &mut PhysicsWorld,
        transform: Isometry<f32>,
        template: &ShapeTemplate,
        mass: f32,
        material: Material,
        inertia: Option<na::Vector3<f32>>,
    ) -> BodyId {
        let mass_properties = match inertia {
            Some(inertia) => MassProperties::new(Point::origin(), mass, inertia),
            None => exact_mass_properties(template.shape(), mass),
        };

        let body = RigidBodyBuilder::dynamic()
            .pose(transform)
            .linear_damping(self.damping.linear)
            .angular_damping(self.damping.angular)
            .additional_mass_properties(mass_properties)
            .can_sleep(false)
            .build();

        world.insert_tracked(body, collider(template, material), BodyKind::Dynamic)
    }

    /// Create a position-based kinematic body and register it with `world`.
    pub fn create_kinematic_body(
        &self,
        world: &mut PhysicsWorld,
        transform: Isometry<f32>,
        template: &ShapeTemplate,
        material: Material,
    ) -> BodyId {
        let body = RigidBodyBuilder::kinematic_position_based()
            .pose(transform)
            .can_sleep(false)
            .build();

        world.insert_tracked(body, collider(template, material), BodyKind::Kinematic)
    }
}

/// Collider sharing the template's shape. Mass comes from the body, not from
/// collider density.
fn collider(template: &ShapeTemplate, material: Material) -> Collider {
    ColliderBuilder::new(template.shape().clone())
        .density(0.0)
        .friction(material.friction)
        .restitution(material.restitution)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::units::UnitScale;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn world() -> PhysicsWorld {
        let solver = SolverConfig {
            gravity: [0.0; 3],
            ..SolverConfig::default()
        };
        PhysicsWorld::new(&solver, UnitScale::new(1.0))
    }

    // One fixed step so the engine folds in mass properties.
    fn settle(world: &mut PhysicsWorld) {
        let dt = world.scheduler().fixed_step();
        world.step_simulation(dt, &mut ());
    }

    fn cube() -> ShapeTemplate {
        ShapeTemplate::new(SharedShape::cuboid(0.5, 0.5, 0.5), 0.0)
    }

    #[test]
    fn dynamic_body_carries_mass_inertia_and_damping() {
        let mut world = world();
        let factory = RigidBodyFactory::new(Damping {
            linear: 0.3,
            angular: 0.4,
        });
        let inertia = na::Vector3::new(1.0, 2.0, 3.0);
        let id = factory.create_dynamic_body(
            &mut world,
            yaw_transform(Vector::new(1.0, 2.0, 3.0), 0.0),
            &cube(),
            6.0,
            Material::new(0.7, 0.2),
            Some(inertia),
        );
        settle(&mut world);

        let body = world.body(id).unwrap();
        assert!(body.is_dynamic());
        assert_relative_eq!(body.mass(), 6.0, epsilon = 1.0e-5);
        assert_relative_eq!(body.linear_damping(), 0.3);
        assert_relative_eq!(body.angular_damping(), 0.4);
        assert_relative_eq!(*body.translation(), Vector::new(1.0, 2.0, 3.0));
        // The engine may reorder principal axes; compare the sorted moments.
        let principal = body.mass_properties().local_mprops.principal_inertia();
        let mut moments = [principal.x, principal.y, principal.z];
        moments.sort_by(f32::total_cmp);
        assert_relative_eq!(moments[0], inertia.x, epsilon = 1.0e-4);
        assert_relative_eq!(moments[1], inertia.y, epsilon = 1.0e-4);
        assert_relative_eq!(moments[2], inertia.z, epsilon = 1.0e-4);

        let collider = world.collider(id).unwrap();
        assert_relative_eq!(collider.friction(), 0.7);
        assert_relative_eq!(collider.restitution(), 0.2);
        assert_eq!(world.kind(id), Some(BodyKind::Dynamic));
    }

    #[test]
    fn omitted_inertia_uses_exact_shape_inertia() {
        let mut world = world();
        let factory = RigidBodyFactory::default();
        let id = factory.create_dynamic_body(
            &mut world,
            Isometry::identity(),
            &cube(),
            6.0,
            Material::new(0.5, 0.0),
            None,
        );
        settle(&mut world);
        // Solid unit cube: m/6 on every axis.
        let body = world.body(id).unwrap();
        assert_relative_eq!(
            body.mass_properties().local_mprops.principal_inertia(),
            na::Vector3::new(1.0, 1.0, 1.0),
            epsilon = 1.0e-4
        );
    }

    #[test]
    fn kinematic_body_has_no_mass_and_never_sleeps() {
        let mut world = world();
        let factory = RigidBodyFactory::default();
        let id = factory.create_kinematic_body(
            &mut world,
            yaw_transform(Vector::new(0.0, 0.5, 0.0), 0.0),
            &cube(),
            Material::new(0.3, 0.0),
        );

        let body = world.body(id).unwrap();
        assert!(body.is_kinematic());
        assert!(!body.is_sleeping());
        assert_eq!(world.kind(id), Some(BodyKind::Kinematic));
        assert_eq!(
            world.motion_state(id).unwrap().committed,
            yaw_transform(Vector::new(0.0, 0.5, 0.0), 0.0)
        );
    }

    #[test]
    fn bodies_share_one_collision_shape() {
        let mut world = world();
        let factory = RigidBodyFactory::default();
        let template = cube();
        let a = factory.create_dynamic_body(
            &mut world,
            Isometry::identity(),
            &template,
            1.0,
            Material::new(0.5, 0.0),
            None,
        );
        let b = factory.create_dynamic_body(
            &mut world,
            yaw_transform(Vector::new(3.0, 0.0, 0.0), 0.0),
            &template,
            1.0,
            Material::new(0.5, 0.0),
            None,
        );
        let shape_a = world.collider(a).unwrap().shared_shape().clone();
        let shape_b = world.collider(b).unwrap().shared_shape().clone();
        assert!(Arc::ptr_eq(&shape_a.0, &shape_b.0));
    }

    #[test]
    fn zero_mass_is_accepted() {
        let mut world = world();
        let id = RigidBodyFactory::default().create_dynamic_body(
            &mut world,
            Isometry::identity(),
            &cube(),
            0.0,
            Material::new(0.5, 0.0),
            Some(na::Vector3::zeros()),
        );
        assert!(world.body(id).is_some());
    }

    #[test]
    fn yaw_transform_rotates_about_vertical_axis() {
        let iso = yaw_transform(Vector::zeros(), std::f32::consts::FRAC_PI_2);
        let rotated = iso.rotation * Vector::x();
        assert_relative_eq!(rotated, Vector::new(0.0, 0.0, -1.0), epsilon = 1.0e-6);
    }
}
