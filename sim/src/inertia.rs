//! Inertia tensor resolution.
//!
//! Two models are available and selected explicitly by the caller:
//! - [`InertiaModel::BoxApproximation`]: a solid box around the margin-inflated
//!   local bounds of the shape. Cheap and stable for thin prisms.
//! - [`InertiaModel::EngineExact`]: rapier's mass properties of the convex
//!   shape, rescaled to the requested mass.
//!
//! All tensors are diagonal (principal axes) and linear in mass.

use nalgebra as na;
use rapier3d::prelude::*;

use crate::shapes::ShapeTemplate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InertiaModel {
    #[default]
    BoxApproximation,
    EngineExact,
}

impl InertiaModel {
    /// Map the historical `use_custom_inertia` switch.
    pub fn from_custom_flag(use_custom_inertia: bool) -> Self {
        if use_custom_inertia {
            Self::EngineExact
        } else {
            Self::BoxApproximation
        }
    }
}

/// Box inertia `(m/12)·(ly²+lz², lx²+lz², lx²+ly²)` for full extents
/// `2·(half_extents + margin)`.
pub fn box_inertia(half_extents: na::Vector3<f32>, margin: f32, mass: f32) -> na::Vector3<f32> {
    let l = (half_extents.add_scalar(margin)) * 2.0;
    let (lx2, ly2, lz2) = (l.x * l.x, l.y * l.y, l.z * l.z);
    na::Vector3::new(ly2 + lz2, lx2 + lz2, lx2 + ly2) * (mass / 12.0)
}

/// Exact mass properties of `shape` carrying `mass`, principal frame included.
pub fn exact_mass_properties(shape: &SharedShape, mass: f32) -> MassProperties {
    let unit = shape.mass_properties(1.0);
    let unit_mass = unit.mass();
    if mass <= 0.0 || unit_mass <= 0.0 {
        return MassProperties::new(unit.local_com, 0.0, na::Vector3::zeros());
    }
    MassProperties::with_principal_inertia_frame(
        unit.local_com,
        mass,
        unit.principal_inertia() * (mass / unit_mass),
        unit.principal_inertia_local_frame,
    )
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InertiaTensorResolver {
    model: InertiaModel,
}

impl InertiaTensorResolver {
    pub fn new(model: InertiaModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> InertiaModel {
        self.model
    }

    /// Diagonal inertia of `template` carrying `mass`. Never negative.
    pub fn resolve(&self, template: &ShapeTemplate, mass: f32) -> na::Vector3<f32> {
        if mass <= 0.0 {
            return na::Vector3::zeros();
        }
        let inertia = match self.model {
            InertiaModel::BoxApproximation => {
                box_inertia(template.half_extents(), template.margin(), mass)
            }
            InertiaModel::EngineExact => {
                exact_mass_properties(template.shape(), mass).principal_inertia()
            }
        };
        inertia.map(|c| c.max(0.0))
    }

    /// Inertia handed to the body factory. `None` lets the factory use the
    /// exact mass properties with their principal frame.
    pub fn for_factory(&self, template: &ShapeTemplate, mass: f32) -> Option<na::Vector3<f32>> {
        match self.model {
            InertiaModel::BoxApproximation => Some(self.resolve(template, mass)),
            InertiaModel::EngineExact => None,
        }
    }
}
