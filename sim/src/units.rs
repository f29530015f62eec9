/*!
Real-world to simulation unit conversion.

The whole scene is built at `S` times its real size so the solver works on
pieces of a comfortable magnitude (a 10 cm tangram edge becomes 0.5 units at
`S = 5`). Every construction site must push its inputs through the same
[`UnitScale`]; scaling a length while forgetting the mass that depends on it
gives non-physical dynamics that look like solver bugs.

Rules applied by [`UnitScale::convert`]:

| dimension          | factor |
|--------------------|--------|
| length, position   | `S`    |
| linear velocity    | `S`    |
| impulse            | `S`    |
| mass               | `S³`   |
| inertia (m·l²)     | `S⁵`   |
| torque             | `S²`   |
| angular velocity   | 1      |
| damping ratio      | 1      |
| acceleration       | 1      |

Acceleration (gravity) is intentionally left unscaled. Scaling it by `S`
is the textbook rule but makes the stacked pieces noticeably less stable.
*/

use nalgebra as na;

/// Physical dimension of a quantity handed to [`UnitScale::convert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Mass,
    Velocity,
    Impulse,
    Torque,
    Inertia,
    AngularVelocity,
    DampingRatio,
    Acceleration,
}

/// A single global scale factor `S` and the conversions derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitScale {
    factor: f32,
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_SCALE)
    }
}

impl UnitScale {
    /// `factor` must be positive; the configuration layer rejects anything else.
    #[inline]
    pub const fn new(factor: f32) -> Self {
        Self { factor }
    }

    #[inline]
    pub const fn factor(&self) -> f32 {
        self.factor
    }

    /// Multiplier applied to a quantity of the given dimension.
    #[inline]
    pub fn multiplier(&self, dimension: Dimension) -> f32 {
        let s = self.factor;
        match dimension {
            Dimension::Length | Dimension::Velocity | Dimension::Impulse => s,
            Dimension::Mass => s * s * s,
            Dimension::Inertia => s.powi(5),
            Dimension::Torque => s * s,
            Dimension::AngularVelocity | Dimension::DampingRatio | Dimension::Acceleration => 1.0,
        }
    }

    /// Convert a real-world (SI) value to simulation units.
    #[inline]
    pub fn convert(&self, value: f32, dimension: Dimension) -> f32 {
        value * self.multiplier(dimension)
    }

    #[inline]
    pub fn length(&self, meters: f32) -> f32 {
        self.convert(meters, Dimension::Length)
    }

    #[inline]
    pub fn mass(&self, kilograms: f32) -> f32 {
        self.convert(kilograms, Dimension::Mass)
    }

    #[inline]
    pub fn velocity(&self, meters_per_second: f32) -> f32 {
        self.convert(meters_per_second, Dimension::Velocity)
    }

    #[inline]
    pub fn impulse(&self, newton_seconds: f32) -> f32 {
        self.convert(newton_seconds, Dimension::Impulse)
    }

    #[inline]
    pub fn torque(&self, newton_meters: f32) -> f32 {
        self.convert(newton_meters, Dimension::Torque)
    }

    /// Scale a directly supplied diagonal inertia. Inertia that is recomputed
    /// from already-scaled extents and mass must not go through this again.
    #[inline]
    pub fn inertia(&self, inertia: na::Vector3<f32>) -> na::Vector3<f32> {
        inertia * self.multiplier(Dimension::Inertia)
    }

    /// Scale a position or extent vector.
    #[inline]
    pub fn length_vec(&self, meters: na::Vector3<f32>) -> na::Vector3<f32> {
        meters * self.factor
    }
}
